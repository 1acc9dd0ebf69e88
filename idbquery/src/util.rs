//! Small shared helpers.

use crate::error::QueryError;
use tokio_util::sync::CancellationToken;

/// Checks a suspension point's cancellation token, per spec §5: "at each
/// suspension point, if cancellation is signaled, cursors are released and
/// the query fails with a cancellation error".
pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<(), QueryError> {
    if cancel.is_cancelled() {
        Err(QueryError::Cancelled)
    } else {
        Ok(())
    }
}
