//! Provides [`Join`], the merge-join coordinator (spec §4.4) — the
//! algorithmic heart of the evaluator. Drives one [`JoinCursor`] per
//! predicate in lockstep and emits the ordered, deduplicated primary-key
//! sequence that satisfies the query's join mode.

use crate::cursor::JoinCursor;
use crate::error::QueryError;
use crate::key::Key;
use crate::predicate::{Controls, JoinMode};
use crate::util::check_cancelled;

use tokio_util::sync::CancellationToken;

/// What one coordinator step produced.
enum StepOutcome {
    /// A primary key was matched this step (it may still be filtered out by
    /// `$from`, or trigger early termination via `$to`/`$limit`).
    Matched(Key),
    /// Lowest cursor advanced with nothing to emit yet (the `and` no-match
    /// branch).
    NoMatch,
    /// Every cursor is exhausted (or the `and` intersection is provably
    /// empty).
    Done,
}

pub struct Join {
    cursors: Vec<JoinCursor>,
    mode: JoinMode,
    controls: Controls,
}

impl Join {
    pub fn new(cursors: Vec<JoinCursor>, controls: Controls) -> Self {
        let mode = controls.join;
        Self {
            cursors,
            mode,
            controls,
        }
    }

    /// Drives the coordinator to completion (exhaustion, or early stop from
    /// `$to`/`$limit`) and returns the materialized primary-key sequence.
    pub async fn run(mut self, cancel: &CancellationToken) -> Result<Vec<Key>, QueryError> {
        if self.cursors.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = Vec::new();
        let mut count: u64 = 0;
        let mut previous: Option<Key> = None;

        loop {
            check_cancelled(cancel)?;

            match self.step(cancel).await? {
                StepOutcome::Done => break,
                StepOutcome::NoMatch => continue,
                StepOutcome::Matched(key) => {
                    if previous.as_ref() == Some(&key) {
                        continue;
                    }

                    // `$limit=0` has to terminate before ever appending:
                    // the post-append check below only fires once the
                    // result has *reached* the limit, which for a limit of
                    // zero would let exactly one match slip through first.
                    if self.controls.limit == Some(0) {
                        break;
                    }

                    count += 1;

                    let past_offset = match self.controls.from {
                        Some(from) => count > from,
                        None => true,
                    };
                    if past_offset {
                        result.push(key.clone());
                    }

                    previous = Some(key);

                    if let Some(to) = self.controls.to {
                        if count > to {
                            break;
                        }
                    }
                    if let Some(limit) = self.controls.limit {
                        if result.len() as u64 == limit {
                            break;
                        }
                    }
                }
            }
        }

        Ok(result)
    }

    /// One iteration of the single-step protocol (spec §4.4 step 1-2):
    /// computes the candidate match (if any) and advances the cursor(s)
    /// that must move before the next step.
    async fn step(&mut self, cancel: &CancellationToken) -> Result<StepOutcome, QueryError> {
        let live: Vec<usize> = (0..self.cursors.len())
            .filter(|&i| !self.cursors[i].is_done())
            .collect();

        match self.mode {
            JoinMode::Or => {
                if live.is_empty() {
                    return Ok(StepOutcome::Done);
                }

                let lowest = live
                    .iter()
                    .copied()
                    .min_by(|&a, &b| self.cursors[a].primary_key().cmp(&self.cursors[b].primary_key()))
                    .expect("live is non-empty");
                let matched = self.cursors[lowest].primary_key().cloned().expect("live cursor has a key");

                for &i in &live {
                    if self.cursors[i].primary_key() == Some(&matched) {
                        self.cursors[i].advance(cancel).await?;
                    }
                }

                Ok(StepOutcome::Matched(matched))
            }
            JoinMode::And => {
                if live.len() < self.cursors.len() {
                    // Some cursor is already exhausted: the intersection is
                    // provably empty from here on.
                    return Ok(StepOutcome::Done);
                }

                let first_key = self.cursors[live[0]].primary_key().cloned().expect("live cursor has a key");
                let all_match = live
                    .iter()
                    .all(|&i| self.cursors[i].primary_key() == Some(&first_key));

                if all_match {
                    for &i in &live {
                        self.cursors[i].advance(cancel).await?;
                    }
                    Ok(StepOutcome::Matched(first_key))
                } else {
                    let lowest = live
                        .iter()
                        .copied()
                        .min_by(|&a, &b| self.cursors[a].primary_key().cmp(&self.cursors[b].primary_key()))
                        .expect("live is non-empty");
                    self.cursors[lowest].advance(cancel).await?;
                    Ok(StepOutcome::NoMatch)
                }
            }
        }
    }
}
