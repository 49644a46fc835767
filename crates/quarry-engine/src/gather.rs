//! Concurrent fetch orchestrator.
//!
//! Runs independent fetch tasks on their own OS threads, each against its
//! own connection, and fans their outcomes back in positionally aligned to
//! the inputs. One task's failure never cancels or blocks the others; the
//! orchestrator waits for every started task to reach a terminal state.

use std::thread;

use quarry_core::errors::AccessError;
use quarry_core::types::Row;

use crate::cancellation::FetchCancellation;

/// One independent fetch. Receives the gather's cancellation token for
/// cooperative checks at its own suspension points.
pub type FetchTask<'a> =
    Box<dyn FnOnce(&FetchCancellation) -> Result<Vec<Row>, AccessError> + Send + 'a>;

/// Terminal state of one fetch task.
#[derive(Debug)]
pub enum Outcome {
    Success(Vec<Row>),
    Failure(AccessError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Outcome::Success(rows) => Some(rows),
            Outcome::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Vec<Row>, AccessError> {
        match self {
            Outcome::Success(rows) => Ok(rows),
            Outcome::Failure(e) => Err(e),
        }
    }
}

/// Run every task concurrently and return all outcomes in input order.
pub fn gather(tasks: Vec<FetchTask<'_>>, cancel: &FetchCancellation) -> Vec<Outcome> {
    let in_flight = tasks.len().max(1);
    gather_bounded(tasks, cancel, in_flight)
}

/// Like [`gather`], but with at most `max_in_flight` tasks running at once.
/// Tasks queued behind the bound have not started; cancelling the token
/// keeps them from ever starting.
pub fn gather_bounded(
    tasks: Vec<FetchTask<'_>>,
    cancel: &FetchCancellation,
    max_in_flight: usize,
) -> Vec<Outcome> {
    let total = tasks.len();
    let max_in_flight = max_in_flight.max(1);
    let mut slots: Vec<Option<Outcome>> = (0..total).map(|_| None).collect();
    let mut pending = tasks.into_iter().enumerate();

    loop {
        let wave: Vec<(usize, FetchTask<'_>)> =
            pending.by_ref().take(max_in_flight).collect();
        if wave.is_empty() {
            break;
        }

        let (tx, rx) = crossbeam_channel::bounded::<(usize, Outcome)>(wave.len());
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(wave.len());
            for (idx, task) in wave {
                if cancel.is_cancelled() {
                    slots[idx] = Some(Outcome::Failure(AccessError::Cancelled));
                    continue;
                }
                let tx = tx.clone();
                let handle = thread::Builder::new()
                    .name(format!("quarry-fetch-{idx}"))
                    .spawn_scoped(scope, move || {
                        let outcome = match task(cancel) {
                            Ok(rows) => Outcome::Success(rows),
                            Err(e) => Outcome::Failure(e),
                        };
                        let _ = tx.send((idx, outcome));
                    })
                    .expect("failed to spawn fetch thread");
                handles.push((idx, handle));
            }
            drop(tx);

            for (idx, outcome) in rx.iter() {
                slots[idx] = Some(outcome);
            }
            // A panicking task sends nothing; surface it as a failure
            // instead of letting the scope re-raise.
            for (idx, handle) in handles {
                if handle.join().is_err() {
                    tracing::warn!(task = idx, "fetch task panicked");
                    slots[idx].get_or_insert(Outcome::Failure(AccessError::Execution {
                        message: "fetch task panicked".to_string(),
                    }));
                }
            }
        });
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Outcome::Failure(AccessError::Cancelled)))
        .collect()
}
