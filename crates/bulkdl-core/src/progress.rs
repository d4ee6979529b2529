//! Aggregate progress over a batch of independent operations.
//!
//! Operations are driven together on the current task and reported in the
//! order they finish, not the order they were submitted.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::time::Instant;

/// "K of N complete" snapshot, emitted once per finished operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressStats {
    /// Operations finished so far (successful or not).
    pub completed: usize,
    pub total: usize,
    /// Elapsed time since tracking started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    /// Operations finished per second (0 if elapsed is 0).
    pub fn per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_secs
    }
}

/// Awaits every operation and calls `on_progress` once per completion.
///
/// `completed` increases by one on each call and the last call reports
/// `total` of `total`. There is no early exit: a failed operation is just
/// another completed one. Outputs are returned in completion order.
pub async fn track_all<I, F, P>(operations: I, mut on_progress: P) -> Vec<F::Output>
where
    I: IntoIterator<Item = F>,
    F: Future,
    P: FnMut(ProgressStats),
{
    let mut pending: FuturesUnordered<F> = operations.into_iter().collect();
    let total = pending.len();
    let start = Instant::now();
    let mut outputs = Vec::with_capacity(total);

    while let Some(output) = pending.next().await {
        outputs.push(output);
        on_progress(ProgressStats {
            completed: outputs.len(),
            total,
            elapsed_secs: start.elapsed().as_secs_f64(),
        });
    }
    outputs
}
