//! Replace-on-completion worker pool.
//!
//! Exactly `effective_workers` items are in flight at any time: the first
//! batch is submitted up front, then one queued item is submitted per
//! completion. This bounds peak memory and connections regardless of total
//! item count while keeping workers continuously busy, unlike
//! submit-all-then-wait-all which front-loads resource pressure.

use super::outcome::{Outcome, OutcomeError, StageResult, WorkItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinSet;

/// Pool sizing configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Logical worker budget before load-based reduction.
    pub worker_budget: usize,
    /// Item cost above which an item counts as heavy.
    pub heavy_cost: usize,
    /// Item count above which the pool sheds one worker.
    pub backlog_threshold: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_budget: 3,
            heavy_cost: 10_000,
            backlog_threshold: 5,
        }
    }
}

impl PoolConfig {
    /// Creates a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker budget (minimum 1).
    #[must_use]
    pub fn with_worker_budget(mut self, budget: usize) -> Self {
        self.worker_budget = budget.max(1);
        self
    }

    /// Sets the heavy-item cost threshold.
    #[must_use]
    pub const fn with_heavy_cost(mut self, cost: usize) -> Self {
        self.heavy_cost = cost;
        self
    }

    /// Computes the worker count for an item list.
    ///
    /// `min(budget, items)`, shed by one (floor 1) when the backlog is long
    /// or any single item is heavy.
    #[must_use]
    pub fn effective_workers<T>(&self, items: &[WorkItem<T>]) -> usize {
        let mut workers = self.worker_budget.max(1).min(items.len().max(1));
        let heavy = items.iter().any(|item| item.cost > self.heavy_cost);
        if items.len() > self.backlog_threshold || heavy {
            workers = workers.saturating_sub(1).max(1);
        }
        workers
    }
}

/// Runs every item through `worker` with replace-on-completion scheduling.
///
/// Workers are expected to absorb their own failures and return an error
/// value rather than panic; a panicking worker is still captured as a failed
/// [`Outcome`] and never crosses into the scheduler. The returned
/// [`StageResult`] always holds one outcome per input item, in input order.
pub async fn run_all<T, R, F, Fut>(
    config: &PoolConfig,
    items: Vec<WorkItem<T>>,
    worker: F,
) -> StageResult<R>
where
    R: Send + 'static,
    F: Fn(WorkItem<T>) -> Fut,
    Fut: Future<Output = Result<R, OutcomeError>> + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        return StageResult::empty();
    }

    let workers = config.effective_workers(&items);
    tracing::debug!(total, workers, "starting worker pool");

    let mut queue = items.into_iter();
    let mut in_flight: JoinSet<Result<R, OutcomeError>> = JoinSet::new();
    let mut index_of_task: HashMap<tokio::task::Id, usize> = HashMap::new();
    let mut outcomes: Vec<Outcome<R>> = Vec::with_capacity(total);

    for item in queue.by_ref().take(workers) {
        let index = item.index;
        let handle = in_flight.spawn(worker(item));
        index_of_task.insert(handle.id(), index);
    }

    while let Some(joined) = in_flight.join_next_with_id().await {
        let (task_id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(join_err) => {
                let id = join_err.id();
                (id, Err(OutcomeError::new(format!("worker task failed: {join_err}"))))
            }
        };

        let Some(index) = index_of_task.remove(&task_id) else {
            tracing::error!(?task_id, "completion for unknown worker task");
            continue;
        };
        if let Err(ref err) = result {
            tracing::warn!(index, error = %err, "work item failed");
        }
        outcomes.push(Outcome::new(index, result));

        // Keep the in-flight count at the worker ceiling.
        if let Some(item) = queue.next() {
            let index = item.index;
            let handle = in_flight.spawn(worker(item));
            index_of_task.insert(handle.id(), index);
        }
    }

    StageResult::from_outcomes(outcomes)
}
