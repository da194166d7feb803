//! Resilient parallel execution substrate.
//!
//! Every pipeline stage fans out over unreliable external calls through the
//! same three pieces: a retry executor with per-service concurrency limits
//! ([`call_with_retry`]), a replace-on-completion worker pool ([`run_all`]),
//! and a typed partial-failure fold ([`StageResult::fold`]).

mod aggregate;
mod limiter;
mod outcome;
mod pool;
mod retry;

pub use aggregate::Folded;
pub use limiter::{LimiterConfig, LimiterRegistry, ServiceClass};
pub use outcome::{work_items, work_items_with_cost, Outcome, OutcomeError, StageResult, WorkItem};
pub use pool::{run_all, PoolConfig};
pub use retry::{call_with_retry, RetryPolicy};
