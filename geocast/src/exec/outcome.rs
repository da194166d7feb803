//! Work items and per-item outcomes.
//!
//! Identity is the original index: completion order across workers is
//! unspecified, so the stage result restores input ordering with an explicit
//! sort rather than relying on append order.

use crate::errors::{ProviderError, RetryError};
use thiserror::Error;

/// A unit of fan-out work.
///
/// The payload is opaque to the execution substrate. `cost` is the caller's
/// size estimate (e.g. text length) used for heavy-item worker reduction;
/// zero means unknown.
#[derive(Debug, Clone)]
pub struct WorkItem<T> {
    /// Original position in the stage input; stable across reordering.
    pub index: usize,
    /// The caller's payload.
    pub payload: T,
    /// Estimated cost of processing this item.
    pub cost: usize,
}

impl<T> WorkItem<T> {
    /// Creates a work item with unknown cost.
    #[must_use]
    pub const fn new(index: usize, payload: T) -> Self {
        Self {
            index,
            payload,
            cost: 0,
        }
    }

    /// Sets the estimated cost.
    #[must_use]
    pub const fn with_cost(mut self, cost: usize) -> Self {
        self.cost = cost;
        self
    }
}

/// Wraps an ordered payload list into work items indexed by position.
#[must_use]
pub fn work_items<T>(payloads: Vec<T>) -> Vec<WorkItem<T>> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| WorkItem::new(index, payload))
        .collect()
}

/// Like [`work_items`], with a per-payload cost estimate.
#[must_use]
pub fn work_items_with_cost<T>(
    payloads: Vec<T>,
    cost: impl Fn(&T) -> usize,
) -> Vec<WorkItem<T>> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| {
            let estimated = cost(&payload);
            WorkItem::new(index, payload).with_cost(estimated)
        })
        .collect()
}

/// Error captured from a failed work item.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OutcomeError {
    message: String,
}

impl OutcomeError {
    /// Creates an outcome error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<RetryError> for OutcomeError {
    fn from(err: RetryError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<ProviderError> for OutcomeError {
    fn from(err: ProviderError) -> Self {
        Self::new(err.to_string())
    }
}

/// The result of one work item, immutable once created.
#[derive(Debug, Clone)]
pub struct Outcome<R> {
    /// Original input index of the item.
    pub index: usize,
    /// The item's value or captured error.
    pub result: Result<R, OutcomeError>,
}

impl<R> Outcome<R> {
    /// Creates an outcome.
    #[must_use]
    pub const fn new(index: usize, result: Result<R, OutcomeError>) -> Self {
        Self { index, result }
    }

    /// Creates a successful outcome.
    #[must_use]
    pub const fn success(index: usize, value: R) -> Self {
        Self {
            index,
            result: Ok(value),
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub const fn failure(index: usize, error: OutcomeError) -> Self {
        Self {
            index,
            result: Err(error),
        }
    }

    /// Returns true if the item succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the error, if the item failed.
    #[must_use]
    pub fn error(&self) -> Option<&OutcomeError> {
        self.result.as_ref().err()
    }
}

/// Ordered per-item outcomes for one stage.
///
/// Invariant: `outcomes().len()` equals the stage's input item count, and
/// outcomes are sorted by original index.
#[derive(Debug)]
pub struct StageResult<R> {
    outcomes: Vec<Outcome<R>>,
}

impl<R> StageResult<R> {
    /// Builds a stage result, restoring input order by index.
    #[must_use]
    pub fn from_outcomes(mut outcomes: Vec<Outcome<R>>) -> Self {
        outcomes.sort_by_key(|outcome| outcome.index);
        Self { outcomes }
    }

    /// A result with no items.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    /// Returns the ordered outcomes.
    #[must_use]
    pub fn outcomes(&self) -> &[Outcome<R>] {
        &self.outcomes
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if the stage had no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns how many items succeeded.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Returns how many items failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Consumes the result, yielding successful values in index order.
    #[must_use]
    pub fn into_values(self) -> Vec<R> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| outcome.result.ok())
            .collect()
    }

    pub(crate) fn into_outcomes(self) -> Vec<Outcome<R>> {
        self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_work_items_index_by_position() {
        let items = work_items(vec!["a", "b", "c"]);
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].payload, "b");
        assert_eq!(items[1].cost, 0);
    }

    #[test]
    fn test_work_items_with_cost() {
        let items = work_items_with_cost(vec!["hi", "world"], |s| s.len());
        assert_eq!(items[0].cost, 2);
        assert_eq!(items[1].cost, 5);
    }

    #[test]
    fn test_stage_result_restores_index_order() {
        let outcomes = vec![
            Outcome::success(2, "c"),
            Outcome::success(0, "a"),
            Outcome::failure(1, OutcomeError::new("boom")),
        ];
        let result = StageResult::from_outcomes(outcomes);

        let indices: Vec<usize> = result.outcomes().iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
    }

    #[test]
    fn test_into_values_skips_failures() {
        let result = StageResult::from_outcomes(vec![
            Outcome::success(1, "b"),
            Outcome::failure(0, OutcomeError::new("nope")),
            Outcome::success(2, "c"),
        ]);
        assert_eq!(result.into_values(), vec!["b", "c"]);
    }
}
