//! Folding per-item outcomes into a stage aggregate.
//!
//! Degradation is typed: a stage that fell back to synthetic content returns
//! `Folded::Degraded`, never a plain value that looks like the real thing.

use super::outcome::StageResult;

/// The folded aggregate of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Folded<R> {
    /// Every item succeeded; values in input order.
    Complete(Vec<R>),
    /// Some items failed; successful values in input order.
    Partial {
        /// Successful values.
        values: Vec<R>,
        /// Input indices of the failed items.
        failed_indices: Vec<usize>,
    },
    /// Every item failed; `value` is the fallback artifact.
    Degraded {
        /// The synthetic fallback value.
        value: R,
        /// Why the stage degraded.
        reason: String,
    },
}

impl<R> Folded<R> {
    /// Returns true if the stage fell back to synthetic content.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Returns true if some items were dropped.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }

    /// Returns the degradation reason, if any.
    #[must_use]
    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Self::Degraded { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Consumes the fold, yielding the usable values in order.
    #[must_use]
    pub fn into_values(self) -> Vec<R> {
        match self {
            Self::Complete(values) | Self::Partial { values, .. } => values,
            Self::Degraded { value, .. } => vec![value],
        }
    }
}

impl<R> StageResult<R> {
    /// Folds the stage into a typed aggregate.
    ///
    /// All-failed invokes `fallback` — the only place synthetic content is
    /// produced. Partial success proceeds with the successful values in
    /// input order; the counts are the caller's to log. Never fails;
    /// `fallback` must be pure and local.
    #[must_use]
    pub fn fold(self, fallback: impl FnOnce() -> R) -> Folded<R> {
        let total = self.len();
        let failure_count = self.failure_count();

        if total > 0 && failure_count == total {
            let last_error = self
                .outcomes()
                .iter()
                .rev()
                .find_map(|outcome| outcome.error())
                .map_or_else(String::new, |err| format!(": {err}"));
            return Folded::Degraded {
                value: fallback(),
                reason: format!("all {total} items failed{last_error}"),
            };
        }

        if failure_count == 0 {
            return Folded::Complete(self.into_values());
        }

        let mut values = Vec::with_capacity(total - failure_count);
        let mut failed_indices = Vec::with_capacity(failure_count);
        for outcome in self.into_outcomes() {
            match outcome.result {
                Ok(value) => values.push(value),
                Err(_) => failed_indices.push(outcome.index),
            }
        }
        Folded::Partial {
            values,
            failed_indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::outcome::{Outcome, OutcomeError};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_success_folds_complete() {
        let result = StageResult::from_outcomes(vec![
            Outcome::success(0, "a"),
            Outcome::success(1, "b"),
        ]);
        let folded = result.fold(|| "fallback");
        assert_eq!(folded, Folded::Complete(vec!["a", "b"]));
        assert!(!folded.is_degraded());
    }

    #[test]
    fn test_partial_keeps_order_and_failed_indices() {
        let result = StageResult::from_outcomes(vec![
            Outcome::success(0, "a"),
            Outcome::failure(1, OutcomeError::new("boom")),
            Outcome::success(2, "c"),
        ]);
        assert_eq!(result.success_count(), 2);

        let folded = result.fold(|| "fallback");
        assert_eq!(
            folded,
            Folded::Partial {
                values: vec!["a", "c"],
                failed_indices: vec![1],
            }
        );
    }

    #[test]
    fn test_all_failed_triggers_fallback() {
        let result: StageResult<&str> = StageResult::from_outcomes(vec![
            Outcome::failure(0, OutcomeError::new("down")),
            Outcome::failure(1, OutcomeError::new("still down")),
        ]);

        let folded = result.fold(|| "synthetic");
        assert!(folded.is_degraded());
        assert_eq!(
            folded.degraded_reason(),
            Some("all 2 items failed: still down")
        );
        assert_eq!(folded.into_values(), vec!["synthetic"]);
    }

    #[test]
    fn test_empty_stage_folds_complete() {
        let result: StageResult<&str> = StageResult::empty();
        let folded = result.fold(|| "unused");
        assert_eq!(folded, Folded::Complete(Vec::new()));
    }
}
