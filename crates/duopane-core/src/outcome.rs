//! Batch outcome aggregation.

use std::path::PathBuf;

use crate::error::OperationError;
use crate::request::OperationType;

/// Result of a batch that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct OperationOutcome {
    /// Resolved destinations (or sources, for delete-style batches) of the
    /// items that succeeded.
    pub succeeded: Vec<PathBuf>,
    /// Items that failed, with the classified error.
    pub failed: Vec<(PathBuf, OperationError)>,
    /// Sources left untouched because a conflict was resolved with skip.
    pub skipped: Vec<PathBuf>,
}

impl OperationOutcome {
    /// Create an empty outcome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful item.
    pub fn record_success(&mut self, path: PathBuf) {
        self.succeeded.push(path);
    }

    /// Record a failed item.
    pub fn record_failure(&mut self, path: PathBuf, error: OperationError) {
        self.failed.push((path, error));
    }

    /// Record a skipped item.
    pub fn record_skip(&mut self, path: PathBuf) {
        self.skipped.push(path);
    }

    /// Check if no item failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of items accounted for so far.
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    /// Turn the collected bookkeeping into the batch's final result.
    ///
    /// With no failures the outcome is returned as is. When nothing
    /// succeeded, a single-item batch surfaces its error unwrapped and a
    /// larger batch surfaces it wrapped in [`OperationError::Unknown`]. A mix
    /// of successes and failures becomes [`OperationError::PartialFailure`].
    pub fn finish(self, total_items: usize) -> Result<Self, OperationError> {
        if self.failed.is_empty() {
            return Ok(self);
        }

        if self.succeeded.is_empty() {
            let mut failed = self.failed;
            let (_, first) = failed.swap_remove(0);
            return Err(if total_items == 1 {
                first
            } else {
                OperationError::wrap(first)
            });
        }

        Err(OperationError::PartialFailure {
            succeeded: self.succeeded,
            failed: self.failed,
        })
    }

    /// Get a human-readable summary of the outcome.
    pub fn summary(&self, operation_type: OperationType) -> String {
        let action = operation_type.past_tense();
        let mut summary = match self.succeeded.len() {
            1 => format!("{} 1 item", action),
            n => format!("{} {} items", action, n),
        };
        if !self.skipped.is_empty() {
            summary.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        if !self.failed.is_empty() {
            summary.push_str(&format!(", {} failed", self.failed.len()));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denied(path: &str) -> (PathBuf, OperationError) {
        (
            PathBuf::from(path),
            OperationError::PermissionDenied(PathBuf::from(path)),
        )
    }

    #[test]
    fn test_finish_all_succeeded() {
        let mut outcome = OperationOutcome::new();
        outcome.record_success(PathBuf::from("/a"));
        outcome.record_skip(PathBuf::from("/b"));
        let outcome = outcome.finish(2).unwrap();
        assert_eq!(outcome.succeeded.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[test]
    fn test_finish_single_item_failure_is_unwrapped() {
        let mut outcome = OperationOutcome::new();
        let (path, err) = denied("/a");
        outcome.record_failure(path, err);
        let err = outcome.finish(1).unwrap_err();
        assert!(matches!(err, OperationError::PermissionDenied(_)));
    }

    #[test]
    fn test_finish_multi_item_total_failure_is_wrapped() {
        let mut outcome = OperationOutcome::new();
        let (path, err) = denied("/a");
        outcome.record_failure(path, err);
        let (path, err) = denied("/b");
        outcome.record_failure(path, err);

        match outcome.finish(2).unwrap_err() {
            OperationError::Unknown(cause) => {
                let inner = cause.downcast_ref::<OperationError>().unwrap();
                assert!(matches!(inner, OperationError::PermissionDenied(p) if p == &PathBuf::from("/a")));
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_finish_mixed_is_partial_failure() {
        let mut outcome = OperationOutcome::new();
        outcome.record_success(PathBuf::from("/a"));
        let (path, err) = denied("/b");
        outcome.record_failure(path, err);
        outcome.record_success(PathBuf::from("/c"));

        match outcome.finish(3).unwrap_err() {
            OperationError::PartialFailure { succeeded, failed } => {
                assert_eq!(succeeded.len(), 2);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, PathBuf::from("/b"));
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_summary() {
        let mut outcome = OperationOutcome::new();
        outcome.record_success(PathBuf::from("/a"));
        outcome.record_skip(PathBuf::from("/b"));
        assert_eq!(outcome.summary(OperationType::Copy), "Copied 1 item, 1 skipped");
    }
}
