//! Progress reporting types for file operations.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;

use duopane_core::{EngineConfig, OperationRequest, OperationType};

/// Progress of the batch that is currently running.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    /// The batch being executed.
    pub operation: Arc<OperationRequest>,
    /// The item currently being processed.
    pub current_item: Option<PathBuf>,
    /// Number of items finished so far, whatever their result.
    pub completed_count: u64,
    /// Total number of items in the batch.
    pub total_count: u64,
}

impl ProgressSnapshot {
    /// Create the initial snapshot of a batch.
    pub fn new(operation: Arc<OperationRequest>) -> Self {
        let total_count = operation.item_count() as u64;
        Self {
            operation,
            current_item: None,
            completed_count: 0,
            total_count,
        }
    }

    /// The type of operation.
    pub fn operation_type(&self) -> OperationType {
        self.operation.operation_type()
    }

    /// Fraction of items completed (0.0 to 1.0).
    pub fn fraction_completed(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.completed_count as f64 / self.total_count as f64
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        self.fraction_completed() * 100.0
    }

    /// Check if every item has been processed.
    pub fn is_complete(&self) -> bool {
        self.completed_count == self.total_count
    }

    /// Update the item being processed.
    pub fn set_current_item(&mut self, path: Option<PathBuf>) {
        self.current_item = path;
    }

    /// Count one more item as finished.
    pub fn complete_item(&mut self) {
        if self.completed_count < self.total_count {
            self.completed_count += 1;
        }
    }
}

/// Receives batch lifecycle and progress notifications.
///
/// Calls happen synchronously on the task running the batch, so
/// implementations should hand work off quickly rather than block.
pub trait ProgressSink: Send + Sync {
    /// A batch is starting. `present_progress` is set when the batch is large
    /// enough to show a cancellable progress surface.
    fn on_batch_started(&self, _operation: &Arc<OperationRequest>, _present_progress: bool) {}

    /// A batch made progress.
    fn on_progress(&self, snapshot: &ProgressSnapshot);

    /// A batch reached a terminal state; dismiss any progress surface.
    fn on_batch_finished(&self, _operation: &Arc<OperationRequest>) {}
}

/// A sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}
}

/// Adapts a closure into a [`ProgressSink`] that only sees progress ticks.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&ProgressSnapshot) + Send + Sync,
{
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        (self.0)(snapshot)
    }
}

/// An event published by [`EventBroadcaster`].
#[derive(Debug, Clone)]
pub enum OperationEvent {
    /// A batch started.
    Started {
        operation: Arc<OperationRequest>,
        present_progress: bool,
    },
    /// Progress update.
    Progress(ProgressSnapshot),
    /// A batch finished, successfully or not.
    Finished { operation: Arc<OperationRequest> },
}

/// A sink that fans events out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<OperationEvent>,
}

impl EventBroadcaster {
    /// Create a broadcaster buffering up to `capacity` events per subscriber.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Create a broadcaster sized by the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.channel_size)
    }

    /// Subscribe to operation events.
    pub fn subscribe(&self) -> broadcast::Receiver<OperationEvent> {
        self.tx.subscribe()
    }
}

impl ProgressSink for EventBroadcaster {
    fn on_batch_started(&self, operation: &Arc<OperationRequest>, present_progress: bool) {
        let _ = self.tx.send(OperationEvent::Started {
            operation: Arc::clone(operation),
            present_progress,
        });
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        let _ = self.tx.send(OperationEvent::Progress(snapshot.clone()));
    }

    fn on_batch_finished(&self, operation: &Arc<OperationRequest>) {
        let _ = self.tx.send(OperationEvent::Finished {
            operation: Arc::clone(operation),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> Arc<OperationRequest> {
        let items = (0..n).map(|i| PathBuf::from(format!("/tmp/{i}"))).collect();
        Arc::new(OperationRequest::delete(items))
    }

    #[test]
    fn test_fraction_completed() {
        let mut progress = ProgressSnapshot::new(batch(4));
        assert_eq!(progress.fraction_completed(), 0.0);

        progress.complete_item();
        assert_eq!(progress.fraction_completed(), 0.25);
        assert_eq!(progress.percentage(), 25.0);
    }

    #[test]
    fn test_empty_batch_fraction_is_zero() {
        let progress = ProgressSnapshot::new(batch(0));
        assert_eq!(progress.fraction_completed(), 0.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_completed_count_never_exceeds_total() {
        let mut progress = ProgressSnapshot::new(batch(1));
        progress.complete_item();
        progress.complete_item();
        assert_eq!(progress.completed_count, 1);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let broadcaster = EventBroadcaster::new(0);
        let mut rx = broadcaster.subscribe();
        broadcaster.on_batch_finished(&batch(1));
        assert!(matches!(rx.try_recv().unwrap(), OperationEvent::Finished { .. }));
    }

    #[test]
    fn test_broadcaster_delivers_events() {
        let broadcaster = EventBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();
        let operation = batch(2);

        broadcaster.on_batch_started(&operation, false);
        broadcaster.on_progress(&ProgressSnapshot::new(Arc::clone(&operation)));
        broadcaster.on_batch_finished(&operation);

        assert!(matches!(rx.try_recv().unwrap(), OperationEvent::Started { .. }));
        assert!(matches!(rx.try_recv().unwrap(), OperationEvent::Progress(_)));
        assert!(matches!(rx.try_recv().unwrap(), OperationEvent::Finished { .. }));
    }
}
