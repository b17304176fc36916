//! The operation queue: runs submitted batches one at a time, in order.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use duopane_core::{EngineConfig, OperationError, OperationOutcome, OperationRequest};

use crate::conflict::{ConflictPrompt, FixedPolicy};
use crate::delete::TrashBackend;
use crate::executor::OperationExecutor;
use crate::progress::{NullSink, ProgressSink};
use crate::runner::BatchRunner;

type BatchResult = Result<OperationOutcome, OperationError>;

/// A pending batch and the channel its caller waits on.
struct QueueEntry {
    operation: Arc<OperationRequest>,
    responder: oneshot::Sender<BatchResult>,
}

/// Cancels whichever batch is currently running.
///
/// Each batch gets its own token, so a cancel request never carries over to
/// batches that are still waiting in the queue.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl CancelHandle {
    /// Request cancellation of the running batch.
    ///
    /// Returns `false` when no batch is running.
    pub fn cancel(&self) -> bool {
        match self.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Check if a batch is running right now.
    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.lock() = Some(token.clone());
        token
    }

    fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Finalization for a batch: announces the end and clears the running
/// marker on every exit path.
struct FinishGuard {
    operation: Arc<OperationRequest>,
    sink: Arc<dyn ProgressSink>,
    current: CancelHandle,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.current.clear();
        self.sink.on_batch_finished(&self.operation);
    }
}

/// Builder for [`OperationQueue`].
pub struct OperationQueueBuilder {
    config: EngineConfig,
    prompt: Arc<dyn ConflictPrompt>,
    sink: Arc<dyn ProgressSink>,
    trash: Option<Arc<dyn TrashBackend>>,
}

impl Default for OperationQueueBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            prompt: Arc::new(FixedPolicy::default()),
            sink: Arc::new(NullSink),
            trash: None,
        }
    }
}

impl OperationQueueBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set who decides conflicts. Defaults to always skipping.
    pub fn prompt(mut self, prompt: Arc<dyn ConflictPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Set where progress goes. Defaults to nowhere.
    pub fn sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the system trash.
    pub fn trash(mut self, trash: Arc<dyn TrashBackend>) -> Self {
        self.trash = Some(trash);
        self
    }

    /// Start the queue's worker on the current tokio runtime.
    pub fn spawn(self) -> OperationQueue {
        let mut executor = OperationExecutor::from_config(&self.config);
        if let Some(trash) = self.trash {
            executor = executor.with_trash(trash);
        }

        let runner = Arc::new(BatchRunner::new(
            executor,
            self.prompt,
            Arc::clone(&self.sink),
        ));
        let (tx, rx) = mpsc::unbounded_channel();
        let current = CancelHandle::default();

        let worker = tokio::spawn(run_worker(
            rx,
            runner,
            self.sink,
            self.config,
            current.clone(),
        ));

        OperationQueue {
            tx,
            current,
            worker,
        }
    }
}

/// Serializes file operations so batches never race each other.
///
/// Submissions are accepted from any task at any time and run strictly in
/// submission order, one batch at a time.
pub struct OperationQueue {
    tx: mpsc::UnboundedSender<QueueEntry>,
    current: CancelHandle,
    worker: JoinHandle<()>,
}

impl OperationQueue {
    /// Create a queue builder.
    pub fn builder() -> OperationQueueBuilder {
        OperationQueueBuilder::default()
    }

    /// Start a queue with the given collaborators and the system trash.
    pub fn new(
        config: EngineConfig,
        prompt: Arc<dyn ConflictPrompt>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self::builder()
            .config(config)
            .prompt(prompt)
            .sink(sink)
            .spawn()
    }

    /// Submit a batch.
    ///
    /// The batch is enqueued immediately, before the returned future is
    /// polled; the future resolves once the batch reaches a terminal state.
    pub fn submit(&self, request: OperationRequest) -> Submission {
        self.enqueue(request, Ok)
    }

    /// Copy `sources` into the `destination` directory.
    pub fn copy(&self, sources: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Submission {
        self.submit(OperationRequest::copy(sources, destination))
    }

    /// Move `sources` into the `destination` directory.
    pub fn move_to(&self, sources: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Submission {
        self.submit(OperationRequest::move_to(sources, destination))
    }

    /// Move `items` to the trash.
    pub fn delete(&self, items: Vec<PathBuf>) -> Submission {
        self.submit(OperationRequest::delete(items))
    }

    /// Remove `items` without going through the trash.
    pub fn delete_immediately(&self, items: Vec<PathBuf>) -> Submission {
        self.submit(OperationRequest::delete_immediately(items))
    }

    /// Rename `item`, resolving to its new path.
    pub fn rename(
        &self,
        item: impl Into<PathBuf>,
        new_name: impl Into<String>,
    ) -> Submission<PathBuf> {
        self.enqueue(OperationRequest::rename(item, new_name), single_path)
    }

    /// Duplicate `items` next to themselves, resolving to the new paths.
    pub fn duplicate(&self, items: Vec<PathBuf>) -> Submission<Vec<PathBuf>> {
        self.enqueue(OperationRequest::duplicate(items), |outcome| {
            Ok(outcome.succeeded)
        })
    }

    /// Create a directory in `directory`, resolving to the path actually used.
    pub fn create_folder(
        &self,
        directory: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> Submission<PathBuf> {
        self.enqueue(OperationRequest::create_folder(directory, name), single_path)
    }

    /// Create an empty file in `directory`, resolving to the path actually used.
    pub fn create_file(
        &self,
        directory: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> Submission<PathBuf> {
        self.enqueue(OperationRequest::create_file(directory, name), single_path)
    }

    /// Cancel the running batch, if any. Queued batches are unaffected.
    pub fn cancel_current(&self) {
        if !self.current.cancel() {
            debug!("Cancel requested with no batch running");
        }
    }

    /// A handle that can cancel the running batch from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.current.clone()
    }

    /// Check if a batch is running right now.
    pub fn is_busy(&self) -> bool {
        self.current.is_running()
    }

    /// Stop accepting work and wait for every queued batch to finish.
    pub async fn shutdown(self) {
        let Self { tx, worker, .. } = self;
        drop(tx);
        if let Err(e) = worker.await {
            warn!(error = %e, "Operation queue worker ended abnormally");
        }
    }

    fn enqueue<T>(&self, request: OperationRequest, extract: Extract<T>) -> Submission<T> {
        let (responder, rx) = oneshot::channel();
        let entry = QueueEntry {
            operation: Arc::new(request),
            responder,
        };
        if self.tx.send(entry).is_err() {
            warn!("Operation submitted after the queue shut down");
        }
        Submission { rx, extract }
    }
}

/// The pending result of a submitted batch.
///
/// Dropping it does not cancel or dequeue the batch; the engine keeps going
/// and the result is discarded.
#[must_use = "a submission resolves to the batch result"]
pub struct Submission<T = OperationOutcome> {
    rx: oneshot::Receiver<BatchResult>,
    extract: Extract<T>,
}

type Extract<T> = fn(OperationOutcome) -> Result<T, OperationError>;

impl<T> Future for Submission<T> {
    type Output = Result<T, OperationError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result.and_then(this.extract)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(OperationError::unknown(
                "The operation queue stopped before the batch finished",
            ))),
        }
    }
}

fn single_path(outcome: OperationOutcome) -> Result<PathBuf, OperationError> {
    outcome
        .succeeded
        .into_iter()
        .next()
        .ok_or_else(|| OperationError::unknown("The operation produced no result"))
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<QueueEntry>,
    runner: Arc<BatchRunner>,
    sink: Arc<dyn ProgressSink>,
    config: EngineConfig,
    current: CancelHandle,
) {
    while let Some(QueueEntry {
        operation,
        responder,
    }) = rx.recv().await
    {
        let operation_type = operation.operation_type();
        let items = operation.item_count();

        let result = {
            let token = current.begin();
            let _finish = FinishGuard {
                operation: Arc::clone(&operation),
                sink: Arc::clone(&sink),
                current: current.clone(),
            };

            info!(operation = %operation_type, items, "Starting batch");
            sink.on_batch_started(&operation, config.should_present_progress(items));

            // A panicking item must not take the queue down with it.
            let runner = Arc::clone(&runner);
            let batch = Arc::clone(&operation);
            match tokio::spawn(async move { runner.run(batch, &token).await }).await {
                Ok(result) => result,
                Err(join_error) => Err(OperationError::wrap(join_error)),
            }
        };

        match &result {
            Ok(outcome) => info!(
                operation = %operation_type,
                summary = %outcome.summary(operation_type),
                "Batch finished"
            ),
            Err(OperationError::Cancelled) => info!(operation = %operation_type, "Batch cancelled"),
            Err(e) => warn!(operation = %operation_type, error = %e, "Batch failed"),
        }

        if responder.send(result).is_err() {
            debug!(operation = %operation_type, "Caller stopped waiting for the batch result");
        }
    }

    debug!("Operation queue drained");
}
