//! File operation engine for duopane.
//!
//! This crate runs batches of file operations (copy, move, trash, permanent
//! delete, rename, duplicate, create) one at a time through an
//! [`OperationQueue`]. Name collisions are settled by a [`ConflictPrompt`],
//! progress is reported to a [`ProgressSink`], and failures are classified
//! into [`OperationError`] and aggregated per batch.

mod conflict;
mod copy;
mod create;
mod delete;
mod executor;
mod move_op;
mod naming;
mod present;
mod progress;
mod queue;
mod rename;
mod runner;

pub use conflict::{
    ChannelPrompt, Conflict, ConflictDecision, ConflictKind, ConflictPrompt, ConflictRequest,
    ConflictResolution, ConflictResolver, FixedPolicy,
};
pub use delete::{SystemTrash, TrashBackend};
pub use executor::OperationExecutor;
pub use naming::{allocate_copy_name, allocate_file_name, allocate_folder_name};
pub use present::{present_error, ErrorPresentation};
pub use progress::{
    EventBroadcaster, FnSink, NullSink, OperationEvent, ProgressSink, ProgressSnapshot,
};
pub use queue::{CancelHandle, OperationQueue, OperationQueueBuilder, Submission};
pub use rename::validate_filename;
pub use runner::BatchRunner;

pub use duopane_core::{
    EngineConfig, OperationError, OperationOutcome, OperationRequest, OperationType, RawError,
};
