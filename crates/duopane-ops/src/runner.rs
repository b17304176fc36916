//! Drives one batch from its first item to its final result.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use duopane_core::{OperationError, OperationOutcome, OperationRequest};

use crate::conflict::{ConflictPrompt, ConflictResolution, ConflictResolver};
use crate::executor::OperationExecutor;
use crate::naming::{allocate_copy_name, allocate_file_name, allocate_folder_name, path_exists};
use crate::progress::{ProgressSink, ProgressSnapshot};
use crate::rename::{is_case_only_rename, validate_filename};

/// What happened to one item.
enum ItemResult {
    /// The item ended up at this path.
    Done(PathBuf),
    /// A conflict was resolved with skip.
    Skipped,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Copy,
    Move,
}

/// Executes the items of a batch one after another.
pub struct BatchRunner {
    executor: OperationExecutor,
    prompt: Arc<dyn ConflictPrompt>,
    sink: Arc<dyn ProgressSink>,
}

impl BatchRunner {
    /// Create a runner.
    pub fn new(
        executor: OperationExecutor,
        prompt: Arc<dyn ConflictPrompt>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            executor,
            prompt,
            sink,
        }
    }

    /// Run every item of `operation`.
    ///
    /// Cancellation is checked before each item; an item already in flight
    /// always finishes. A cancelled batch reports only
    /// [`OperationError::Cancelled`], and items completed before it stay on
    /// disk. Item failures are recorded and the batch moves on.
    pub async fn run(
        &self,
        operation: Arc<OperationRequest>,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, OperationError> {
        let total = operation.item_count();
        let mut progress = ProgressSnapshot::new(Arc::clone(&operation));
        self.sink.on_progress(&progress);

        let mut resolver = ConflictResolver::new(&*self.prompt);
        let mut outcome = OperationOutcome::new();

        for item in operation.items() {
            if cancel.is_cancelled() {
                debug!(
                    completed = progress.completed_count,
                    total, "Batch cancelled"
                );
                return Err(OperationError::Cancelled);
            }

            progress.set_current_item(Some(item.clone()));
            self.sink.on_progress(&progress);

            match self.run_item(&operation, item, &mut resolver).await {
                Ok(ItemResult::Done(path)) => {
                    debug!(item = %item.display(), result = %path.display(), "Item done");
                    outcome.record_success(path);
                }
                Ok(ItemResult::Skipped) => {
                    debug!(item = %item.display(), "Item skipped");
                    outcome.record_skip(item.clone());
                }
                Err(err) => {
                    warn!(item = %item.display(), error = %err, "Item failed");
                    outcome.record_failure(item.clone(), err);
                }
            }

            progress.complete_item();
            self.sink.on_progress(&progress);
        }

        outcome.finish(total)
    }

    async fn run_item(
        &self,
        operation: &OperationRequest,
        item: &Path,
        resolver: &mut ConflictResolver<'_>,
    ) -> Result<ItemResult, OperationError> {
        match operation {
            OperationRequest::Copy { destination, .. } => {
                self.transfer(Transfer::Copy, item, destination, resolver)
                    .await
            }
            OperationRequest::Move { destination, .. } => {
                self.transfer(Transfer::Move, item, destination, resolver)
                    .await
            }
            OperationRequest::Delete { .. } => {
                self.executor.trash(item).await?;
                Ok(ItemResult::Done(item.to_path_buf()))
            }
            OperationRequest::DeleteImmediately { .. } => {
                self.executor.remove(item).await?;
                Ok(ItemResult::Done(item.to_path_buf()))
            }
            OperationRequest::Duplicate { .. } => {
                let parent = parent_of(item)?;
                let dest = allocate_copy_name(item, parent);
                self.executor.copy(item, &dest).await?;
                Ok(ItemResult::Done(dest))
            }
            OperationRequest::Rename { new_name, .. } => self.rename(item, new_name).await,
            OperationRequest::CreateFolder { name, .. } => {
                let name = checked_name(name)?;
                let path = allocate_folder_name(item, name);
                self.executor.create_directory(&path).await?;
                Ok(ItemResult::Done(path))
            }
            OperationRequest::CreateFile { name, .. } => {
                let name = checked_name(name)?;
                let path = allocate_file_name(item, name);
                self.executor.create_file(&path).await?;
                Ok(ItemResult::Done(path))
            }
        }
    }

    /// Copy or move one source into `target_dir`.
    async fn transfer(
        &self,
        mode: Transfer,
        source: &Path,
        target_dir: &Path,
        resolver: &mut ConflictResolver<'_>,
    ) -> Result<ItemResult, OperationError> {
        let name = source.file_name().ok_or_else(|| {
            OperationError::unknown(format!("\"{}\" has no file name", source.display()))
        })?;

        // Nothing at the destination may be touched for a source that is gone.
        self.executor.check_exists(source).await?;

        let source_entry = resolved_entry(source);
        let target = resolved(target_dir);
        if target.starts_with(&source_entry) {
            let verb = if mode == Transfer::Copy { "copy" } else { "move" };
            return Err(OperationError::unknown(format!(
                "Cannot {} \"{}\" into itself",
                verb,
                source.display()
            )));
        }

        let dest = target_dir.join(name);

        // Dropping an item onto its own folder.
        if target.join(name) == source_entry {
            return match mode {
                Transfer::Move => Ok(ItemResult::Done(dest)),
                Transfer::Copy => {
                    let dest = allocate_copy_name(source, target_dir);
                    self.executor.copy(source, &dest).await?;
                    Ok(ItemResult::Done(dest))
                }
            };
        }

        let dest = if path_exists(&dest) {
            let decision = resolver.resolve(source, &dest).await;
            match decision.resolution {
                ConflictResolution::Skip => return Ok(ItemResult::Skipped),
                ConflictResolution::Replace => {
                    if source_entry.starts_with(resolved_entry(&dest)) {
                        return Err(OperationError::DestinationExists(dest));
                    }
                    self.executor.remove(&dest).await?;
                    dest
                }
                ConflictResolution::KeepBoth => allocate_copy_name(source, target_dir),
            }
        } else {
            dest
        };

        match mode {
            Transfer::Copy => self.executor.copy(source, &dest).await?,
            Transfer::Move => self.executor.move_item(source, &dest).await?,
        };
        Ok(ItemResult::Done(dest))
    }

    /// Rename `item` in place. Never consults conflict resolution.
    async fn rename(&self, item: &Path, new_name: &str) -> Result<ItemResult, OperationError> {
        let name = checked_name(new_name)?;
        let target = parent_of(item)?.join(name);

        if target == item {
            return Ok(ItemResult::Done(target));
        }

        if path_exists(&target) && !is_case_only_rename(item, &target) {
            return Err(OperationError::DestinationExists(target));
        }

        self.executor.rename(item, &target).await?;
        Ok(ItemResult::Done(target))
    }
}

/// Trim and validate a user-supplied name.
fn checked_name(raw: &str) -> Result<&str, OperationError> {
    let name = raw.trim();
    validate_filename(name).map_err(|reason| OperationError::invalid_name(raw, reason))?;
    Ok(name)
}

/// Canonical form of `path`, or `path` itself when it cannot be resolved.
fn resolved(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Canonical location of the entry at `path`. Only the parent is resolved,
/// so a symlink stays the link rather than its target.
fn resolved_entry(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if parent.as_os_str().is_empty() => {
            resolved(Path::new(".")).join(name)
        }
        (Some(parent), Some(name)) => resolved(parent).join(name),
        _ => resolved(path),
    }
}

fn parent_of(item: &Path) -> Result<&Path, OperationError> {
    item.parent()
        .ok_or_else(|| OperationError::unknown(format!("\"{}\" has no parent", item.display())))
}
