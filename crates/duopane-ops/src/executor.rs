//! Per-item operation executor.
//!
//! Each method performs one file-system action for one item on the blocking
//! thread pool and maps any failure onto [`OperationError`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use duopane_core::{classify, EngineConfig, OperationError, RawError};

use crate::copy::copy_item;
use crate::create::{create_directory, create_file};
use crate::delete::{remove_item, SystemTrash, TrashBackend};
use crate::move_op::move_item;
use crate::rename::rename_item;

/// Executor for single-item file actions.
#[derive(Clone)]
pub struct OperationExecutor {
    trash: Arc<dyn TrashBackend>,
    symlinks_as_links: bool,
}

impl Default for OperationExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OperationExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationExecutor")
            .field("symlinks_as_links", &self.symlinks_as_links)
            .finish_non_exhaustive()
    }
}

impl OperationExecutor {
    /// Create an executor using the system trash.
    pub fn new() -> Self {
        Self {
            trash: Arc::new(SystemTrash),
            symlinks_as_links: true,
        }
    }

    /// Create an executor configured from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            symlinks_as_links: config.copy_symlinks_as_links,
            ..Self::new()
        }
    }

    /// Use a different trash backend.
    pub fn with_trash(mut self, trash: Arc<dyn TrashBackend>) -> Self {
        self.trash = trash;
        self
    }

    /// Check that `path` exists, without following a final symlink.
    pub async fn check_exists(&self, path: &Path) -> Result<(), OperationError> {
        let target = path.to_path_buf();
        run_blocking(path, move || {
            fs::symlink_metadata(&target)?;
            Ok(())
        })
        .await
    }

    /// Copy `source` to `dest`. Returns the number of bytes copied.
    pub async fn copy(&self, source: &Path, dest: &Path) -> Result<u64, OperationError> {
        let links = self.symlinks_as_links;
        let (src, dst) = (source.to_path_buf(), dest.to_path_buf());
        run_blocking(source, move || Ok(copy_item(&src, &dst, links)?)).await
    }

    /// Move `source` to `dest`.
    pub async fn move_item(&self, source: &Path, dest: &Path) -> Result<u64, OperationError> {
        let links = self.symlinks_as_links;
        let (src, dst) = (source.to_path_buf(), dest.to_path_buf());
        run_blocking(source, move || Ok(move_item(&src, &dst, links)?)).await
    }

    /// Move `path` to the trash.
    pub async fn trash(&self, path: &Path) -> Result<(), OperationError> {
        let trash = Arc::clone(&self.trash);
        let target = path.to_path_buf();
        run_blocking(path, move || trash.trash(&target)).await
    }

    /// Remove `path` permanently.
    pub async fn remove(&self, path: &Path) -> Result<(), OperationError> {
        let target = path.to_path_buf();
        run_blocking(path, move || Ok(remove_item(&target)?)).await
    }

    /// Rename `source` to `dest` within its directory.
    pub async fn rename(&self, source: &Path, dest: &Path) -> Result<(), OperationError> {
        let (src, dst) = (source.to_path_buf(), dest.to_path_buf());
        run_blocking(source, move || Ok(rename_item(&src, &dst)?)).await
    }

    /// Create a new empty file at `path`.
    pub async fn create_file(&self, path: &Path) -> Result<(), OperationError> {
        let target = path.to_path_buf();
        run_blocking(path, move || Ok(create_file(&target)?)).await
    }

    /// Create a new directory at `path`.
    pub async fn create_directory(&self, path: &Path) -> Result<(), OperationError> {
        let target = path.to_path_buf();
        run_blocking(path, move || Ok(create_directory(&target)?)).await
    }
}

/// Run a blocking action and classify its failure against `path`.
async fn run_blocking<T, F>(path: &Path, action: F) -> Result<T, OperationError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RawError> + Send + 'static,
{
    let path: PathBuf = path.to_path_buf();
    match tokio::task::spawn_blocking(action).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(raw)) => Err(classify(raw, &path)),
        Err(join_error) => Err(OperationError::wrap(join_error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_copy_classifies_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let err = OperationExecutor::new()
            .copy(&missing, &dir.path().join("out.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::SourceNotFound(p) if p == missing));
    }

    #[tokio::test]
    async fn test_check_exists() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.txt");
        let executor = OperationExecutor::new();

        executor.check_exists(dir.path()).await.unwrap();
        let err = executor.check_exists(&missing).await.unwrap_err();
        assert!(matches!(err, OperationError::SourceNotFound(p) if p == missing));
    }

    #[tokio::test]
    async fn test_create_file_over_existing_is_destination_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "x").unwrap();

        let err = OperationExecutor::new().create_file(&path).await.unwrap_err();
        assert!(matches!(err, OperationError::DestinationExists(_)));
    }

    #[tokio::test]
    async fn test_remove_and_rename() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "x").unwrap();

        let executor = OperationExecutor::new();
        executor.rename(&a, &b).await.unwrap();
        assert!(b.exists());
        executor.remove(&b).await.unwrap();
        assert!(!b.exists());
    }
}
