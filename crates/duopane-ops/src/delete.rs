//! Trash and permanent deletion primitives.

use std::fs;
use std::io;
use std::path::Path;

use duopane_core::RawError;

/// Moves items to a recoverable location.
pub trait TrashBackend: Send + Sync {
    /// Move `path` to the trash.
    fn trash(&self, path: &Path) -> Result<(), RawError>;
}

/// The platform trash (Finder Trash, freedesktop trash, Recycle Bin).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrash;

impl TrashBackend for SystemTrash {
    fn trash(&self, path: &Path) -> Result<(), RawError> {
        // The trash crate reports a missing path as an opaque error.
        fs::symlink_metadata(path)?;
        trash::delete(path).map_err(unwrap_trash_error)
    }
}

/// Surface the `io::Error` inside a trash failure so its kind can be
/// classified; the trash crate's `source()` skips over it.
fn unwrap_trash_error(err: trash::Error) -> RawError {
    match err {
        #[cfg(all(
            unix,
            not(target_os = "macos"),
            not(target_os = "ios"),
            not(target_os = "android")
        ))]
        trash::Error::FileSystem { source, .. } => Box::new(source),
        other => Box::new(other),
    }
}

/// Remove a file, symlink or directory tree.
pub fn remove_item(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
