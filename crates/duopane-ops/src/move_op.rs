//! Blocking move primitive.

use std::fs;
use std::io;
use std::path::Path;

use crate::copy::copy_item;
use crate::delete::remove_item;

/// Move a single item (file or directory) to `dest`.
///
/// Tries a rename first and falls back to copy + remove when the two paths
/// live on different file systems. Returns the number of bytes copied by the
/// fallback, or 0 for a plain rename.
pub fn move_item(source: &Path, dest: &Path, symlinks_as_links: bool) -> io::Result<u64> {
    if fs::symlink_metadata(dest).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        ));
    }

    match fs::rename(source, dest) {
        Ok(()) => Ok(0),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            let bytes = copy_item(source, dest, symlinks_as_links)?;
            remove_item(source)?;
            Ok(bytes)
        }
        Err(e) => Err(e),
    }
}
