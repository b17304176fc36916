//! Blocking copy primitives.

use std::fs;
use std::io;
use std::path::Path;

/// Copy a single item (file, directory or symlink) to `dest`.
///
/// Returns the number of bytes copied. `dest` must not exist yet.
pub fn copy_item(source: &Path, dest: &Path, symlinks_as_links: bool) -> io::Result<u64> {
    let metadata = fs::symlink_metadata(source)?;

    if metadata.file_type().is_symlink() && symlinks_as_links {
        copy_symlink(source, dest)?;
        return Ok(0);
    }

    if source.is_dir() {
        copy_dir_recursive(source, dest, symlinks_as_links)
    } else {
        copy_file(source, dest)
    }
}

/// Copy a single file without overwriting.
fn copy_file(source: &Path, dest: &Path) -> io::Result<u64> {
    if fs::symlink_metadata(dest).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        ));
    }
    fs::copy(source, dest)
}

/// Recursively copy a directory.
fn copy_dir_recursive(source: &Path, dest: &Path, symlinks_as_links: bool) -> io::Result<u64> {
    fs::create_dir(dest)?;

    let mut total_bytes = 0u64;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() && symlinks_as_links {
            copy_symlink(&path, &dest_path)?;
        } else if path.is_dir() {
            total_bytes += copy_dir_recursive(&path, &dest_path, symlinks_as_links)?;
        } else {
            total_bytes += fs::copy(&path, &dest_path)?;
        }
    }

    Ok(total_bytes)
}

#[cfg(unix)]
fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(source)?;
    std::os::unix::fs::symlink(target, dest)
}

// Links become regular copies where they cannot be recreated portably.
#[cfg(not(unix))]
fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    if source.is_dir() {
        copy_dir_recursive(source, dest, false).map(|_| ())
    } else {
        fs::copy(source, dest).map(|_| ())
    }
}
