//! File and directory creation primitives.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// Create a new empty file, failing if anything exists at `path`.
pub fn create_file(path: &Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(|_| ())
}

/// Create a new directory. The parent must already exist.
pub fn create_directory(path: &Path) -> io::Result<()> {
    fs::create_dir(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_file_never_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "keep me").unwrap();

        let err = create_file(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_create_directory_requires_parent() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_directory(&dir.path().join("missing/child")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        create_directory(&dir.path().join("child")).unwrap();
        assert!(dir.path().join("child").is_dir());
    }
}
