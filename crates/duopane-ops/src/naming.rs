//! Unique sibling names for duplicates, keep-both copies and new entries.
//!
//! Every lookup checks the live file system. Nothing is cached, so a name
//! taken by another process between two allocations is noticed.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// Check whether anything occupies `path`, including dangling symlinks.
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Find a free "copy" name for `source` inside `directory`.
///
/// For "doc.txt" tries "doc copy.txt", "doc copy 2.txt", "doc copy 3.txt"
/// and so on. Directories and dotfiles keep their whole name as the stem.
pub fn allocate_copy_name(source: &Path, directory: &Path) -> PathBuf {
    let (stem, extension) = split_name(source, source.is_dir());

    let mut n: u64 = 1;
    loop {
        let suffix = if n == 1 {
            " copy".to_string()
        } else {
            format!(" copy {}", n)
        };
        let candidate = directory.join(compose(&stem, &suffix, extension.as_deref()));
        if !path_exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Find a free directory name: "base", "base 2", "base 3", ...
pub fn allocate_folder_name(directory: &Path, base: &str) -> PathBuf {
    allocate_numbered(directory, OsStr::new(base), None)
}

/// Find a free file name, numbering before the extension:
/// "notes.txt", "notes 2.txt", "notes 3.txt", ...
pub fn allocate_file_name(directory: &Path, name: &str) -> PathBuf {
    let (stem, extension) = split_name(Path::new(name), false);
    allocate_numbered(directory, &stem, extension.as_deref())
}

fn allocate_numbered(directory: &Path, stem: &OsStr, extension: Option<&OsStr>) -> PathBuf {
    let first = directory.join(compose(stem, "", extension));
    if !path_exists(&first) {
        return first;
    }

    let mut n: u64 = 2;
    loop {
        let candidate = directory.join(compose(stem, &format!(" {}", n), extension));
        if !path_exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Split a path's final component into stem and extension.
fn split_name(path: &Path, whole: bool) -> (OsString, Option<OsString>) {
    let name = path.file_name().unwrap_or_default().to_os_string();
    if whole {
        return (name, None);
    }
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => (stem.to_os_string(), Some(ext.to_os_string())),
        _ => (name, None),
    }
}

fn compose(stem: &OsStr, suffix: &str, extension: Option<&OsStr>) -> OsString {
    let mut name = stem.to_os_string();
    name.push(suffix);
    if let Some(ext) = extension {
        name.push(".");
        name.push(ext);
    }
    name
}
