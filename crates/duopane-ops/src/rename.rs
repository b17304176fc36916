//! Name validation and the blocking rename primitive.

use std::fs;
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Maximum length of a single path component, in bytes.
const MAX_NAME_LEN: usize = 255;

/// Validate a user-supplied file or directory name.
///
/// The name is expected to be trimmed already. Only rules that would make
/// the name unusable or resolve to a different location are enforced here.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > MAX_NAME_LEN {
        return Err(format!("Name is too long (max {} bytes)", MAX_NAME_LEN));
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain {:?}", c));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windows_invalid = ['\\', ':', '*', '?', '"', '<', '>', '|'];
        for c in windows_invalid {
            if name.contains(c) {
                return Err(format!("Name cannot contain {:?}", c));
            }
        }

        let reserved = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        let upper_name = name.to_uppercase();
        let base_name = upper_name.split('.').next().unwrap_or("");
        if reserved.contains(&base_name) {
            return Err("Reserved filename".into());
        }

        if name.ends_with('.') {
            return Err("Name cannot end with a dot".into());
        }
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}

/// Check whether renaming `item` to `target` only changes letter case and
/// `target` resolves to `item` itself, as on a case-insensitive volume.
///
/// Hard links share an entry but have unrelated names, so they never
/// qualify.
pub fn is_case_only_rename(item: &Path, target: &Path) -> bool {
    let same_case_folded = match (item.file_name(), target.file_name()) {
        (Some(a), Some(b)) => {
            a != b && a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
        }
        _ => false,
    };
    same_case_folded && is_same_entry(item, target)
}

/// Check whether two existing paths refer to the same file system entry.
#[cfg(unix)]
pub fn is_same_entry(a: &Path, b: &Path) -> bool {
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
pub fn is_same_entry(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Rename `source` to `dest` in place.
pub fn rename_item(source: &Path, dest: &Path) -> io::Result<()> {
    fs::symlink_metadata(source)?;
    fs::rename(source, dest)
}
