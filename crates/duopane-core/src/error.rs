//! Error taxonomy for file operations.

use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Shared, type-erased underlying cause of an [`OperationError::Unknown`].
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// A raw failure produced by a file-system primitive, before classification.
pub type RawError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur while executing a file operation.
///
/// The set is closed: every low-level failure is mapped onto one of these
/// variants by [`classify`], independent of the platform's error codes.
#[derive(Debug, Clone, Error)]
pub enum OperationError {
    /// The destination path is already taken.
    #[error("\"{}\" already exists", .0.display())]
    DestinationExists(PathBuf),

    /// The item to operate on does not exist.
    #[error("\"{}\" could not be found", .0.display())]
    SourceNotFound(PathBuf),

    /// Access to the path was denied.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// The destination volume ran out of space.
    #[error("There is not enough free space to complete the operation")]
    DiskFull,

    /// The batch was cancelled before it finished.
    #[error("Operation cancelled")]
    Cancelled,

    /// Some items succeeded and some failed.
    #[error(
        "{} of {} items could not be processed",
        .failed.len(),
        .failed.len() + .succeeded.len()
    )]
    PartialFailure {
        succeeded: Vec<PathBuf>,
        failed: Vec<(PathBuf, OperationError)>,
    },

    /// A new name was rejected before touching the file system.
    #[error("\"{name}\" is not a valid name: {reason}")]
    InvalidName { name: String, reason: String },

    /// Anything the classifier does not recognize.
    #[error("{0}")]
    Unknown(#[source] Cause),
}

impl OperationError {
    /// Wrap an arbitrary error as [`OperationError::Unknown`].
    pub fn wrap(cause: impl StdError + Send + Sync + 'static) -> Self {
        Self::Unknown(Arc::new(cause))
    }

    /// Create an [`OperationError::Unknown`] from a plain message.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::wrap(Message(message.into()))
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Classify an I/O error with path context.
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref();
        match classify_io(&source, path) {
            Some(err) => err,
            None => Self::wrap(source),
        }
    }

    /// Check if this is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The path this error refers to, if it names one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::DestinationExists(path)
            | Self::SourceNotFound(path)
            | Self::PermissionDenied(path) => Some(path),
            _ => None,
        }
    }
}

/// Plain-text cause for errors that originate inside the engine.
#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

/// Map a raw failure onto the [`OperationError`] taxonomy.
///
/// Errors that already are an `OperationError` pass through unchanged.
/// Otherwise the error and its source chain are searched for an
/// [`io::Error`] whose kind identifies the failure; unrecognized errors
/// become [`OperationError::Unknown`] carrying the original error.
pub fn classify(raw: RawError, path: &Path) -> OperationError {
    let raw = match raw.downcast::<OperationError>() {
        Ok(err) => return *err,
        Err(raw) => raw,
    };

    let mut current = Some(raw.as_ref() as &(dyn StdError + 'static));
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if let Some(inner) = io_err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<OperationError>())
            {
                return inner.clone();
            }
            if let Some(mapped) = classify_io(io_err, path) {
                return mapped;
            }
        }
        current = err.source();
    }

    OperationError::Unknown(Arc::from(raw))
}

fn classify_io(err: &io::Error, path: &Path) -> Option<OperationError> {
    match err.kind() {
        io::ErrorKind::NotFound => Some(OperationError::SourceNotFound(path.to_path_buf())),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            Some(OperationError::PermissionDenied(path.to_path_buf()))
        }
        io::ErrorKind::AlreadyExists => {
            Some(OperationError::DestinationExists(path.to_path_buf()))
        }
        io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => {
            Some(OperationError::DiskFull)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_io_kinds() {
        let path = Path::new("/test/path");

        let err = classify(
            Box::new(io::Error::new(io::ErrorKind::NotFound, "gone")),
            path,
        );
        assert!(matches!(err, OperationError::SourceNotFound(p) if p == path));

        let err = classify(
            Box::new(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            path,
        );
        assert!(matches!(err, OperationError::PermissionDenied(_)));

        let err = classify(
            Box::new(io::Error::new(io::ErrorKind::StorageFull, "full")),
            path,
        );
        assert!(matches!(err, OperationError::DiskFull));
    }

    #[test]
    fn test_classify_passes_through_operation_errors() {
        let original = OperationError::DestinationExists(PathBuf::from("/a"));
        let err = classify(Box::new(original), Path::new("/other"));
        assert!(matches!(err, OperationError::DestinationExists(p) if p == Path::new("/a")));

        let wrapped = io::Error::other(OperationError::Cancelled);
        let err = classify(Box::new(wrapped), Path::new("/other"));
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_classify_unknown_keeps_cause() {
        let err = classify(
            Box::new(io::Error::new(io::ErrorKind::InvalidData, "corrupt header")),
            Path::new("/x"),
        );
        match &err {
            OperationError::Unknown(cause) => {
                assert!(cause.downcast_ref::<io::Error>().is_some());
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "corrupt header");
    }

    #[test]
    fn test_partial_failure_message() {
        let err = OperationError::PartialFailure {
            succeeded: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            failed: vec![(
                PathBuf::from("/c"),
                OperationError::PermissionDenied(PathBuf::from("/c")),
            )],
        };
        assert_eq!(err.to_string(), "1 of 3 items could not be processed");
    }
}
