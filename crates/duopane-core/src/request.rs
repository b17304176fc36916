//! File operation request types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A batch operation submitted to the engine.
///
/// A request is immutable once submitted. The engine shares it with
/// progress observers, so it is usually held behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationRequest {
    /// Copy files/directories into a destination directory.
    Copy {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    /// Move files/directories into a destination directory.
    Move {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    /// Move files/directories to the trash.
    Delete { items: Vec<PathBuf> },
    /// Remove files/directories without going through the trash.
    DeleteImmediately { items: Vec<PathBuf> },
    /// Rename a single file or directory in place.
    Rename { item: PathBuf, new_name: String },
    /// Copy each item next to itself under a "copy" name.
    Duplicate { items: Vec<PathBuf> },
    /// Create a new directory.
    CreateFolder { directory: PathBuf, name: String },
    /// Create a new empty file.
    CreateFile { directory: PathBuf, name: String },
}

impl OperationRequest {
    /// Create a copy request.
    pub fn copy(sources: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::Copy {
            sources,
            destination: destination.into(),
        }
    }

    /// Create a move request.
    pub fn move_to(sources: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::Move {
            sources,
            destination: destination.into(),
        }
    }

    /// Create a move-to-trash request.
    pub fn delete(items: Vec<PathBuf>) -> Self {
        Self::Delete { items }
    }

    /// Create a permanent deletion request.
    pub fn delete_immediately(items: Vec<PathBuf>) -> Self {
        Self::DeleteImmediately { items }
    }

    /// Create a rename request.
    pub fn rename(item: impl Into<PathBuf>, new_name: impl Into<String>) -> Self {
        Self::Rename {
            item: item.into(),
            new_name: new_name.into(),
        }
    }

    /// Create a duplicate request.
    pub fn duplicate(items: Vec<PathBuf>) -> Self {
        Self::Duplicate { items }
    }

    /// Create a directory creation request.
    pub fn create_folder(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::CreateFolder {
            directory: directory.into(),
            name: name.into(),
        }
    }

    /// Create a file creation request.
    pub fn create_file(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::CreateFile {
            directory: directory.into(),
            name: name.into(),
        }
    }

    /// The kind of this request.
    pub fn operation_type(&self) -> OperationType {
        match self {
            Self::Copy { .. } => OperationType::Copy,
            Self::Move { .. } => OperationType::Move,
            Self::Delete { .. } => OperationType::Delete,
            Self::DeleteImmediately { .. } => OperationType::DeleteImmediately,
            Self::Rename { .. } => OperationType::Rename,
            Self::Duplicate { .. } => OperationType::Duplicate,
            Self::CreateFolder { .. } => OperationType::CreateFolder,
            Self::CreateFile { .. } => OperationType::CreateFile,
        }
    }

    /// The items this request acts on, one per batch step.
    ///
    /// Single-item requests report their one item; create requests report
    /// the directory the new entry goes into.
    pub fn items(&self) -> &[PathBuf] {
        match self {
            Self::Copy { sources, .. } | Self::Move { sources, .. } => sources,
            Self::Delete { items }
            | Self::DeleteImmediately { items }
            | Self::Duplicate { items } => items,
            Self::Rename { item, .. } => std::slice::from_ref(item),
            Self::CreateFolder { directory, .. } | Self::CreateFile { directory, .. } => {
                std::slice::from_ref(directory)
            }
        }
    }

    /// Number of batch steps this request takes.
    pub fn item_count(&self) -> usize {
        self.items().len()
    }

    /// Whether failures are tracked per item rather than as one error.
    pub fn is_per_item(&self) -> bool {
        self.operation_type().is_per_item()
    }
}

/// The type of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Copy,
    Move,
    Delete,
    DeleteImmediately,
    Rename,
    Duplicate,
    CreateFolder,
    CreateFile,
}

impl OperationType {
    /// Whether this kind of batch records failures per item.
    pub fn is_per_item(&self) -> bool {
        !matches!(self, Self::Rename | Self::CreateFolder | Self::CreateFile)
    }

    /// Past-tense verb used in summaries.
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Copy => "Copied",
            Self::Move => "Moved",
            Self::Delete => "Moved to Trash",
            Self::DeleteImmediately => "Deleted",
            Self::Rename => "Renamed",
            Self::Duplicate => "Duplicated",
            Self::CreateFolder | Self::CreateFile => "Created",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => write!(f, "Copy"),
            Self::Move => write!(f, "Move"),
            Self::Delete => write!(f, "Move to Trash"),
            Self::DeleteImmediately => write!(f, "Delete"),
            Self::Rename => write!(f, "Rename"),
            Self::Duplicate => write!(f, "Duplicate"),
            Self::CreateFolder => write!(f, "New Folder"),
            Self::CreateFile => write!(f, "New File"),
        }
    }
}
