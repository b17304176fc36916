//! Turns operation errors into something a user can read.

use std::path::PathBuf;

use serde::Serialize;

use duopane_core::OperationError;

/// A user-facing description of a failed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPresentation {
    /// Short headline.
    pub title: String,
    /// The main message.
    pub message: String,
    /// What the user can do about it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
    /// One line per failed item, `"<path>: <reason>"`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    /// The items that failed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_paths: Vec<PathBuf>,
}

impl ErrorPresentation {
    fn simple(title: &str, message: String) -> Self {
        Self {
            title: title.to_string(),
            message,
            guidance: None,
            details: Vec::new(),
            failed_paths: Vec::new(),
        }
    }
}

impl std::fmt::Display for ErrorPresentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)?;
        if let Some(guidance) = &self.guidance {
            write!(f, "\n{guidance}")?;
        }
        for line in &self.details {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

/// Describe `error` for the user.
///
/// Returns `None` for cancellation, which the user asked for and is not
/// reported.
pub fn present_error(error: &OperationError) -> Option<ErrorPresentation> {
    let presentation = match error {
        OperationError::Cancelled => return None,
        OperationError::PartialFailure { failed, .. } => ErrorPresentation {
            title: "Some items failed".to_string(),
            message: error.to_string(),
            guidance: None,
            details: failed
                .iter()
                .map(|(path, reason)| format!("{}: {}", path.display(), reason))
                .collect(),
            failed_paths: failed.iter().map(|(path, _)| path.clone()).collect(),
        },
        OperationError::PermissionDenied(path) => ErrorPresentation {
            guidance: Some(
                "Check that you have access to this location, or grant access to it and try again."
                    .to_string(),
            ),
            failed_paths: vec![path.clone()],
            ..ErrorPresentation::simple("Permission denied", error.to_string())
        },
        OperationError::InvalidName { .. } => {
            ErrorPresentation::simple("Invalid name", error.to_string())
        }
        _ => ErrorPresentation::simple("Operation failed", error.to_string()),
    };
    Some(presentation)
}
