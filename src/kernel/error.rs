//! 工作区错误类型
//!
//! One error enum for every workspace operation, plus name validation.

use crate::kernel::services::ports::StorageError;
use crate::models::TreeError;
use std::fmt;

pub type Result<T> = std::result::Result<T, WorkspaceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    /// Empty, contains a separator, or is `.`/`..`.
    InvalidName(String),
    AlreadyExists(String),
    NotFound(String),
    /// The entry exists but is a file where a directory was needed, or the
    /// other way round.
    KindMismatch(String),
    PermissionDenied(String),
    /// The user cancelled a prompt; nothing was changed.
    Aborted,
    StorageFailure(String),
    /// No atomic move was available; the parent was re-read but the old
    /// entry may still be in place.
    DegradedRename { from: String, to: String },
    /// Rename and delete are never allowed on the workspace root.
    RootProtected,
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceError::InvalidName(name) => write!(f, "Invalid name: {:?}", name),
            WorkspaceError::AlreadyExists(path) => write!(f, "Already exists: {}", path),
            WorkspaceError::NotFound(path) => write!(f, "Not found: {}", path),
            WorkspaceError::KindMismatch(path) => write!(f, "Wrong entry kind: {}", path),
            WorkspaceError::PermissionDenied(path) => write!(f, "Permission denied: {}", path),
            WorkspaceError::Aborted => write!(f, "Aborted"),
            WorkspaceError::StorageFailure(msg) => write!(f, "Storage failure: {}", msg),
            WorkspaceError::DegradedRename { from, to } => {
                write!(f, "Rename {} -> {} degraded: no atomic move", from, to)
            }
            WorkspaceError::RootProtected => write!(f, "The workspace root cannot be changed"),
        }
    }
}

impl std::error::Error for WorkspaceError {}

impl From<StorageError> for WorkspaceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(name) => WorkspaceError::NotFound(name),
            StorageError::TypeMismatch(name) => WorkspaceError::KindMismatch(name),
            StorageError::PermissionDenied(name) => WorkspaceError::PermissionDenied(name),
            StorageError::Unsupported(op) => {
                WorkspaceError::StorageFailure(format!("unsupported operation: {op}"))
            }
            StorageError::Io(msg) => WorkspaceError::StorageFailure(msg),
        }
    }
}

impl From<TreeError> for WorkspaceError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::RootProtected => WorkspaceError::RootProtected,
            TreeError::NameExists => WorkspaceError::AlreadyExists(e.to_string()),
            TreeError::ParentNotDirectory => WorkspaceError::KindMismatch(e.to_string()),
            TreeError::InvalidNodeId => WorkspaceError::NotFound(e.to_string()),
        }
    }
}

/// Rejects names that cannot be a single path segment.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == ".."
    {
        return Err(WorkspaceError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/error.rs"]
mod tests;
