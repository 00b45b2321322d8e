//! Service ports: traits + data contracts.

pub mod config;
pub mod prompt;
pub mod storage;

pub use config::{RenamePolicy, WorkspaceConfig};
pub use prompt::Prompter;
pub use storage::{
    write_text, HandleKind, PermissionMode, PermissionState, StorageError, StorageHandle,
    StorageResult, WritableStream,
};
