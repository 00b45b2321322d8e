//! Storage capability port.
//!
//! A handle is an opaque reference to one storage entry (a file or a
//! directory). Handles are obtained from their parent directory's handle and
//! are only ever owned by the workspace tree node that mirrors the entry.

use async_trait::async_trait;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandleKind {
    File,
    Directory,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PermissionMode {
    Read,
    ReadWrite,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    NotFound(String),
    /// The entry exists but is of the other kind.
    TypeMismatch(String),
    PermissionDenied(String),
    Unsupported(&'static str),
    Io(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(name) => write!(f, "Not found: {}", name),
            StorageError::TypeMismatch(name) => write!(f, "Type mismatch: {}", name),
            StorageError::PermissionDenied(name) => write!(f, "Permission denied: {}", name),
            StorageError::Unsupported(op) => write!(f, "Unsupported operation: {}", op),
            StorageError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Buffered writer for one file. Nothing is visible in storage until
/// `close` succeeds.
#[async_trait]
pub trait WritableStream: Send {
    async fn write(&mut self, text: &str) -> StorageResult<()>;

    async fn close(&mut self) -> StorageResult<()>;
}

#[async_trait]
pub trait StorageHandle: Send + Sync + Sized + 'static {
    type Writable: WritableStream;

    fn name(&self) -> &str;

    fn kind(&self) -> HandleKind;

    async fn get_directory_handle(&self, name: &str, create: bool) -> StorageResult<Self>;

    async fn get_file_handle(&self, name: &str, create: bool) -> StorageResult<Self>;

    async fn remove_entry(&self, name: &str, recursive: bool) -> StorageResult<()>;

    /// Immediate children, in no particular order.
    async fn entries(&self) -> StorageResult<Vec<Self>>;

    async fn read_text(&self) -> StorageResult<String>;

    async fn create_writable(&self) -> StorageResult<Self::Writable>;

    async fn query_permission(&self, mode: PermissionMode) -> PermissionState;

    async fn request_permission(&self, mode: PermissionMode) -> PermissionState;

    fn supports_move(&self) -> bool {
        false
    }

    /// Atomically moves this entry under `new_parent` as `new_name`.
    async fn move_to(&self, new_parent: &Self, new_name: &str) -> StorageResult<()> {
        let _ = (new_parent, new_name);
        Err(StorageError::Unsupported("move"))
    }
}

pub async fn write_text<H: StorageHandle>(handle: &H, text: &str) -> StorageResult<()> {
    let mut stream = handle.create_writable().await?;
    stream.write(text).await?;
    stream.close().await
}
