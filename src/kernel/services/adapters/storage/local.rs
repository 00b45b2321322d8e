//! 本地文件系统 Provider
//!
//! Handles address a path on disk. Unlike the in-memory storage, a local
//! handle does not follow its entry when something else moves it.

use crate::kernel::services::ports::{
    HandleKind, PermissionMode, PermissionState, StorageError, StorageHandle, StorageResult,
    WritableStream,
};
use async_trait::async_trait;
use compact_str::CompactString;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LocalHandle {
    path: PathBuf,
    name: CompactString,
    kind: HandleKind,
}

impl LocalHandle {
    /// Opens a directory on disk as a workspace root.
    pub async fn open_dir(root_path: &Path) -> StorageResult<Self> {
        let absolute_root = tokio::fs::canonicalize(root_path)
            .await
            .unwrap_or_else(|_| root_path.to_path_buf());
        let metadata = tokio::fs::metadata(&absolute_root)
            .await
            .map_err(|e| map_io(e, &absolute_root))?;
        if !metadata.is_dir() {
            return Err(StorageError::TypeMismatch(absolute_root.display().to_string()));
        }

        let name = absolute_root
            .file_name()
            .or_else(|| absolute_root.iter().next_back())
            .unwrap_or(absolute_root.as_os_str())
            .to_string_lossy()
            .into();
        Ok(Self {
            path: absolute_root,
            name,
            kind: HandleKind::Directory,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn child_path(&self, name: &str) -> StorageResult<PathBuf> {
        if self.kind != HandleKind::Directory {
            return Err(StorageError::TypeMismatch(self.name.to_string()));
        }
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(StorageError::Io(format!("invalid entry name: {:?}", name)));
        }
        Ok(self.path.join(name))
    }

    fn child(&self, path: PathBuf, name: &str, kind: HandleKind) -> Self {
        Self {
            path,
            name: CompactString::from(name),
            kind,
        }
    }

    async fn get_child(&self, name: &str, kind: HandleKind, create: bool) -> StorageResult<Self> {
        let path = self.child_path(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => {
                let actual = if metadata.is_dir() {
                    HandleKind::Directory
                } else {
                    HandleKind::File
                };
                if actual != kind {
                    return Err(StorageError::TypeMismatch(name.to_string()));
                }
                Ok(self.child(path, name, kind))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && create => {
                let created = match kind {
                    HandleKind::Directory => tokio::fs::create_dir(&path).await,
                    HandleKind::File => tokio::fs::OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(false)
                        .open(&path)
                        .await
                        .map(drop),
                };
                created.map_err(|e| map_io(e, &path))?;
                Ok(self.child(path, name, kind))
            }
            Err(e) => Err(map_io(e, &path)),
        }
    }

    async fn permission(&self, mode: PermissionMode) -> PermissionState {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) if mode == PermissionMode::ReadWrite && metadata.permissions().readonly() => {
                PermissionState::Denied
            }
            Ok(_) => PermissionState::Granted,
            Err(_) => PermissionState::Denied,
        }
    }
}

fn map_io(err: io::Error, path: &Path) -> StorageError {
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
        io::ErrorKind::PermissionDenied => {
            StorageError::PermissionDenied(path.display().to_string())
        }
        _ => StorageError::Io(format!("{}: {}", path.display(), err)),
    }
}

#[async_trait]
impl StorageHandle for LocalHandle {
    type Writable = LocalWritable;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> HandleKind {
        self.kind
    }

    async fn get_directory_handle(&self, name: &str, create: bool) -> StorageResult<Self> {
        self.get_child(name, HandleKind::Directory, create).await
    }

    async fn get_file_handle(&self, name: &str, create: bool) -> StorageResult<Self> {
        self.get_child(name, HandleKind::File, create).await
    }

    async fn remove_entry(&self, name: &str, recursive: bool) -> StorageResult<()> {
        let path = self.child_path(name)?;
        let metadata = tokio::fs::symlink_metadata(&path)
            .await
            .map_err(|e| map_io(e, &path))?;
        let removed = if metadata.is_dir() {
            if recursive {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_dir(&path).await
            }
        } else {
            tokio::fs::remove_file(&path).await
        };
        removed.map_err(|e| map_io(e, &path))
    }

    async fn entries(&self) -> StorageResult<Vec<Self>> {
        if self.kind != HandleKind::Directory {
            return Err(StorageError::TypeMismatch(self.name.to_string()));
        }
        let mut read_dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| map_io(e, &self.path))?;

        let mut result = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| map_io(e, &self.path))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            let kind = if file_type.is_dir() {
                HandleKind::Directory
            } else {
                HandleKind::File
            };
            result.push(self.child(entry.path(), &name, kind));
        }
        Ok(result)
    }

    async fn read_text(&self) -> StorageResult<String> {
        if self.kind != HandleKind::File {
            return Err(StorageError::TypeMismatch(self.name.to_string()));
        }
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| map_io(e, &self.path))
    }

    async fn create_writable(&self) -> StorageResult<LocalWritable> {
        if self.kind != HandleKind::File {
            return Err(StorageError::TypeMismatch(self.name.to_string()));
        }
        Ok(LocalWritable {
            path: self.path.clone(),
            buffer: String::new(),
            closed: false,
        })
    }

    async fn query_permission(&self, mode: PermissionMode) -> PermissionState {
        self.permission(mode).await
    }

    async fn request_permission(&self, mode: PermissionMode) -> PermissionState {
        self.permission(mode).await
    }

    fn supports_move(&self) -> bool {
        true
    }

    async fn move_to(&self, new_parent: &Self, new_name: &str) -> StorageResult<()> {
        let target = new_parent.child_path(new_name)?;
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::Io(format!("{} already exists", target.display())));
        }
        tokio::fs::rename(&self.path, &target)
            .await
            .map_err(|e| map_io(e, &self.path))
    }
}

pub struct LocalWritable {
    path: PathBuf,
    buffer: String,
    closed: bool,
}

#[async_trait]
impl WritableStream for LocalWritable {
    async fn write(&mut self, text: &str) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::Io(format!("{} is closed", self.path.display())));
        }
        self.buffer.push_str(text);
        Ok(())
    }

    async fn close(&mut self) -> StorageResult<()> {
        if self.closed {
            return Ok(());
        }
        tokio::fs::write(&self.path, self.buffer.as_bytes())
            .await
            .map_err(|e| map_io(e, &self.path))?;
        self.buffer.clear();
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/storage/local.rs"]
mod tests;
