//! The workspace context: one opened root, its tree and the active file.
//!
//! Every core operation goes through a `Workspace` value instead of global
//! state, so independent workspaces can live side by side.

use super::error::{Result, WorkspaceError};
use super::resolver;
use crate::kernel::services::ports::{
    write_text, HandleKind, PermissionMode, PermissionState, StorageHandle, WorkspaceConfig,
};
use crate::models::{path, ActiveSelection, LoadState, NodeKind, WorkspaceTree};

pub struct Workspace<H: StorageHandle> {
    pub(super) tree: WorkspaceTree<H>,
    pub(super) selection: Option<ActiveSelection>,
    pub(super) config: WorkspaceConfig,
}

impl<H: StorageHandle> Workspace<H> {
    /// Opens `root` once read/write access is granted and loads its
    /// immediate children.
    pub async fn open(root: H, config: WorkspaceConfig) -> Result<Self> {
        if root.kind() != HandleKind::Directory {
            return Err(WorkspaceError::KindMismatch(root.name().to_string()));
        }
        ensure_permission(&root).await?;

        let root_name = root.name().to_string();
        let mut workspace = Self {
            tree: WorkspaceTree::new(root_name.as_str(), root),
            selection: None,
            config,
        };
        workspace.refresh(&root_name).await?;

        tracing::info!(root = %root_name, entries = workspace.tree.len() - 1, "workspace opened");
        Ok(workspace)
    }

    /// Tears the workspace down and hands back the root handle.
    pub fn close(self) -> Option<H> {
        tracing::info!(root = %self.tree.root_name(), "workspace closed");
        self.tree.into_root_handle()
    }

    pub fn root_name(&self) -> &str {
        self.tree.root_name()
    }

    pub fn tree(&self) -> &WorkspaceTree<H> {
        &self.tree
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<&ActiveSelection> {
        self.selection.as_ref()
    }

    pub fn selection_mut(&mut self) -> Option<&mut ActiveSelection> {
        self.selection.as_mut()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub(super) async fn ensure_writable(&self) -> Result<()> {
        ensure_permission(self.tree.root_handle()).await
    }

    /// Loads a directory's children the first time it is expanded.
    pub async fn load_directory(&mut self, dir_path: &str) -> Result<()> {
        let dir_path = path::normalize(dir_path);
        let node = self
            .tree
            .node_by_path(&dir_path)
            .ok_or_else(|| WorkspaceError::NotFound(dir_path.clone()))?;
        if !node.is_dir() {
            return Err(WorkspaceError::KindMismatch(dir_path));
        }
        if node.load_state() == LoadState::Loaded {
            return Ok(());
        }
        self.refresh(&dir_path).await
    }

    /// File content, read from storage only when the node has none cached.
    pub async fn read_file(&mut self, file_path: &str) -> Result<String> {
        let file_path = path::normalize(file_path);
        let node_id = self.tree.find_by_path(&file_path);
        if let Some(node) = node_id.and_then(|id| self.tree.get(id)) {
            if node.kind() != NodeKind::File {
                return Err(WorkspaceError::KindMismatch(file_path));
            }
            if let Some(content) = node.content() {
                return Ok(content.to_string());
            }
        }

        let content = {
            let handle = resolver::resolve_file(&self.tree, &file_path).await?;
            handle.read_text().await?
        };
        if let Some(id) = node_id {
            self.tree.set_content(id, Some(content.clone()));
        }
        Ok(content)
    }

    /// Opens a file in the editor, replacing any previous selection.
    pub async fn select(&mut self, file_path: &str) -> Result<()> {
        let file_path = path::normalize(file_path);
        if self.tree.find_by_path(&file_path).is_none() {
            return Err(WorkspaceError::NotFound(file_path));
        }
        let content = self.read_file(&file_path).await?;
        self.selection = Some(ActiveSelection::new(file_path, &content));
        Ok(())
    }

    /// Persists the active buffer.
    pub async fn save(&mut self) -> Result<()> {
        let (file_path, text) = match &self.selection {
            Some(selection) => (selection.path().to_string(), selection.text()),
            None => return Err(WorkspaceError::NotFound("no active file".to_string())),
        };
        self.ensure_writable().await?;

        {
            let handle = resolver::resolve_file(&self.tree, &file_path).await?;
            write_text(&*handle, &text).await?;
        }

        if let Some(id) = self.tree.find_by_path(&file_path) {
            self.tree.set_content(id, Some(text));
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.mark_saved();
        }
        tracing::info!(path = %file_path, "saved");
        Ok(())
    }
}

async fn ensure_permission<H: StorageHandle>(handle: &H) -> Result<()> {
    if handle.query_permission(PermissionMode::ReadWrite).await == PermissionState::Granted {
        return Ok(());
    }
    match handle.request_permission(PermissionMode::ReadWrite).await {
        PermissionState::Granted => Ok(()),
        state => {
            tracing::warn!(root = %handle.name(), ?state, "read/write permission not granted");
            Err(WorkspaceError::PermissionDenied(handle.name().to_string()))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/workspace.rs"]
mod tests;
