//! Tree mutation engine.
//!
//! Each operation runs validate -> preflight -> storage mutation ->
//! reconcile to completion before returning. Reconcile re-reads exactly the
//! parent directory of the changed entry, never the whole tree.

use super::error::{validate_name, Result, WorkspaceError};
use super::resolver;
use super::workspace::Workspace;
use crate::kernel::services::ports::{
    HandleKind, Prompter, RenamePolicy, StorageError, StorageHandle, StorageResult,
};
use crate::models::{path, FreshEntry, NodeKind};

impl<H: StorageHandle> Workspace<H> {
    pub async fn create(&mut self, kind: NodeKind, name: &str, parent_path: &str) -> Result<String> {
        validate_name(name)?;
        let parent_path = path::normalize(parent_path);
        let parent = self
            .tree
            .node_by_path(&parent_path)
            .ok_or_else(|| WorkspaceError::NotFound(parent_path.clone()))?;
        if !parent.is_dir() {
            return Err(WorkspaceError::KindMismatch(parent_path));
        }
        self.ensure_writable().await?;

        let new_path = path::join(&parent_path, name);
        let created: StorageResult<()> = {
            let parent = resolver::resolve_dir(&self.tree, &parent_path).await?;
            preflight_absent(&*parent, name, &new_path).await?;
            match kind {
                NodeKind::File => parent.get_file_handle(name, true).await.map(drop),
                NodeKind::Dir => parent.get_directory_handle(name, true).await.map(drop),
            }
        };
        if let Err(err) = created {
            self.reconcile_best_effort(&parent_path).await;
            return Err(err.into());
        }

        self.refresh(&parent_path).await?;
        tracing::info!(path = %new_path, ?kind, "created");
        Ok(new_path)
    }

    pub async fn create_with_prompt(
        &mut self,
        kind: NodeKind,
        parent_path: &str,
        prompter: &dyn Prompter,
    ) -> Result<String> {
        let title = match kind {
            NodeKind::File => "New file name",
            NodeKind::Dir => "New folder name",
        };
        let name = prompter
            .prompt_name(title, "")
            .await
            .ok_or(WorkspaceError::Aborted)?;
        self.create(kind, name.trim(), parent_path).await
    }

    /// Renames the entry at `old_path` within its parent and returns the new
    /// path. Descendant paths and the active selection follow the rename.
    pub async fn rename(&mut self, old_path: &str, new_name: &str) -> Result<String> {
        let old_path = path::normalize(old_path);
        let (parent_path, old_name) = self.split_non_root(&old_path)?;
        validate_name(new_name)?;
        let node_id = self
            .tree
            .find_by_path(&old_path)
            .ok_or_else(|| WorkspaceError::NotFound(old_path.clone()))?;
        let kind = self
            .tree
            .get(node_id)
            .map(|node| node.kind())
            .ok_or_else(|| WorkspaceError::NotFound(old_path.clone()))?;

        if old_name == new_name {
            return Ok(old_path);
        }
        let new_path = path::join(&parent_path, new_name);

        if self.config.rename_policy == RenamePolicy::Strict
            && !self.tree.root_handle().supports_move()
        {
            return Err(WorkspaceError::DegradedRename {
                from: old_path,
                to: new_path,
            });
        }
        self.ensure_writable().await?;

        let moved: StorageResult<()> = {
            let parent = resolver::resolve_dir(&self.tree, &parent_path).await?;
            preflight_absent(&*parent, new_name, &new_path).await?;
            let target = resolver::resolve(&self.tree, &old_path, kind.into()).await?;
            target.move_to(&parent, new_name).await
        };

        match moved {
            Ok(()) => {
                match self.tree.rename(node_id, new_name) {
                    Ok(_) => {
                        if let Some(selection) = self.selection.as_mut() {
                            selection.rebase(&old_path, &new_path);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(from = %old_path, to = %new_path, error = %err, "tree out of sync after move");
                    }
                }
                self.refresh(&parent_path).await?;
                tracing::info!(from = %old_path, to = %new_path, "renamed");
                Ok(new_path)
            }
            Err(StorageError::PermissionDenied(name)) => {
                self.reconcile_best_effort(&parent_path).await;
                Err(WorkspaceError::PermissionDenied(name))
            }
            Err(err) => {
                tracing::warn!(from = %old_path, to = %new_path, error = %err, "rename degraded");
                self.reconcile_best_effort(&parent_path).await;
                Err(WorkspaceError::DegradedRename {
                    from: old_path,
                    to: new_path,
                })
            }
        }
    }

    pub async fn rename_with_prompt(
        &mut self,
        old_path: &str,
        prompter: &dyn Prompter,
    ) -> Result<String> {
        let old_path = path::normalize(old_path);
        if old_path == self.tree.root_name() {
            return Err(WorkspaceError::RootProtected);
        }
        let name = prompter
            .prompt_name("Rename to", path::file_name(&old_path))
            .await
            .ok_or(WorkspaceError::Aborted)?;
        self.rename(&old_path, name.trim()).await
    }

    /// Deletes the entry at `target` (recursively for directories) once the
    /// user confirms. Clears the active selection when it lived there.
    pub async fn delete(&mut self, target: &str, prompter: &dyn Prompter) -> Result<()> {
        let target = path::normalize(target);
        let (parent_path, name) = self.split_non_root(&target)?;
        let kind = self
            .tree
            .node_by_path(&target)
            .map(|node| node.kind())
            .ok_or_else(|| WorkspaceError::NotFound(target.clone()))?;

        if !prompter.confirm(&format!("Delete {}?", target)).await {
            tracing::info!(path = %target, "delete cancelled");
            return Err(WorkspaceError::Aborted);
        }
        self.ensure_writable().await?;

        let removed: StorageResult<()> = {
            let parent = resolver::resolve_dir(&self.tree, &parent_path).await?;
            parent.remove_entry(&name, kind == NodeKind::Dir).await
        };
        if let Err(err) = removed {
            self.reconcile_best_effort(&parent_path).await;
            return Err(err.into());
        }

        if self
            .selection
            .as_ref()
            .is_some_and(|selection| selection.is_within(&target))
        {
            self.selection = None;
        }
        self.refresh(&parent_path).await?;
        tracing::info!(path = %target, ?kind, "deleted");
        Ok(())
    }

    /// Re-reads one directory's immediate children from storage.
    pub async fn refresh(&mut self, dir_path: &str) -> Result<()> {
        let dir_path = path::normalize(dir_path);
        let dir_id = self
            .tree
            .find_by_path(&dir_path)
            .ok_or_else(|| WorkspaceError::NotFound(dir_path.clone()))?;
        if !self.tree.get(dir_id).is_some_and(|node| node.is_dir()) {
            return Err(WorkspaceError::KindMismatch(dir_path));
        }

        let handles = {
            let dir = resolver::resolve_dir(&self.tree, &dir_path).await?;
            dir.entries().await?
        };
        let fresh: Vec<FreshEntry<H>> = handles
            .into_iter()
            .filter(|handle| !self.config.is_ignored(handle.name()))
            .map(|handle| FreshEntry {
                name: handle.name().into(),
                kind: handle.kind().into(),
                handle,
            })
            .collect();
        let count = fresh.len();
        self.tree.replace_children(dir_id, fresh)?;

        tracing::debug!(path = %dir_path, entries = count, "refreshed");
        Ok(())
    }

    /// Parent path and name of a normalized non-root path. The root itself
    /// (or an empty path) is protected; anything outside the root is unknown.
    fn split_non_root(&self, target: &str) -> Result<(String, String)> {
        if target.is_empty() || target == self.tree.root_name() {
            return Err(WorkspaceError::RootProtected);
        }
        match path::split_parent(target) {
            (Some(parent), name) => Ok((parent.to_string(), name.to_string())),
            (None, _) => Err(WorkspaceError::NotFound(target.to_string())),
        }
    }

    /// Used after a failed storage mutation so the tree keeps matching
    /// whatever storage now reports.
    pub(super) async fn reconcile_best_effort(&mut self, dir_path: &str) {
        if let Err(err) = self.refresh(dir_path).await {
            tracing::warn!(path = %dir_path, error = %err, "reconcile failed");
        }
    }
}

/// Fails with `AlreadyExists` when `parent` already holds an entry called
/// `name`, of either kind.
async fn preflight_absent<H: StorageHandle>(parent: &H, name: &str, full_path: &str) -> Result<()> {
    for kind in [HandleKind::File, HandleKind::Directory] {
        let probe = match kind {
            HandleKind::File => parent.get_file_handle(name, false).await.map(drop),
            HandleKind::Directory => parent.get_directory_handle(name, false).await.map(drop),
        };
        match probe {
            Ok(()) | Err(StorageError::TypeMismatch(_)) => {
                return Err(WorkspaceError::AlreadyExists(full_path.to_string()));
            }
            Err(StorageError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/mutation.rs"]
mod tests;
