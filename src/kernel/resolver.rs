//! Maps a logical workspace path to a live storage handle.
//!
//! The walk goes through the storage capability one segment at a time,
//! starting at the root handle. When a segment cannot be fetched, the walk
//! falls back to the directory node with the same accumulated path in the
//! tree and resumes from the handle that node owns. That fallback is best
//! effort: after an incomplete reconcile it can resume from a stale entry.

use super::error::{Result, WorkspaceError};
use crate::kernel::services::ports::{HandleKind, StorageError, StorageHandle};
use crate::models::{path, NodeKind, WorkspaceTree};
use std::ops::Deref;

/// A handle borrowed from the tree node that owns it, or one freshly
/// obtained from storage during the walk.
pub enum ResolvedHandle<'a, H> {
    Tree(&'a H),
    Fresh(H),
}

impl<H> Deref for ResolvedHandle<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        match self {
            ResolvedHandle::Tree(handle) => handle,
            ResolvedHandle::Fresh(handle) => handle,
        }
    }
}

impl From<HandleKind> for NodeKind {
    fn from(kind: HandleKind) -> Self {
        match kind {
            HandleKind::File => NodeKind::File,
            HandleKind::Directory => NodeKind::Dir,
        }
    }
}

impl From<NodeKind> for HandleKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::File => HandleKind::File,
            NodeKind::Dir => HandleKind::Directory,
        }
    }
}

pub async fn resolve<'a, H: StorageHandle>(
    tree: &'a WorkspaceTree<H>,
    target: &str,
    kind: HandleKind,
) -> Result<ResolvedHandle<'a, H>> {
    let target = path::normalize(target);
    let segments = path::relative_segments(&target, tree.root_name())
        .ok_or_else(|| WorkspaceError::NotFound(target.clone()))?;

    if segments.is_empty() {
        return match kind {
            HandleKind::Directory => Ok(ResolvedHandle::Tree(tree.root_handle())),
            HandleKind::File => Err(WorkspaceError::KindMismatch(target.clone())),
        };
    }

    let mut current = ResolvedHandle::Tree(tree.root_handle());
    let mut prefix = tree.root_name().to_string();
    let last = segments.len() - 1;

    for (i, segment) in segments.iter().enumerate() {
        prefix = path::join(&prefix, segment);
        let want = if i == last { kind } else { HandleKind::Directory };

        let fetched = match want {
            HandleKind::Directory => current.get_directory_handle(segment, false).await,
            HandleKind::File => current.get_file_handle(segment, false).await,
        };

        current = match fetched {
            Ok(handle) => ResolvedHandle::Fresh(handle),
            Err(StorageError::PermissionDenied(name)) => {
                return Err(WorkspaceError::PermissionDenied(name));
            }
            Err(err) => match tree_fallback(tree, &prefix, want) {
                Some(handle) => {
                    tracing::debug!(path = %prefix, error = %err, "resolver fell back to tree handle");
                    ResolvedHandle::Tree(handle)
                }
                None => {
                    if i == last && matches!(err, StorageError::TypeMismatch(_)) {
                        return Err(WorkspaceError::KindMismatch(target.clone()));
                    }
                    return Err(WorkspaceError::NotFound(target.clone()));
                }
            },
        };
    }

    Ok(current)
}

fn tree_fallback<'a, H>(tree: &'a WorkspaceTree<H>, prefix: &str, want: HandleKind) -> Option<&'a H> {
    if want != HandleKind::Directory {
        return None;
    }
    let node = tree.node_by_path(prefix)?;
    node.is_dir().then(|| node.handle())
}

pub async fn resolve_dir<'a, H: StorageHandle>(
    tree: &'a WorkspaceTree<H>,
    target: &str,
) -> Result<ResolvedHandle<'a, H>> {
    resolve(tree, target, HandleKind::Directory).await
}

pub async fn resolve_file<'a, H: StorageHandle>(
    tree: &'a WorkspaceTree<H>,
    target: &str,
) -> Result<ResolvedHandle<'a, H>> {
    resolve(tree, target, HandleKind::File).await
}

/// Walks `target` creating every missing directory on the way. Only
/// permission or storage failures make this fail.
pub async fn resolve_dir_creating<'a, H: StorageHandle>(
    tree: &'a WorkspaceTree<H>,
    target: &str,
) -> Result<ResolvedHandle<'a, H>> {
    let target = path::normalize(target);
    let segments = path::relative_segments(&target, tree.root_name())
        .ok_or_else(|| WorkspaceError::NotFound(target.clone()))?;

    let mut current = ResolvedHandle::Tree(tree.root_handle());
    for segment in segments {
        let handle = current
            .get_directory_handle(segment, true)
            .await
            .map_err(|err| match err {
                StorageError::PermissionDenied(name) => WorkspaceError::PermissionDenied(name),
                StorageError::TypeMismatch(_) => WorkspaceError::KindMismatch(target.clone()),
                other => WorkspaceError::StorageFailure(other.to_string()),
            })?;
        current = ResolvedHandle::Fresh(handle);
    }
    Ok(current)
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/resolver.rs"]
mod tests;
