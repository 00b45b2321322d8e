//! 工作区树数据模型
//!
//! An arena of nodes mirroring the opened directory. Every node owns the
//! storage handle for its entry; nothing else keeps a copy of it.

use super::path;
use compact_str::CompactString;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::{collections::BTreeMap, fmt};

new_key_type! { pub struct NodeId; }

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Dir,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    ParentNotDirectory,
    NameExists,
    InvalidNodeId,
    RootProtected,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::ParentNotDirectory => write!(f, "parent is not a directory"),
            TreeError::NameExists => write!(f, "name already exists in parent"),
            TreeError::InvalidNodeId => write!(f, "invalid node id"),
            TreeError::RootProtected => write!(f, "the workspace root cannot be changed"),
        }
    }
}

impl std::error::Error for TreeError {}

/// One freshly enumerated directory entry, ready to become a node.
pub struct FreshEntry<H> {
    pub name: CompactString,
    pub kind: NodeKind,
    pub handle: H,
}

#[derive(Debug)]
pub struct Node<H> {
    kind: NodeKind,
    name: CompactString,
    path: String,
    parent: Option<NodeId>,
    children: Option<BTreeMap<CompactString, NodeId>>,
    load_state: LoadState,
    content: Option<String>,
    handle: H,
}

impl<H> Node<H> {
    fn new(
        kind: NodeKind,
        name: CompactString,
        path: String,
        parent: Option<NodeId>,
        handle: H,
    ) -> Self {
        let (children, load_state) = match kind {
            NodeKind::File => (None, LoadState::Loaded),
            NodeKind::Dir => (Some(BTreeMap::new()), LoadState::NotLoaded),
        };
        Self {
            kind,
            name,
            path,
            parent,
            children,
            load_state,
            content: None,
            handle,
        }
    }

    /// Stable identity; always equal to the path.
    pub fn id(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// `None` until the file has been read.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }
}

pub struct WorkspaceTree<H> {
    arena: SlotMap<NodeId, Node<H>>,
    root: NodeId,
    id_by_path: FxHashMap<String, NodeId>,
}

impl<H> WorkspaceTree<H> {
    pub fn new(root_name: impl Into<CompactString>, root_handle: H) -> Self {
        let root_name = root_name.into();
        let root_path = root_name.to_string();
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new(
            NodeKind::Dir,
            root_name,
            root_path.clone(),
            None,
            root_handle,
        ));

        let mut id_by_path = FxHashMap::default();
        id_by_path.insert(root_path, root);

        Self {
            arena,
            root,
            id_by_path,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_name(&self) -> &str {
        &self.arena[self.root].name
    }

    pub fn root_handle(&self) -> &H {
        &self.arena[self.root].handle
    }

    /// Hands the root handle back, tearing the tree down.
    pub fn into_root_handle(mut self) -> Option<H> {
        let root = self.root;
        self.arena.remove(root).map(|node| node.handle)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() <= 1
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<H>> {
        self.arena.get(id)
    }

    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        self.id_by_path.get(path).copied()
    }

    pub fn node_by_path(&self, path: &str) -> Option<&Node<H>> {
        self.find_by_path(path).and_then(|id| self.arena.get(id))
    }

    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.arena
            .get(parent)?
            .children
            .as_ref()?
            .get(name)
            .copied()
    }

    /// Directories first, then files; each group in name order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(children) = self.arena.get(id).and_then(|n| n.children.as_ref()) else {
            return Vec::new();
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for &child_id in children.values() {
            match self.arena.get(child_id).map(|c| c.kind) {
                Some(NodeKind::Dir) => dirs.push(child_id),
                Some(NodeKind::File) => files.push(child_id),
                None => {}
            }
        }
        dirs.extend(files);
        dirs
    }

    /// The deepest directory already present in the tree on the way to `path`.
    pub fn deepest_existing_dir(&self, path: &str) -> NodeId {
        let mut current = self.root;
        let Some(segments) = path::relative_segments(path, self.root_name()) else {
            return current;
        };
        for segment in segments {
            match self.child_by_name(current, segment) {
                Some(child) if self.arena[child].kind == NodeKind::Dir => current = child,
                _ => break,
            }
        }
        current
    }

    pub fn set_content(&mut self, id: NodeId, content: Option<String>) {
        if let Some(node) = self.arena.get_mut(id) {
            if node.kind == NodeKind::File {
                node.content = content;
            }
        }
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        name: impl Into<CompactString>,
        kind: NodeKind,
        handle: H,
    ) -> Result<NodeId, TreeError> {
        let name = name.into();
        let child_path = {
            let parent_ro = self.arena.get(parent).ok_or(TreeError::InvalidNodeId)?;
            let children_ro = parent_ro
                .children
                .as_ref()
                .ok_or(TreeError::ParentNotDirectory)?;
            if children_ro.contains_key(&name) {
                return Err(TreeError::NameExists);
            }
            path::join(&parent_ro.path, &name)
        };

        let id = self.arena.insert(Node::new(
            kind,
            name.clone(),
            child_path.clone(),
            Some(parent),
            handle,
        ));
        self.id_by_path.insert(child_path, id);

        let children = self
            .arena
            .get_mut(parent)
            .and_then(|n| n.children.as_mut())
            .ok_or(TreeError::ParentNotDirectory)?;
        children.insert(name, id);

        Ok(id)
    }

    /// Renames a node in place and rewrites the path of every node in its
    /// subtree from the old prefix to the new one.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<String, TreeError> {
        if id == self.root {
            return Err(TreeError::RootProtected);
        }
        let (parent, old_name, old_path) = {
            let node = self.arena.get(id).ok_or(TreeError::InvalidNodeId)?;
            (node.parent, node.name.clone(), node.path.clone())
        };
        let parent = parent.ok_or(TreeError::InvalidNodeId)?;

        if old_name == new_name {
            return Ok(old_path);
        }

        let new_path = {
            let parent_node = self.arena.get_mut(parent).ok_or(TreeError::InvalidNodeId)?;
            let children = parent_node
                .children
                .as_mut()
                .ok_or(TreeError::ParentNotDirectory)?;
            if children.contains_key(new_name) {
                return Err(TreeError::NameExists);
            }
            children.remove(&old_name);
            children.insert(CompactString::from(new_name), id);
            path::join(&parent_node.path, new_name)
        };

        if let Some(node) = self.arena.get_mut(id) {
            node.name = CompactString::from(new_name);
        }
        self.rewrite_subtree_paths(id, &old_path, &new_path);
        Ok(new_path)
    }

    fn rewrite_subtree_paths(&mut self, id: NodeId, old_prefix: &str, new_prefix: &str) {
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let Some(node) = self.arena.get_mut(node_id) else {
                continue;
            };
            if let Some(rebased) = path::rebase(&node.path, old_prefix, new_prefix) {
                let old = std::mem::replace(&mut node.path, rebased.clone());
                if self.id_by_path.get(&old) == Some(&node_id) {
                    self.id_by_path.remove(&old);
                }
                self.id_by_path.insert(rebased, node_id);
            }
            if let Some(children) = &node.children {
                stack.extend(children.values().copied());
            }
        }
    }

    /// Removes a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootProtected);
        }
        let (parent, name) = {
            let node = self.arena.get(id).ok_or(TreeError::InvalidNodeId)?;
            (node.parent, node.name.clone())
        };
        if let Some(children) = parent
            .and_then(|p| self.arena.get_mut(p))
            .and_then(|n| n.children.as_mut())
        {
            children.remove(&name);
        }
        self.recursive_remove(id);
        Ok(())
    }

    fn recursive_remove(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            if let Some(node) = self.arena.remove(node_id) {
                if self.id_by_path.get(&node.path) == Some(&node_id) {
                    self.id_by_path.remove(&node.path);
                }
                if let Some(children) = node.children {
                    stack.extend(children.into_values());
                }
            }
        }
    }

    /// Replaces a directory's children with a fresh snapshot.
    ///
    /// Entries whose path survives get their loaded state carried over onto
    /// the new node: file content is copied across, a loaded directory keeps
    /// its subtree. Entries missing from the snapshot are dropped.
    pub fn replace_children(
        &mut self,
        dir: NodeId,
        fresh: Vec<FreshEntry<H>>,
    ) -> Result<(), TreeError> {
        let (dir_path, old_children) = {
            let node = self.arena.get_mut(dir).ok_or(TreeError::InvalidNodeId)?;
            let children = node.children.as_mut().ok_or(TreeError::ParentNotDirectory)?;
            (node.path.clone(), std::mem::take(children))
        };
        let mut old_children = old_children;
        let mut next_children = BTreeMap::new();

        for entry in fresh {
            if next_children.contains_key(&entry.name) {
                continue;
            }
            let child_path = path::join(&dir_path, &entry.name);
            let mut node = Node::new(
                entry.kind,
                entry.name.clone(),
                child_path.clone(),
                Some(dir),
                entry.handle,
            );

            let previous = old_children
                .remove(&entry.name)
                .and_then(|old_id| self.arena.remove(old_id).map(|old| (old_id, old)));
            let mut adopted = Vec::new();
            if let Some((old_id, old)) = previous {
                if self.id_by_path.get(&old.path) == Some(&old_id) {
                    self.id_by_path.remove(&old.path);
                }
                if old.kind == entry.kind {
                    node.content = old.content;
                    if let Some(grandchildren) = old.children {
                        node.load_state = old.load_state;
                        adopted.extend(grandchildren.values().copied());
                        node.children = Some(grandchildren);
                    }
                } else if let Some(grandchildren) = old.children {
                    for grandchild in grandchildren.into_values() {
                        self.recursive_remove(grandchild);
                    }
                }
            }

            let id = self.arena.insert(node);
            for grandchild in adopted {
                if let Some(g) = self.arena.get_mut(grandchild) {
                    g.parent = Some(id);
                }
            }
            self.id_by_path.insert(child_path, id);
            next_children.insert(entry.name, id);
        }

        for stale in old_children.into_values() {
            self.recursive_remove(stale);
        }

        let node = self.arena.get_mut(dir).ok_or(TreeError::InvalidNodeId)?;
        node.children = Some(next_children);
        node.load_state = LoadState::Loaded;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub depth: u16,
    pub name: CompactString,
    pub path: String,
    pub is_dir: bool,
    pub load_state: LoadState,
}

impl<H> WorkspaceTree<H> {
    /// Depth-first listing of every loaded node below the root.
    pub fn flatten(&self) -> Vec<TreeRow> {
        let mut result = Vec::new();
        let mut stack: Vec<(NodeId, u16)> = self
            .children(self.root)
            .into_iter()
            .rev()
            .map(|id| (id, 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            result.push(TreeRow {
                id,
                depth,
                name: node.name.clone(),
                path: node.path.clone(),
                is_dir: node.kind == NodeKind::Dir,
                load_state: node.load_state,
            });
            for child in self.children(id).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        result
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/workspace_tree.rs"]
mod tests;
