//! 内存存储 Provider
//!
//! Keeps entries in an arena keyed by identity rather than by path, so a
//! handle keeps pointing at its entry after the entry (or an ancestor) is
//! moved, the way browser directory handles behave. Switches let callers
//! drop move support, withhold permission or inject one-shot failures.

use crate::kernel::services::ports::{
    HandleKind, PermissionMode, PermissionState, StorageError, StorageHandle, StorageResult,
    WritableStream,
};
use async_trait::async_trait;
use compact_str::CompactString;
use slotmap::{new_key_type, SlotMap};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

new_key_type! { struct EntryKey; }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryOp {
    GetDirectory,
    GetFile,
    RemoveEntry,
    Entries,
    ReadText,
    Write,
    Move,
}

#[derive(Debug)]
struct Fault {
    op: MemoryOp,
    name: Option<String>,
    error: StorageError,
}

#[derive(Debug)]
enum Body {
    Dir(BTreeMap<CompactString, EntryKey>),
    File(String),
}

#[derive(Debug)]
struct Entry {
    name: CompactString,
    parent: Option<EntryKey>,
    body: Body,
}

#[derive(Debug)]
struct State {
    entries: SlotMap<EntryKey, Entry>,
    root: EntryKey,
    permission: PermissionState,
    grant_on_request: bool,
    supports_move: bool,
    faults: Vec<Fault>,
}

impl State {
    fn take_fault(&mut self, op: MemoryOp, name: Option<&str>) -> StorageResult<()> {
        let hit = self.faults.iter().position(|fault| {
            fault.op == op
                && match (&fault.name, name) {
                    (None, _) => true,
                    (Some(expected), Some(actual)) => expected == actual,
                    (Some(_), None) => false,
                }
        });
        match hit {
            Some(idx) => Err(self.faults.remove(idx).error),
            None => Ok(()),
        }
    }

    fn dir_children(&self, key: EntryKey) -> StorageResult<&BTreeMap<CompactString, EntryKey>> {
        match self.entries.get(key).map(|e| &e.body) {
            Some(Body::Dir(children)) => Ok(children),
            Some(Body::File(_)) => Err(StorageError::TypeMismatch(self.name_of(key))),
            None => Err(StorageError::NotFound("stale handle".to_string())),
        }
    }

    fn name_of(&self, key: EntryKey) -> String {
        self.entries
            .get(key)
            .map(|e| e.name.to_string())
            .unwrap_or_default()
    }

    fn insert(&mut self, parent: EntryKey, name: &str, body: Body) -> StorageResult<EntryKey> {
        self.dir_children(parent)?;
        let key = self.entries.insert(Entry {
            name: CompactString::from(name),
            parent: Some(parent),
            body,
        });
        if let Some(Entry {
            body: Body::Dir(children),
            ..
        }) = self.entries.get_mut(parent)
        {
            children.insert(CompactString::from(name), key);
        }
        Ok(key)
    }

    fn remove_subtree(&mut self, key: EntryKey) {
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(entry) = self.entries.remove(k) {
                if let Body::Dir(children) = entry.body {
                    stack.extend(children.into_values());
                }
            }
        }
    }

    fn is_ancestor(&self, ancestor: EntryKey, mut key: EntryKey) -> bool {
        loop {
            if key == ancestor {
                return true;
            }
            match self.entries.get(key).and_then(|e| e.parent) {
                Some(parent) => key = parent,
                None => return false,
            }
        }
    }

    fn lookup(&self, rel_path: &str) -> Option<EntryKey> {
        let mut current = self.root;
        for segment in rel_path.split('/').filter(|s| !s.is_empty()) {
            current = *self.dir_children(current).ok()?.get(segment)?;
        }
        Some(current)
    }
}

/// Shared in-memory storage. Cloning shares the same entries.
#[derive(Clone)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
    root_name: CompactString,
}

impl MemoryStorage {
    pub fn new(root_name: &str) -> Self {
        let mut entries = SlotMap::with_key();
        let root = entries.insert(Entry {
            name: CompactString::from(root_name),
            parent: None,
            body: Body::Dir(BTreeMap::new()),
        });
        Self {
            state: Arc::new(Mutex::new(State {
                entries,
                root,
                permission: PermissionState::Granted,
                grant_on_request: true,
                supports_move: true,
                faults: Vec::new(),
            })),
            root_name: CompactString::from(root_name),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        lock_state(&self.state)
    }

    pub fn root_handle(&self) -> MemoryHandle {
        let root = self.lock().root;
        MemoryHandle {
            state: Arc::clone(&self.state),
            key: root,
            name: self.root_name.clone(),
            kind: HandleKind::Directory,
        }
    }

    /// Handle for the entry at `rel_path` (relative to the root).
    pub fn handle(&self, rel_path: &str) -> Option<MemoryHandle> {
        let state = self.lock();
        let key = state.lookup(rel_path)?;
        let entry = state.entries.get(key)?;
        let kind = match entry.body {
            Body::Dir(_) => HandleKind::Directory,
            Body::File(_) => HandleKind::File,
        };
        Some(MemoryHandle {
            state: Arc::clone(&self.state),
            key,
            name: entry.name.clone(),
            kind,
        })
    }

    pub fn set_supports_move(&self, supported: bool) {
        self.lock().supports_move = supported;
    }

    pub fn set_permission(&self, permission: PermissionState, grant_on_request: bool) {
        let mut state = self.lock();
        state.permission = permission;
        state.grant_on_request = grant_on_request;
    }

    /// The next `op` (optionally only for entry `name`) fails with `error`.
    pub fn fail_next(&self, op: MemoryOp, name: Option<&str>, error: StorageError) {
        self.lock().faults.push(Fault {
            op,
            name: name.map(str::to_string),
            error,
        });
    }

    /// Creates a file (and missing parent directories) with `content`.
    pub fn insert_file(&self, rel_path: &str, content: &str) {
        let mut state = self.lock();
        let segments: Vec<&str> = rel_path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((file_name, dirs)) = segments.split_last() else {
            return;
        };
        let mut current = state.root;
        for dir in dirs {
            let existing = state.dir_children(current).ok().and_then(|c| c.get(*dir).copied());
            current = match existing {
                Some(key) => key,
                None => match state.insert(current, dir, Body::Dir(BTreeMap::new())) {
                    Ok(key) => key,
                    Err(_) => return,
                },
            };
        }
        let existing = state
            .dir_children(current)
            .ok()
            .and_then(|c| c.get(*file_name).copied());
        match existing {
            Some(key) => {
                if let Some(entry) = state.entries.get_mut(key) {
                    entry.body = Body::File(content.to_string());
                }
            }
            None => {
                let _ = state.insert(current, file_name, Body::File(content.to_string()));
            }
        }
    }

    pub fn insert_dir(&self, rel_path: &str) {
        let mut state = self.lock();
        let mut current = state.root;
        for dir in rel_path.split('/').filter(|s| !s.is_empty()) {
            let existing = state.dir_children(current).ok().and_then(|c| c.get(dir).copied());
            current = match existing {
                Some(key) => key,
                None => match state.insert(current, dir, Body::Dir(BTreeMap::new())) {
                    Ok(key) => key,
                    Err(_) => return,
                },
            };
        }
    }

    pub fn read(&self, rel_path: &str) -> Option<String> {
        let state = self.lock();
        let key = state.lookup(rel_path)?;
        match &state.entries.get(key)?.body {
            Body::File(content) => Some(content.clone()),
            Body::Dir(_) => None,
        }
    }

    pub fn exists(&self, rel_path: &str) -> bool {
        self.lock().lookup(rel_path).is_some()
    }

    pub fn is_dir(&self, rel_path: &str) -> bool {
        let state = self.lock();
        state
            .lookup(rel_path)
            .and_then(|key| state.entries.get(key))
            .is_some_and(|entry| matches!(entry.body, Body::Dir(_)))
    }

    /// Sorted names directly under `rel_path`.
    pub fn list(&self, rel_path: &str) -> Vec<String> {
        let state = self.lock();
        state
            .lookup(rel_path)
            .and_then(|key| state.dir_children(key).ok())
            .map(|children| children.keys().map(|k| k.to_string()).collect())
            .unwrap_or_default()
    }

    /// Renames an entry behind the workspace's back.
    pub fn rename_external(&self, rel_path: &str, new_name: &str) -> bool {
        let mut state = self.lock();
        let Some(key) = state.lookup(rel_path) else {
            return false;
        };
        let Some(parent) = state.entries.get(key).and_then(|e| e.parent) else {
            return false;
        };
        relink(&mut state, key, parent, new_name).is_ok()
    }
}

fn lock_state(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn relink(state: &mut State, key: EntryKey, new_parent: EntryKey, new_name: &str) -> StorageResult<()> {
    if state.dir_children(new_parent)?.contains_key(new_name) {
        return Err(StorageError::Io(format!("{} already exists", new_name)));
    }
    if state.is_ancestor(key, new_parent) {
        return Err(StorageError::Io("cannot move an entry into itself".to_string()));
    }
    let (old_parent, old_name) = {
        let entry = state
            .entries
            .get(key)
            .ok_or_else(|| StorageError::NotFound("stale handle".to_string()))?;
        (entry.parent, entry.name.clone())
    };
    if let Some(Entry {
        body: Body::Dir(children),
        ..
    }) = old_parent.and_then(|p| state.entries.get_mut(p))
    {
        children.remove(&old_name);
    }
    if let Some(Entry {
        body: Body::Dir(children),
        ..
    }) = state.entries.get_mut(new_parent)
    {
        children.insert(CompactString::from(new_name), key);
    }
    if let Some(entry) = state.entries.get_mut(key) {
        entry.name = CompactString::from(new_name);
        entry.parent = Some(new_parent);
    }
    Ok(())
}

pub struct MemoryHandle {
    state: Arc<Mutex<State>>,
    key: EntryKey,
    name: CompactString,
    kind: HandleKind,
}

impl std::fmt::Debug for MemoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHandle")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl MemoryHandle {
    fn lock(&self) -> MutexGuard<'_, State> {
        lock_state(&self.state)
    }

    fn child(&self, key: EntryKey, name: &str, kind: HandleKind) -> Self {
        Self {
            state: Arc::clone(&self.state),
            key,
            name: CompactString::from(name),
            kind,
        }
    }

    fn get_child(&self, name: &str, kind: HandleKind, create: bool) -> StorageResult<Self> {
        let op = match kind {
            HandleKind::Directory => MemoryOp::GetDirectory,
            HandleKind::File => MemoryOp::GetFile,
        };
        let mut state = self.lock();
        state.take_fault(op, Some(name))?;

        let existing = state.dir_children(self.key)?.get(name).copied();
        match existing {
            Some(key) => {
                let actual = match state.entries.get(key).map(|e| &e.body) {
                    Some(Body::Dir(_)) => HandleKind::Directory,
                    Some(Body::File(_)) => HandleKind::File,
                    None => return Err(StorageError::NotFound(name.to_string())),
                };
                if actual != kind {
                    return Err(StorageError::TypeMismatch(name.to_string()));
                }
                Ok(self.child(key, name, kind))
            }
            None if create => {
                let body = match kind {
                    HandleKind::Directory => Body::Dir(BTreeMap::new()),
                    HandleKind::File => Body::File(String::new()),
                };
                let key = state.insert(self.key, name, body)?;
                Ok(self.child(key, name, kind))
            }
            None => Err(StorageError::NotFound(name.to_string())),
        }
    }

    fn check_write(&self) -> StorageResult<()> {
        let state = self.lock();
        match state.permission {
            PermissionState::Granted => Ok(()),
            _ => Err(StorageError::PermissionDenied(self.name.to_string())),
        }
    }
}

#[async_trait]
impl StorageHandle for MemoryHandle {
    type Writable = MemoryWritable;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> HandleKind {
        self.kind
    }

    async fn get_directory_handle(&self, name: &str, create: bool) -> StorageResult<Self> {
        if create {
            self.check_write()?;
        }
        self.get_child(name, HandleKind::Directory, create)
    }

    async fn get_file_handle(&self, name: &str, create: bool) -> StorageResult<Self> {
        if create {
            self.check_write()?;
        }
        self.get_child(name, HandleKind::File, create)
    }

    async fn remove_entry(&self, name: &str, recursive: bool) -> StorageResult<()> {
        self.check_write()?;
        let mut state = self.lock();
        state.take_fault(MemoryOp::RemoveEntry, Some(name))?;

        let key = state
            .dir_children(self.key)?
            .get(name)
            .copied()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        if let Some(Body::Dir(children)) = state.entries.get(key).map(|e| &e.body) {
            if !children.is_empty() && !recursive {
                return Err(StorageError::Io(format!("{} is not empty", name)));
            }
        }
        if let Some(Entry {
            body: Body::Dir(children),
            ..
        }) = state.entries.get_mut(self.key)
        {
            children.remove(name);
        }
        state.remove_subtree(key);
        Ok(())
    }

    async fn entries(&self) -> StorageResult<Vec<Self>> {
        let mut state = self.lock();
        state.take_fault(MemoryOp::Entries, Some(&self.name))?;
        let children = state.dir_children(self.key)?;
        let mut handles: Vec<Self> = children
            .iter()
            .filter_map(|(name, &key)| {
                let kind = match state.entries.get(key).map(|e| &e.body) {
                    Some(Body::Dir(_)) => HandleKind::Directory,
                    Some(Body::File(_)) => HandleKind::File,
                    None => return None,
                };
                Some(self.child(key, name, kind))
            })
            .collect();
        // enumeration order is unspecified
        handles.reverse();
        Ok(handles)
    }

    async fn read_text(&self) -> StorageResult<String> {
        let mut state = self.lock();
        state.take_fault(MemoryOp::ReadText, Some(&self.name))?;
        match state.entries.get(self.key).map(|e| &e.body) {
            Some(Body::File(content)) => Ok(content.clone()),
            Some(Body::Dir(_)) => Err(StorageError::TypeMismatch(self.name.to_string())),
            None => Err(StorageError::NotFound(self.name.to_string())),
        }
    }

    async fn create_writable(&self) -> StorageResult<MemoryWritable> {
        self.check_write()?;
        if self.kind != HandleKind::File {
            return Err(StorageError::TypeMismatch(self.name.to_string()));
        }
        Ok(MemoryWritable {
            state: Arc::clone(&self.state),
            key: self.key,
            name: self.name.clone(),
            buffer: String::new(),
            closed: false,
        })
    }

    async fn query_permission(&self, mode: PermissionMode) -> PermissionState {
        match mode {
            PermissionMode::Read => PermissionState::Granted,
            PermissionMode::ReadWrite => self.lock().permission,
        }
    }

    async fn request_permission(&self, mode: PermissionMode) -> PermissionState {
        let mut state = self.lock();
        if mode == PermissionMode::ReadWrite
            && state.permission == PermissionState::Prompt
            && state.grant_on_request
        {
            state.permission = PermissionState::Granted;
        }
        match mode {
            PermissionMode::Read => PermissionState::Granted,
            PermissionMode::ReadWrite => state.permission,
        }
    }

    fn supports_move(&self) -> bool {
        self.lock().supports_move
    }

    async fn move_to(&self, new_parent: &Self, new_name: &str) -> StorageResult<()> {
        self.check_write()?;
        let mut state = self.lock();
        if !state.supports_move {
            return Err(StorageError::Unsupported("move"));
        }
        state.take_fault(MemoryOp::Move, Some(&self.name))?;
        relink(&mut state, self.key, new_parent.key, new_name)
    }
}

pub struct MemoryWritable {
    state: Arc<Mutex<State>>,
    key: EntryKey,
    name: CompactString,
    buffer: String,
    closed: bool,
}

#[async_trait]
impl WritableStream for MemoryWritable {
    async fn write(&mut self, text: &str) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::Io(format!("{} is closed", self.name)));
        }
        self.buffer.push_str(text);
        Ok(())
    }

    async fn close(&mut self) -> StorageResult<()> {
        if self.closed {
            return Ok(());
        }
        let mut state = lock_state(&self.state);
        state.take_fault(MemoryOp::Write, Some(&self.name))?;
        match state.entries.get_mut(self.key) {
            Some(Entry {
                body: Body::File(content),
                ..
            }) => {
                *content = std::mem::take(&mut self.buffer);
                self.closed = true;
                Ok(())
            }
            Some(_) => Err(StorageError::TypeMismatch(self.name.to_string())),
            None => Err(StorageError::NotFound(self.name.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/storage/memory.rs"]
mod tests;
