//! AI patch applier.
//!
//! A model response may carry whole-file writes as delimited blocks:
//!
//! ```text
//! [START_FILE:src/util.ts]export const x = 1;[END_FILE]
//! ```
//!
//! Blocks are pulled out into a [`PatchProposal`] which the user either
//! commits or discards as a whole. Committing writes each file through the
//! mutation engine independently.

use super::error::{validate_name, Result, WorkspaceError};
use super::resolver;
use super::workspace::Workspace;
use crate::kernel::services::ports::{write_text, StorageHandle};
use crate::models::path;
use memchr::memmem;
use rustc_hash::FxHashMap;

pub const START_MARKER: &str = "[START_FILE:";
pub const END_MARKER: &str = "[END_FILE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOperation {
    /// Workspace path, rooted at the root directory's name.
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchExtraction {
    pub operations: Vec<PatchOperation>,
    /// The response with every block removed.
    pub summary: String,
}

/// Scans `response` for file blocks. Only the last block per path
/// survives; unterminated blocks and blocks with an empty or escaping path
/// are dropped. The summary never contains a marker.
pub fn extract(response: &str, root_name: &str) -> PatchExtraction {
    let scanner = BlockScanner::new();
    let (blocks, stripped) = scanner.split(response);

    let mut operations: Vec<PatchOperation> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    for (raw_path, content) in blocks {
        let Some(file_path) = normalize_patch_path(raw_path, root_name) else {
            tracing::debug!(path = %raw_path, "dropping patch block with unusable path");
            continue;
        };
        match index.get(&file_path) {
            Some(&slot) => operations[slot].content = content.to_string(),
            None => {
                index.insert(file_path.clone(), operations.len());
                operations.push(PatchOperation {
                    file_path,
                    content: content.to_string(),
                });
            }
        }
    }

    PatchExtraction {
        operations,
        summary: scanner.scrub(stripped).trim().to_string(),
    }
}

struct BlockScanner {
    start: memmem::Finder<'static>,
    end: memmem::Finder<'static>,
}

impl BlockScanner {
    fn new() -> Self {
        Self {
            start: memmem::Finder::new(START_MARKER),
            end: memmem::Finder::new(END_MARKER),
        }
    }

    /// Complete blocks as `(raw path, content)` plus the text between them.
    /// An unterminated block drops everything from its start marker on.
    fn split<'a>(&self, text: &'a str) -> (Vec<(&'a str, &'a str)>, String) {
        let mut blocks = Vec::new();
        let mut stripped = String::with_capacity(text.len());
        let mut rest = text;

        loop {
            let Some(start) = self.start.find(rest.as_bytes()) else {
                stripped.push_str(rest);
                break;
            };
            stripped.push_str(&rest[..start]);

            let header = &rest[start + START_MARKER.len()..];
            let Some(header_end) = memchr::memchr(b']', header.as_bytes()) else {
                tracing::debug!("dropping patch block with unterminated header");
                break;
            };
            let raw_path = &header[..header_end];
            let body = &header[header_end + 1..];
            let Some(end) = self.end.find(body.as_bytes()) else {
                tracing::debug!(path = %raw_path, "dropping patch block without end marker");
                break;
            };
            blocks.push((raw_path, &body[..end]));
            rest = &body[end + END_MARKER.len()..];
        }

        (blocks, stripped)
    }

    /// Joining the prose around removed blocks can splice marker fragments
    /// back into whole markers, so strip until nothing changes.
    fn scrub(&self, mut summary: String) -> String {
        loop {
            let (_, stripped) = self.split(&summary);
            let cleaned = stripped.replace(START_MARKER, "").replace(END_MARKER, "");
            if cleaned == summary {
                return cleaned;
            }
            summary = cleaned;
        }
    }
}

/// `/util.ts`, `./util.ts`, `util.ts` and `proj/util.ts` all become
/// `proj/util.ts` for root `proj`.
pub fn normalize_patch_path(raw: &str, root_name: &str) -> Option<String> {
    if raw.contains('\n') {
        return None;
    }
    let mut segments = Vec::new();
    for segment in raw.trim().split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s => segments.push(s),
        }
    }
    if segments.first() == Some(&root_name) && segments.len() > 1 {
        segments.remove(0);
    }
    if segments.is_empty() {
        return None;
    }
    Some(path::join(root_name, &segments.join("/")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction {
    Created,
    Overwritten,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub path: String,
    pub result: Result<PatchAction>,
}

/// Extracted operations waiting for the user's decision. Committing or
/// discarding consumes the proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a patch proposal must be committed or discarded"]
pub struct PatchProposal {
    operations: Vec<PatchOperation>,
    summary: String,
}

impl PatchProposal {
    pub fn from_response(response: &str, root_name: &str) -> Self {
        let PatchExtraction {
            operations,
            summary,
        } = extract(response, root_name);
        Self {
            operations,
            summary,
        }
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Applies every operation; one failure does not stop the rest.
    pub async fn commit<H: StorageHandle>(self, workspace: &mut Workspace<H>) -> Vec<PatchOutcome> {
        let mut outcomes = Vec::with_capacity(self.operations.len());
        for op in self.operations {
            let result = workspace.apply_patch_operation(&op).await;
            match &result {
                Ok(action) => tracing::info!(path = %op.file_path, ?action, "patch applied"),
                Err(err) => tracing::warn!(path = %op.file_path, error = %err, "patch failed"),
            }
            outcomes.push(PatchOutcome {
                path: op.file_path,
                result,
            });
        }
        outcomes
    }

    /// Drops the proposal without touching storage.
    pub fn discard(self) -> usize {
        tracing::info!(operations = self.operations.len(), "patch discarded");
        self.operations.len()
    }
}

impl<H: StorageHandle> Workspace<H> {
    pub fn propose_patch(&self, response: &str) -> PatchProposal {
        PatchProposal::from_response(response, self.root_name())
    }

    async fn apply_patch_operation(&mut self, op: &PatchOperation) -> Result<PatchAction> {
        let target = path::normalize(&op.file_path);
        let (parent_path, name) = match path::split_parent(&target) {
            (Some(parent), name) => (parent.to_string(), name.to_string()),
            (None, _) => return Err(WorkspaceError::InvalidName(target)),
        };
        validate_name(&name)?;
        if self.tree.node_by_path(&target).is_some_and(|node| node.is_dir()) {
            return Err(WorkspaceError::KindMismatch(target));
        }
        self.ensure_writable().await?;

        let written = self.write_patch_file(&target, &parent_path, &name, &op.content).await;

        let anchor_id = self.tree.deepest_existing_dir(&parent_path);
        if let Some(anchor) = self.tree.get(anchor_id).map(|node| node.path().to_string()) {
            self.reconcile_best_effort(&anchor).await;
        }
        let action = written?;

        if let Some(id) = self.tree.find_by_path(&target) {
            self.tree.set_content(id, Some(op.content.clone()));
        }
        if let Some(selection) = self
            .selection
            .as_mut()
            .filter(|selection| selection.path() == target)
        {
            selection.reload(&op.content);
        }
        Ok(action)
    }

    async fn write_patch_file(
        &self,
        target: &str,
        parent_path: &str,
        name: &str,
        content: &str,
    ) -> Result<PatchAction> {
        match resolver::resolve_file(&self.tree, target).await {
            Ok(handle) => {
                write_text(&*handle, content).await?;
                Ok(PatchAction::Overwritten)
            }
            Err(WorkspaceError::NotFound(_)) => {
                let dir = resolver::resolve_dir_creating(&self.tree, parent_path).await?;
                let file = dir.get_file_handle(name, true).await?;
                write_text(&file, content).await?;
                Ok(PatchAction::Created)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/patch.rs"]
mod tests;
