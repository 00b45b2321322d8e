//! 当前打开的文件及其未保存缓冲区

use super::path;
use ropey::Rope;
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct ActiveSelection {
    path: String,
    buffer: Rope,
    dirty: bool,
}

impl ActiveSelection {
    pub fn new(path: impl Into<String>, content: &str) -> Self {
        Self {
            path: path.into(),
            buffer: Rope::from_str(content),
            dirty: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn rope(&self) -> &Rope {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    /// Buffer diverges from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn replace_text(&mut self, text: &str) {
        self.buffer = Rope::from_str(text);
        self.dirty = true;
    }

    pub fn insert(&mut self, char_idx: usize, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let idx = char_idx.min(self.buffer.len_chars());
        self.buffer.insert(idx, text);
        self.dirty = true;
        true
    }

    pub fn remove(&mut self, range: Range<usize>) -> bool {
        let len = self.buffer.len_chars();
        let start = range.start.min(len);
        let end = range.end.min(len);
        if start >= end {
            return false;
        }
        self.buffer.remove(start..end);
        self.dirty = true;
        true
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Replaces the buffer with content that was just persisted elsewhere.
    pub fn reload(&mut self, content: &str) {
        self.buffer = Rope::from_str(content);
        self.dirty = false;
    }

    /// True when `ancestor` is this selection's path or one of its ancestors.
    pub fn is_within(&self, ancestor: &str) -> bool {
        path::is_same_or_descendant(&self.path, ancestor)
    }

    /// Follows a rename of this path or of one of its ancestors.
    pub fn rebase(&mut self, old_prefix: &str, new_prefix: &str) -> bool {
        match path::rebase(&self.path, old_prefix, new_prefix) {
            Some(rebased) => {
                self.path = rebased;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/active_selection.rs"]
mod tests;
