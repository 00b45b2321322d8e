use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Without a move primitive the rename is reported as degraded and the
    /// parent is re-read to show whatever storage now holds.
    #[default]
    Degrade,
    /// Without a move primitive the rename fails before touching storage.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub rename_policy: RenamePolicy,
    #[serde(default = "default_ignored_names")]
    pub ignored_names: Vec<String>,
    #[serde(default = "default_confirm_patch_commit")]
    pub confirm_patch_commit: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            rename_policy: RenamePolicy::default(),
            ignored_names: default_ignored_names(),
            confirm_patch_commit: default_confirm_patch_commit(),
        }
    }
}

impl WorkspaceConfig {
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_names.iter().any(|ignored| ignored == name)
    }
}

fn default_ignored_names() -> Vec<String> {
    [
        ".DS_Store",
        ".Spotlight-V100",
        ".Trashes",
        ".fseventsd",
        ".TemporaryItems",
        "Thumbs.db",
        "desktop.ini",
        ".git",
        "node_modules",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_confirm_patch_commit() -> bool {
    true
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/config.rs"]
mod tests;
