//! 配置服务：管理工作区配置
//!
//! 提供统一的配置管理，支持运行时修改

use super::settings;
use crate::kernel::services::ports::{RenamePolicy, WorkspaceConfig};

pub struct ConfigService {
    config: WorkspaceConfig,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            config: WorkspaceConfig::default(),
        }
    }

    pub fn with_config(config: WorkspaceConfig) -> Self {
        Self { config }
    }

    /// Settings file if present and valid, defaults otherwise.
    pub fn load() -> Self {
        if let Err(e) = settings::ensure_settings_file() {
            tracing::debug!(error = %e, "settings file unavailable");
        }
        Self::with_config(settings::load_settings().unwrap_or_default())
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut WorkspaceConfig {
        &mut self.config
    }

    pub fn set_rename_policy(&mut self, policy: RenamePolicy) {
        self.config.rename_policy = policy;
    }

    pub fn set_confirm_patch_commit(&mut self, confirm: bool) {
        self.config.confirm_patch_commit = confirm;
    }

    pub fn ignore_name(&mut self, name: &str) {
        if !self.config.is_ignored(name) {
            self.config.ignored_names.push(name.to_string());
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/config.rs"]
mod tests;
