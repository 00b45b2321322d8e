//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod app_dirs;
pub mod config;
pub mod prompt;
pub mod settings;
pub mod storage;

pub use app_dirs::{ensure_log_dir, get_log_dir};
pub use config::ConfigService;
pub use prompt::{ScriptedPrompter, StdioPrompter};
pub use settings::{ensure_settings_file, get_settings_path, load_settings, load_settings_from};
pub use storage::{LocalHandle, MemoryHandle, MemoryOp, MemoryStorage};
