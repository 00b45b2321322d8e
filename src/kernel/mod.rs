//! Headless workspace core: resolver, mutation engine, patch applier.

pub mod error;
pub mod mutation;
pub mod patch;
pub mod resolver;
pub mod services;
pub mod terminal;
pub mod workspace;

pub use error::{validate_name, Result, WorkspaceError};
pub use patch::{
    extract, normalize_patch_path, PatchAction, PatchExtraction, PatchOperation, PatchOutcome,
    PatchProposal,
};
pub use resolver::{resolve, resolve_dir, resolve_dir_creating, resolve_file, ResolvedHandle};
pub use terminal::{TerminalOutput, TerminalSession};
pub use workspace::Workspace;
