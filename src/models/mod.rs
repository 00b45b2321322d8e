//! 数据模型层

pub mod active_selection;
pub mod path;
pub mod workspace_tree;

pub use active_selection::ActiveSelection;
pub use workspace_tree::{FreshEntry, LoadState, Node, NodeId, NodeKind, TreeError, TreeRow, WorkspaceTree};
