//! zspace - 存储句柄驱动的工作区树
//!
//! 模块结构：
//! - models: 数据模型（WorkspaceTree, ActiveSelection, 路径工具）
//! - kernel: 核心（Workspace, 路径解析, 变更引擎, AI 补丁, 终端命令）
//! - kernel::services: 端口（StorageHandle, Prompter, 配置）与适配器（本地/内存存储）

pub mod kernel;
pub mod models;
