pub mod local;
pub mod memory;

pub use local::{LocalHandle, LocalWritable};
pub use memory::{MemoryHandle, MemoryOp, MemoryStorage, MemoryWritable};
