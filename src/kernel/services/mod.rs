//! Services layer (ports + adapters).
//!
//! - `ports`: pure contracts/types used across the app (kernel-facing).
//! - `adapters`: storage, prompt and config implementations.

pub mod adapters;
pub mod ports;
