//! Infrastructure adapters for external systems.

pub mod filesystem;
pub mod memory;
pub mod refdata;
pub mod workflow;
