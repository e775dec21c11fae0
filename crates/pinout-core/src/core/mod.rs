//! Internal implementation modules for `pinout-core`.
//!
//! Callers should use the re-exports at the crate root.

pub mod config;
pub mod export;
pub mod project;
pub mod tooling;
