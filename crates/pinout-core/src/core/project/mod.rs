//! Project-level commands.

mod export;

pub use export::{export_project, ExportRequest};
