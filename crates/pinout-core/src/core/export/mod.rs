//! Lock-to-requirements export: configuration, format dispatch, line
//! rendering and output.

mod error;
mod exporter;
mod format;
mod indexes;
mod lines;
mod report;
mod sink;

#[cfg(test)]
mod tests;

pub use error::ExportError;
pub use exporter::Exporter;
pub use format::{ExportFormat, ExportPolicy};
pub use report::ExportReport;
pub use sink::OutputSink;
