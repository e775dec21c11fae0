#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

mod core;

pub(crate) use crate::core::{config, export, tooling};

pub use crate::core::config::{Config, CredentialConfig, GlobalOptions};
pub use crate::core::export::{
    ExportError, ExportFormat, ExportPolicy, ExportReport, Exporter, OutputSink,
};
pub use crate::core::project::{export_project, ExportRequest};
pub use crate::core::tooling::outcome::{
    format_status_message, to_json_response, CommandStatus, ExecutionOutcome,
};
