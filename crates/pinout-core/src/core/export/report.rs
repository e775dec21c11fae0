use serde::Serialize;

use super::ExportFormat;

/// Summary of a finished export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub format: ExportFormat,
    /// Number of distinct requirement lines written.
    pub lines: usize,
    /// Index URLs the exported packages were resolved from.
    pub indexes: Vec<String>,
    /// Packages left out because the format forbids editable installs.
    pub skipped_editables: Vec<String>,
    pub warnings: Vec<String>,
}

impl ExportReport {
    pub(crate) fn new(format: ExportFormat) -> Self {
        Self {
            format,
            lines: 0,
            indexes: Vec::new(),
            skipped_editables: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
