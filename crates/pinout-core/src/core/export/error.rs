use std::io;
use std::path::PathBuf;

use pinout_domain::WalkError;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid export format: {format}")]
    UnsupportedFormat { format: String },
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error("local source `{}` cannot be expressed as a file URL", path.display())]
    InvalidLocalPath { path: PathBuf },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}
