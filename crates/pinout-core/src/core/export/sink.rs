use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::ExportError;

/// Where exported text goes.
pub enum OutputSink<'w> {
    Stream(&'w mut dyn Write),
    /// Relative paths are resolved against the export's working directory.
    Path(PathBuf),
}

impl OutputSink<'_> {
    pub(crate) fn write(self, cwd: &Path, content: &str) -> Result<(), ExportError> {
        match self {
            Self::Stream(writer) => {
                writer.write_all(content.as_bytes())?;
                writer.flush()?;
                Ok(())
            }
            Self::Path(path) => write_replacing(&cwd.join(path), content),
        }
    }
}

/// Writes into a temporary sibling, then renames it over `path`.
fn write_replacing(path: &Path, content: &str) -> Result<(), ExportError> {
    let write_err = |source: io::Error| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    carry_permissions(tmp.as_file(), path).map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote export");
    Ok(())
}

/// Temporary files are private; give the result the target's existing
/// permissions, or the usual file mode for a new file.
fn carry_permissions(file: &fs::File, target: &Path) -> io::Result<()> {
    match fs::metadata(target) {
        Ok(metadata) => file.set_permissions(metadata.permissions()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => default_permissions(file),
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn default_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
