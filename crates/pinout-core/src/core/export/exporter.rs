use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use pinout_domain::{
    canonicalize_name, walk_locked_groups, walk_requirements, DependencyPackage, Project,
    MAIN_GROUP,
};
use tracing::{debug, warn};

use super::indexes::index_header;
use super::lines::{render_line, LineOptions};
use super::{ExportError, ExportFormat, ExportReport, OutputSink};

/// Renders a project's lock as a pinned requirements file.
///
/// ```ignore
/// let report = Exporter::new(&project)
///     .only_groups(["main", "docs"])
///     .with_hashes(false)
///     .export("requirements.txt", &cwd, OutputSink::Stream(&mut stdout))?;
/// ```
#[derive(Clone, Debug)]
pub struct Exporter<'p> {
    project: &'p Project,
    groups: BTreeSet<String>,
    extras: BTreeSet<String>,
    with_hashes: bool,
    with_urls: bool,
    with_markers: bool,
    with_credentials: bool,
}

impl<'p> Exporter<'p> {
    pub fn new(project: &'p Project) -> Self {
        Self {
            project,
            groups: BTreeSet::from([MAIN_GROUP.to_string()]),
            extras: BTreeSet::new(),
            with_hashes: true,
            with_urls: true,
            with_markers: true,
            with_credentials: false,
        }
    }

    #[must_use]
    pub fn with_extras<I, S>(mut self, extras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extras = extras
            .into_iter()
            .map(|extra| canonicalize_name(extra.as_ref()))
            .collect();
        self
    }

    #[must_use]
    pub fn only_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.groups = groups
            .into_iter()
            .map(|group| canonicalize_name(group.as_ref()))
            .collect();
        self
    }

    #[must_use]
    pub fn with_urls(mut self, with_urls: bool) -> Self {
        self.with_urls = with_urls;
        self
    }

    #[must_use]
    pub fn with_hashes(mut self, with_hashes: bool) -> Self {
        self.with_hashes = with_hashes;
        self
    }

    #[must_use]
    pub fn with_markers(mut self, with_markers: bool) -> Self {
        self.with_markers = with_markers;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn extras(&self) -> &BTreeSet<String> {
        &self.extras
    }

    pub fn is_format_supported(name: &str) -> bool {
        ExportFormat::from_str(name).is_ok()
    }

    /// Exports in the format called `format`, failing before reading the
    /// lock when the name is not supported.
    pub fn export(
        &self,
        format: &str,
        cwd: &Path,
        sink: OutputSink<'_>,
    ) -> Result<ExportReport, ExportError> {
        let format = ExportFormat::from_str(format).map_err(|_| ExportError::UnsupportedFormat {
            format: format.to_string(),
        })?;
        self.export_format(format, cwd, sink)
    }

    pub fn export_format(
        &self,
        format: ExportFormat,
        cwd: &Path,
        sink: OutputSink<'_>,
    ) -> Result<ExportReport, ExportError> {
        let (content, report) = self.render(format)?;
        sink.write(cwd, &content)?;
        Ok(report)
    }

    /// Produces the file content without writing it anywhere.
    pub fn render(&self, format: ExportFormat) -> Result<(String, ExportReport), ExportError> {
        let policy = format.policy();
        let options = LineOptions {
            markers: self.with_markers,
            hashes: self.with_hashes,
        };
        let mut report = ExportReport::new(format);
        let mut lines = BTreeSet::new();
        let mut indexes = BTreeSet::new();

        for item in self.dependency_packages()? {
            let item = if policy.include_extras {
                item
            } else {
                item.without_features()
            };
            let package = &item.package;
            if package.develop && !policy.allow_editable {
                let warning = format!(
                    "{} is locked in develop (editable) mode, which is incompatible with the \
                     {format} format.",
                    package.pretty_name
                );
                warn!("{warning}");
                report.skipped_editables.push(package.pretty_name.clone());
                report.warnings.push(warning);
                continue;
            }
            let line = render_line(&item, options)?;
            if let Some(index) = line.index {
                indexes.insert(index);
            }
            lines.insert(line.text);
        }

        report.lines = lines.len();
        let mut content = lines.into_iter().collect::<Vec<_>>().join("\n");
        content.push('\n');

        if !indexes.is_empty() && self.with_urls {
            let header = index_header(self.project.pool(), &indexes, self.with_credentials);
            content = format!("{header}\n{content}");
        }
        report.indexes = indexes.into_iter().collect();
        Ok((content, report))
    }

    fn dependency_packages(
        &self,
    ) -> Result<Box<dyn Iterator<Item = DependencyPackage> + '_>, ExportError> {
        let lock = &self.project.lock;
        let python_marker = self.project.python_constraint().to_python_marker();
        if lock.is_locked_groups_and_markers() {
            debug!(
                lock_version = %lock.metadata.lock_version,
                groups = ?self.groups,
                "reading groups and markers recorded in the lock"
            );
            let packages = walk_locked_groups(lock, &python_marker, &self.groups, &self.extras)?;
            return Ok(Box::new(packages));
        }
        let roots = self.project.manifest.requirements_for(&self.groups);
        debug!(
            lock_version = %lock.metadata.lock_version,
            roots = roots.len(),
            "walking the lock from root requirements"
        );
        let packages = walk_requirements(
            lock,
            &roots,
            self.project.name(),
            &python_marker,
            &self.extras,
        )?;
        Ok(Box::new(packages))
    }
}
