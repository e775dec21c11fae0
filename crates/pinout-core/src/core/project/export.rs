use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pinout_domain::{
    discover_project_root, split_name_list, Project, ProjectManifest, DEV_GROUP, LOCK_FILENAME,
    MAIN_GROUP,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::export::{ExportError, ExportFormat, ExportReport, Exporter, OutputSink};
use crate::tooling::{
    missing_lock_outcome, missing_pyproject_outcome, unknown_names_outcome,
    unsupported_format_outcome,
};
use crate::ExecutionOutcome;

#[derive(Clone, Debug)]
pub struct ExportRequest {
    pub format: String,
    /// Written to this file (relative to the working directory) instead of
    /// returned in the outcome.
    pub output: Option<PathBuf>,
    /// Where to start looking for the project; defaults to the working
    /// directory.
    pub directory: Option<PathBuf>,
    pub with_hashes: bool,
    pub with_urls: bool,
    pub with_markers: bool,
    pub with_credentials: bool,
    pub extras: Vec<String>,
    pub all_extras: bool,
    pub with_groups: Vec<String>,
    pub without_groups: Vec<String>,
    pub only_groups: Vec<String>,
    pub all_groups: bool,
    /// Deprecated spelling of `--with dev`.
    pub dev: bool,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            format: ExportFormat::RequirementsTxt.to_string(),
            output: None,
            directory: None,
            with_hashes: true,
            with_urls: true,
            with_markers: true,
            with_credentials: false,
            extras: Vec::new(),
            all_extras: false,
            with_groups: Vec::new(),
            without_groups: Vec::new(),
            only_groups: Vec::new(),
            all_groups: false,
            dev: false,
        }
    }
}

/// Exports the lock of the project found at or above the requested
/// directory.
///
/// Without an output path the exported text is returned under
/// `details.content`.
pub fn export_project(config: &Config, request: &ExportRequest) -> Result<ExecutionOutcome> {
    let cwd = env::current_dir().context("unable to determine the working directory")?;
    export_project_in(config, request, &cwd)
}

pub(crate) fn export_project_in(
    config: &Config,
    request: &ExportRequest,
    cwd: &Path,
) -> Result<ExecutionOutcome> {
    if !Exporter::is_format_supported(&request.format) {
        return Ok(unsupported_format_outcome(
            &request.format,
            &ExportFormat::names(),
        ));
    }
    if request.all_extras && !request.extras.is_empty() {
        return Ok(ExecutionOutcome::user_error(
            "--extras and --all-extras cannot be combined",
            json!({
                "reason": "conflicting_extras",
                "hint": "pass either --extras <names> or --all-extras",
            }),
        ));
    }

    let start = request
        .directory
        .as_ref()
        .map_or_else(|| cwd.to_path_buf(), |dir| cwd.join(dir));
    let Some(root) = discover_project_root(&start) else {
        return Ok(missing_pyproject_outcome(&start));
    };
    if !root.join(LOCK_FILENAME).is_file() {
        return Ok(missing_lock_outcome(&root));
    }

    let credentials = config.credentials();
    let project = match Project::load(&root, &|name: &str| credentials.lookup(name)) {
        Ok(project) => project,
        Err(err) => {
            return Ok(ExecutionOutcome::user_error(
                format!("failed to load project at {}", root.display()),
                json!({
                    "reason": "invalid_project",
                    "error": format!("{err:#}"),
                    "project_root": root.display().to_string(),
                }),
            ))
        }
    };

    let groups = match select_groups(&project.manifest, request) {
        Ok(groups) => groups,
        Err(outcome) => return Ok(outcome),
    };
    let extras = match select_extras(&project.manifest, request) {
        Ok(extras) => extras,
        Err(outcome) => return Ok(outcome),
    };
    debug!(?groups, ?extras, root = %root.display(), "exporting project");

    let exporter = Exporter::new(&project)
        .only_groups(&groups)
        .with_extras(&extras)
        .with_hashes(request.with_hashes)
        .with_urls(request.with_urls)
        .with_markers(request.with_markers)
        .with_credentials(request.with_credentials);

    let mut buffer = Vec::new();
    let sink = match &request.output {
        Some(path) => OutputSink::Path(path.clone()),
        None => OutputSink::Stream(&mut buffer),
    };
    let report = match exporter.export(&request.format, cwd, sink) {
        Ok(report) => report,
        Err(err) => return Ok(export_error_outcome(&err, &project)),
    };

    let mut details = json!({
        "format": report.format,
        "project_root": root.display().to_string(),
        "output": request.output.as_ref().map(|path| cwd.join(path).display().to_string()),
        "groups": groups,
        "extras": extras,
        "lines": report.lines,
        "indexes": report.indexes,
        "skipped_editables": report.skipped_editables,
        "warnings": report.warnings,
    });
    let message = match &request.output {
        Some(path) => format!("exported {} to {}", describe(&report), path.display()),
        None => {
            details["content"] = Value::String(String::from_utf8_lossy(&buffer).into_owned());
            format!("exported {}", describe(&report))
        }
    };
    Ok(ExecutionOutcome::success(message, details))
}

fn describe(report: &ExportReport) -> String {
    let noun = if report.lines == 1 {
        "requirement"
    } else {
        "requirements"
    };
    format!("{} {noun} as {}", report.lines, report.format)
}

fn select_groups(
    manifest: &ProjectManifest,
    request: &ExportRequest,
) -> Result<BTreeSet<String>, ExecutionOutcome> {
    let with = names(&request.with_groups);
    let without = names(&request.without_groups);
    let only = names(&request.only_groups);

    let known: Vec<String> = manifest.group_names().map(ToString::to_string).collect();
    let unknown: Vec<String> = with
        .iter()
        .chain(&without)
        .chain(&only)
        .filter(|name| !manifest.has_group(name))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !unknown.is_empty() {
        return Err(unknown_names_outcome("group", &unknown, &known));
    }

    if !only.is_empty() {
        return Ok(only.into_iter().collect());
    }
    let mut groups: BTreeSet<String> = if request.all_groups {
        known.into_iter().collect()
    } else {
        BTreeSet::from([MAIN_GROUP.to_string()])
    };
    groups.extend(with);
    if request.dev {
        warn!("--dev is deprecated, use `--with dev` instead");
        if manifest.has_group(DEV_GROUP) {
            groups.insert(DEV_GROUP.to_string());
        }
    }
    for group in &without {
        groups.remove(group);
    }
    Ok(groups)
}

fn select_extras(
    manifest: &ProjectManifest,
    request: &ExportRequest,
) -> Result<BTreeSet<String>, ExecutionOutcome> {
    if request.all_extras {
        return Ok(manifest.extras.keys().cloned().collect());
    }
    let requested = names(&request.extras);
    let unknown: Vec<String> = requested
        .iter()
        .filter(|extra| !manifest.extras.contains_key(*extra))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        let known: Vec<String> = manifest.extras.keys().cloned().collect();
        return Err(unknown_names_outcome("extra", &unknown, &known));
    }
    Ok(requested.into_iter().collect())
}

/// Comma- or space-separated values, canonicalized.
fn names(values: &[String]) -> Vec<String> {
    split_name_list(values.iter().map(String::as_str))
}

fn export_error_outcome(err: &ExportError, project: &Project) -> ExecutionOutcome {
    match err {
        ExportError::UnsupportedFormat { format } => {
            unsupported_format_outcome(format, &ExportFormat::names())
        }
        ExportError::Walk(walk) => ExecutionOutcome::user_error(
            format!("{} does not match its dependencies", LOCK_FILENAME),
            json!({
                "reason": "inconsistent_lock",
                "error": walk.to_string(),
                "lockfile": project.lock_path().display().to_string(),
                "hint": "run `poetry lock` to refresh the lock file",
            }),
        ),
        other => ExecutionOutcome::failure(
            "export failed",
            json!({
                "reason": "export_failed",
                "error": other.to_string(),
            }),
        ),
    }
}
