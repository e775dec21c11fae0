use std::path::Path;

use serde_json::json;

use crate::ExecutionOutcome;

pub(crate) fn missing_pyproject_outcome(root: &Path) -> ExecutionOutcome {
    let manifest = root.join(pinout_domain::MANIFEST_FILENAME);
    ExecutionOutcome::user_error(
        format!("pyproject.toml not found in {}", root.display()),
        json!({
            "hint": "run inside a poetry project or pass `--directory <path>`",
            "project_root": root.display().to_string(),
            "manifest": manifest.display().to_string(),
        }),
    )
}

pub(crate) fn missing_lock_outcome(root: &Path) -> ExecutionOutcome {
    let lock = root.join(pinout_domain::LOCK_FILENAME);
    ExecutionOutcome::user_error(
        format!("poetry.lock not found in {}", root.display()),
        json!({
            "hint": "run `poetry lock` to create the lock file before exporting",
            "project_root": root.display().to_string(),
            "lockfile": lock.display().to_string(),
        }),
    )
}

pub(crate) fn unknown_names_outcome(
    kind: &str,
    unknown: &[String],
    known: &[String],
) -> ExecutionOutcome {
    let plural = if unknown.len() == 1 { "" } else { "s" };
    ExecutionOutcome::user_error(
        format!("unknown {kind}{plural}: {}", unknown.join(", ")),
        json!({
            "reason": format!("unknown_{kind}"),
            "unknown": unknown,
            "available": known,
            "hint": format!("choose from the {kind}s declared in pyproject.toml"),
        }),
    )
}

pub(crate) fn unsupported_format_outcome(format: &str, supported: &[&str]) -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        format!("invalid export format: {format}"),
        json!({
            "reason": "unsupported_format",
            "format": format,
            "supported": supported,
            "hint": format!("pass one of: {}", supported.join(", ")),
        }),
    )
}
