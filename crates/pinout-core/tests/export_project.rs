use std::fs;

use pinout_core::{export_project, CommandStatus, Config, ExportRequest};
use serde_json::json;
use tempfile::tempdir;

const MANIFEST: &str = r#"
[project]
name = "worker"
requires-python = ">=3.10"
dependencies = ["attrs>=23", "click[colors]>=8; sys_platform != 'win32'"]

[project.optional-dependencies]
speed = ["ujson"]
"#;

const LOCK: &str = r#"
[[package]]
name = "attrs"
version = "23.2.0"
optional = false
python-versions = ">=3.7"
files = [{file = "attrs-23.2.0.tar.gz", hash = "sha256:935dc3b529c262f6cf76e50877d35a4bd3c1de194fd41f47a2b7ae8f19971f30"}]

[[package]]
name = "click"
version = "8.1.7"
optional = false
python-versions = ">=3.7"
files = []

[package.dependencies]
colorama = {version = "*", markers = "platform_system == \"Windows\""}

[package.extras]
colors = ["colorama"]

[[package]]
name = "colorama"
version = "0.4.6"
optional = false
python-versions = "*"
files = []

[[package]]
name = "ujson"
version = "5.10.0"
optional = true
python-versions = ">=3.8"
files = []

[extras]
speed = ["ujson"]

[metadata]
lock-version = "2.0"
python-versions = ">=3.10"
content-hash = "0"
"#;

fn request(root: &std::path::Path) -> ExportRequest {
    ExportRequest {
        directory: Some(root.to_path_buf()),
        with_hashes: false,
        ..ExportRequest::default()
    }
}

#[test]
fn legacy_lock_walks_from_project_requirements() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("pyproject.toml"), MANIFEST).expect("manifest");
    fs::write(dir.path().join("poetry.lock"), LOCK).expect("lock");

    let outcome = export_project(&Config::from_env(), &request(dir.path())).expect("export");
    assert_eq!(outcome.status, CommandStatus::Ok);
    let content = outcome.details["content"].as_str().expect("content");
    assert_eq!(
        content,
        "attrs==23.2.0 ; python_version >= \"3.10\"\n\
         click[colors]==8.1.7 ; sys_platform != \"win32\" and python_version >= \"3.10\"\n\
         colorama==0.4.6 ; platform_system == \"Windows\" and sys_platform != \"win32\" \
         and python_version >= \"3.10\"\n"
    );
    assert_eq!(outcome.details["lines"], 3);
    assert_eq!(outcome.details["warnings"], json!([]));
}

#[test]
fn extras_pull_in_optional_packages() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("pyproject.toml"), MANIFEST).expect("manifest");
    fs::write(dir.path().join("poetry.lock"), LOCK).expect("lock");

    let outcome = export_project(
        &Config::from_env(),
        &ExportRequest {
            extras: vec!["speed".into()],
            with_markers: false,
            ..request(dir.path())
        },
    )
    .expect("export");
    assert_eq!(
        outcome.details["content"],
        "attrs==23.2.0\nclick[colors]==8.1.7\ncolorama==0.4.6\nujson==5.10.0\n"
    );

    let outcome = export_project(
        &Config::from_env(),
        &ExportRequest {
            all_extras: true,
            extras: vec!["speed".into()],
            ..request(dir.path())
        },
    )
    .expect("export");
    assert_eq!(outcome.status, CommandStatus::UserError);
    assert_eq!(outcome.details["reason"], "conflicting_extras");
}
