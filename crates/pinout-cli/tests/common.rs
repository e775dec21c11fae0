#![allow(dead_code)]

use std::fs;
use std::path::Path;

use assert_cmd::assert::Assert;
use serde_json::Value;
use tempfile::TempDir;

pub const SERVICE_MANIFEST: &str = r#"
[tool.poetry]
name = "service"
version = "1.0.0"

[tool.poetry.dependencies]
python = "^3.9"
idna = "^3.7"
internal-lib = {version = "^2", source = "internal"}
demo = {path = "demo", develop = true}

[tool.poetry.group.dev.dependencies]
pytest = "^8"

[[tool.poetry.source]]
name = "internal"
url = "https://pkgs.internal.example/simple/"
priority = "supplemental"
"#;

pub const SERVICE_LOCK: &str = r#"
[[package]]
name = "demo"
version = "0.1.0"
optional = false
python-versions = "*"
groups = ["main"]
develop = true
files = []

[package.source]
type = "directory"
url = "demo"

[[package]]
name = "idna"
version = "3.7"
optional = false
python-versions = ">=3.5"
groups = ["main"]
files = [
    {file = "idna-3.7-py3-none-any.whl", hash = "sha256:82fee1fc78add43492d3a1898bfa6d8a904cc97d8427f683ed8e798d07761aa0"},
]

[[package]]
name = "internal-lib"
version = "2.1.0"
optional = false
python-versions = ">=3.9"
groups = ["main"]
files = []

[package.source]
type = "legacy"
url = "https://pkgs.internal.example/simple"
reference = "internal"

[[package]]
name = "pytest"
version = "8.2.0"
optional = false
python-versions = ">=3.8"
groups = ["dev"]
files = []

[metadata]
lock-version = "2.1"
python-versions = "^3.9"
content-hash = "0"
"#;

/// A temporary poetry project with a locked main and dev group.
pub fn service_project() -> TempDir {
    let temp = tempfile::Builder::new()
        .prefix("pinout-service")
        .tempdir()
        .expect("tempdir");
    write_project(temp.path(), SERVICE_MANIFEST, Some(SERVICE_LOCK));
    fs::create_dir_all(temp.path().join("demo")).expect("demo dir");
    temp
}

pub fn write_project(root: &Path, manifest: &str, lock: Option<&str>) {
    fs::write(root.join("pyproject.toml"), manifest).expect("write pyproject");
    if let Some(lock) = lock {
        fs::write(root.join("poetry.lock"), lock).expect("write lock");
    }
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn stdout(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

pub fn stderr(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}
