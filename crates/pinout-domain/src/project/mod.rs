//! A project on disk: its manifest, its lock, and where they live.

pub(crate) mod manifest;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::constraint::VersionConstraint;
use crate::lockfile::{LockData, LOCK_FILENAME};
use crate::repository::{Credentials, RepositoryPool};

pub use manifest::{DependencyGroup, ProjectManifest, DEV_GROUP, MAIN_GROUP, MANIFEST_FILENAME};

#[derive(Clone, Debug)]
pub struct Project {
    pub root: PathBuf,
    pub manifest: ProjectManifest,
    pub lock: LockData,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, manifest: ProjectManifest, lock: LockData) -> Self {
        Self {
            root: root.into(),
            manifest,
            lock,
        }
    }

    /// Reads `pyproject.toml` and `poetry.lock` from `root`.
    pub fn load(root: &Path, credentials: &dyn Fn(&str) -> Option<Credentials>) -> Result<Self> {
        let manifest_path = root.join(MANIFEST_FILENAME);
        let contents = fs::read_to_string(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let manifest = ProjectManifest::parse(&contents, root, credentials)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?;
        let lock = LockData::load(&root.join(LOCK_FILENAME), root)?;
        Ok(Self::new(root, manifest, lock))
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILENAME)
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILENAME)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    #[must_use]
    pub fn python_constraint(&self) -> &VersionConstraint {
        &self.manifest.python_constraint
    }

    #[must_use]
    pub fn pool(&self) -> &RepositoryPool {
        &self.manifest.pool
    }
}

/// Nearest directory at or above `start` holding a `pyproject.toml`.
pub fn discover_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(MANIFEST_FILENAME).is_file() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
[tool.poetry]
name = "demo"

[tool.poetry.dependencies]
python = "^3.9"
idna = "^3"
"#;

    const LOCK: &str = r#"
[[package]]
name = "idna"
version = "3.7"
optional = false
python-versions = ">=3.5"
groups = ["main"]
files = []

[metadata]
lock-version = "2.1"
python-versions = "^3.9"
content-hash = "0"
"#;

    #[test]
    fn loads_manifest_and_lock() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(MANIFEST_FILENAME), MANIFEST).expect("manifest");
        fs::write(dir.path().join(LOCK_FILENAME), LOCK).expect("lock");
        let project = Project::load(dir.path(), &|_| None).expect("project");
        assert_eq!(project.name(), "demo");
        assert_eq!(project.lock.packages.len(), 1);
        assert_eq!(project.pool().all_repositories().count(), 1);
        assert_eq!(project.lock_path(), dir.path().join("poetry.lock"));
    }

    #[test]
    fn load_fails_without_lock() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(MANIFEST_FILENAME), MANIFEST).expect("manifest");
        let err = Project::load(dir.path(), &|_| None).expect_err("missing lock");
        assert!(format!("{err:#}").contains("poetry.lock"));
    }

    #[test]
    fn discovers_root_from_nested_directory() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(MANIFEST_FILENAME), MANIFEST).expect("manifest");
        let nested = dir.path().join("src").join("demo");
        fs::create_dir_all(&nested).expect("nested");
        assert_eq!(
            discover_project_root(&nested).as_deref(),
            Some(dir.path())
        );
    }
}
