use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use url::Url;

/// Where a package or requirement comes from. Local variants always carry an
/// absolute path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PackageSource {
    /// PyPI (`url == None`) or a named package index.
    Registry {
        url: Option<String>,
        reference: Option<String>,
    },
    Vcs {
        vcs: String,
        url: String,
        reference: Option<String>,
        resolved_reference: Option<String>,
        subdirectory: Option<String>,
    },
    Url {
        url: String,
        subdirectory: Option<String>,
    },
    File {
        path: PathBuf,
    },
    Directory {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Registry,
    Vcs,
    Url,
    File,
    Directory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Registry => "registry",
            Self::Vcs => "vcs",
            Self::Url => "url",
            Self::File => "file",
            Self::Directory => "directory",
        })
    }
}

pub const VCS_SCHEMES: [&str; 4] = ["git", "hg", "svn", "bzr"];

impl Default for PackageSource {
    fn default() -> Self {
        Self::Registry {
            url: None,
            reference: None,
        }
    }
}

impl PackageSource {
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Registry { .. } => SourceKind::Registry,
            Self::Vcs { .. } => SourceKind::Vcs,
            Self::Url { .. } => SourceKind::Url,
            Self::File { .. } => SourceKind::File,
            Self::Directory { .. } => SourceKind::Directory,
        }
    }

    #[must_use]
    pub fn is_direct_remote(&self) -> bool {
        matches!(self, Self::Vcs { .. } | Self::Url { .. })
    }

    #[must_use]
    pub fn is_direct_local(&self) -> bool {
        matches!(self, Self::File { .. } | Self::Directory { .. })
    }

    /// Index URL, VCS/archive URL, or local path, as recorded in the lock.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        match self {
            Self::Registry { url, .. } => url.clone(),
            Self::Vcs { url, .. } | Self::Url { url, .. } => Some(url.clone()),
            Self::File { path } | Self::Directory { path } => {
                Some(path.to_string_lossy().into_owned())
            }
        }
    }

    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::File { path } | Self::Directory { path } => Some(path),
            _ => None,
        }
    }

    /// Classifies a PEP 508 direct reference (`name @ <url>`).
    pub fn from_direct_url(raw: &str) -> Self {
        let (location, subdirectory) = split_subdirectory(raw);
        if let Some((scheme, rest)) = location.split_once('+') {
            if VCS_SCHEMES.contains(&scheme) {
                let (url, reference) = split_vcs_reference(rest);
                return Self::Vcs {
                    vcs: scheme.to_string(),
                    url,
                    reference,
                    resolved_reference: None,
                    subdirectory,
                };
            }
        }
        if let Ok(parsed) = Url::parse(&location) {
            if parsed.scheme() == "file" {
                if let Ok(path) = parsed.to_file_path() {
                    return local_source(path);
                }
            }
        }
        Self::Url {
            url: location,
            subdirectory,
        }
    }
}

/// Archives are files; anything else on disk is a project directory.
pub fn local_source(path: PathBuf) -> PackageSource {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let is_archive = [".whl", ".tar.gz", ".tgz", ".zip", ".tar.bz2"]
        .iter()
        .any(|suffix| name.ends_with(suffix));
    if is_archive {
        PackageSource::File { path }
    } else {
        PackageSource::Directory { path }
    }
}

/// Resolves `path` against `root` and removes `.`/`..` components without
/// touching the filesystem.
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// `file://` URL for an absolute local path.
pub fn path_to_url(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

fn split_subdirectory(raw: &str) -> (String, Option<String>) {
    match raw.split_once('#') {
        Some((location, fragment)) => {
            let subdirectory = fragment
                .split('&')
                .find_map(|pair| pair.strip_prefix("subdirectory="))
                .map(ToString::to_string);
            (location.to_string(), subdirectory)
        }
        None => (raw.to_string(), None),
    }
}

fn split_vcs_reference(rest: &str) -> (String, Option<String>) {
    // the reference follows the last `@` of the path, never one in the userinfo
    let path_start = rest.find("://").map_or(0, |idx| idx + 3);
    let path_start = rest[path_start..]
        .find('/')
        .map_or(rest.len(), |idx| path_start + idx);
    match rest[path_start..].rfind('@') {
        Some(idx) => {
            let split = path_start + idx;
            (rest[..split].to_string(), Some(rest[split + 1..].to_string()))
        }
        None => (rest.to_string(), None),
    }
}
