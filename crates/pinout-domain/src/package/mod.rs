//! Locked packages, the requirements that point at them, and their sources.

mod dependency;
mod source;

use std::collections::{BTreeMap, BTreeSet};

pub use dependency::Dependency;
pub use source::{absolutize, local_source, path_to_url, PackageSource, SourceKind, VCS_SCHEMES};

use crate::constraint::VersionConstraint;

/// One distribution file recorded for a locked package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageFile {
    pub file: String,
    /// `algorithm:digest`, or a bare digest meaning sha256.
    pub hash: String,
}

/// A concrete locked artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub pretty_name: String,
    pub version: String,
    pub source: PackageSource,
    pub develop: bool,
    pub optional: bool,
    pub python_versions: VersionConstraint,
    pub files: Vec<PackageFile>,
    pub requires: Vec<Dependency>,
    /// Extra name to the canonical names of the requirements it enables.
    pub extras: BTreeMap<String, Vec<String>>,
    /// Extras activated on this package by whoever depends on it.
    pub features: BTreeSet<String>,
}

/// Identity of a locked package across dependency edges.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    pub name: String,
    pub version: String,
    pub source: Option<String>,
}

impl Package {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: crate::names::canonicalize_name(name),
            pretty_name: name.trim().to_string(),
            version: version.trim().to_string(),
            source: PackageSource::default(),
            develop: false,
            optional: false,
            python_versions: VersionConstraint::any(),
            files: Vec::new(),
            requires: Vec::new(),
            extras: BTreeMap::new(),
            features: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> PackageId {
        PackageId {
            name: self.name.clone(),
            version: self.version.clone(),
            source: self.source.url(),
        }
    }

    /// Canonical name followed by the active features, e.g. `requests[socks]`.
    #[must_use]
    pub fn complete_name(&self) -> String {
        if self.features.is_empty() {
            return self.name.clone();
        }
        let features = self.features.iter().cloned().collect::<Vec<_>>().join(",");
        format!("{}[{features}]", self.name)
    }

    #[must_use]
    pub fn source_url(&self) -> Option<String> {
        self.source.url()
    }

    #[must_use]
    pub fn with_features(&self, features: impl IntoIterator<Item = String>) -> Self {
        let mut package = self.clone();
        package.features = features.into_iter().collect();
        package
    }

    #[must_use]
    pub fn without_features(&self) -> Self {
        let mut package = self.clone();
        package.features.clear();
        package
    }

    /// Whether an optional requirement is switched on by an active feature.
    #[must_use]
    pub fn feature_enables(&self, requirement: &str) -> bool {
        self.features.iter().any(|feature| {
            self.extras
                .get(feature)
                .is_some_and(|names| names.iter().any(|name| name == requirement))
        })
    }

    /// A requirement pinned to exactly this package.
    #[must_use]
    pub fn to_dependency(&self) -> Dependency {
        Dependency::new(&self.pretty_name, VersionConstraint::exact(&self.version))
            .with_source(self.source.clone())
            .with_extras(self.features.iter().cloned())
    }
}

/// A requirement together with the locked package that satisfies it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyPackage {
    pub dependency: Dependency,
    pub package: Package,
}

impl DependencyPackage {
    pub fn new(dependency: Dependency, package: Package) -> Self {
        Self {
            dependency,
            package,
        }
    }

    #[must_use]
    pub fn without_features(&self) -> Self {
        Self {
            dependency: self.dependency.without_features(),
            package: self.package.without_features(),
        }
    }
}
