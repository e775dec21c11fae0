use std::collections::BTreeSet;
use std::str::FromStr;

use anyhow::{Context, Result};
use pep508_rs::{Requirement as PepRequirement, VersionOrUrl};

use crate::constraint::VersionConstraint;
use crate::marker::MarkerTree;
use crate::names::canonicalize_name;

use super::source::{path_to_url, PackageSource};

/// A requirement as declared: by the project, or by a locked package on one
/// of its own dependencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub pretty_name: String,
    pub constraint: VersionConstraint,
    pub extras: BTreeSet<String>,
    pub source: PackageSource,
    pub marker: MarkerTree,
    pub optional: bool,
    pub groups: BTreeSet<String>,
}

impl Dependency {
    pub fn new(name: &str, constraint: VersionConstraint) -> Self {
        Self {
            name: canonicalize_name(name),
            pretty_name: name.trim().to_string(),
            constraint,
            extras: BTreeSet::new(),
            source: PackageSource::default(),
            marker: MarkerTree::Any,
            optional: false,
            groups: BTreeSet::new(),
        }
    }

    /// Parses a PEP 508 requirement string such as
    /// `requests[socks]>=2.31 ; python_version >= "3.8"`.
    pub fn from_pep508(spec: &str) -> Result<Self> {
        let requirement = PepRequirement::from_str(spec.trim())
            .with_context(|| format!("invalid requirement `{spec}`"))?;
        let name = requirement.name.to_string();
        let pretty = declared_name(spec);
        let name = if canonicalize_name(pretty) == canonicalize_name(&name) {
            pretty.to_string()
        } else {
            name
        };
        let mut dependency = Self::new(&name, VersionConstraint::any());
        dependency.extras = requirement
            .extras
            .iter()
            .map(|extra| canonicalize_name(&extra.to_string()))
            .collect();
        match &requirement.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => {
                dependency.constraint = VersionConstraint::parse(&specifiers.to_string())?;
            }
            Some(VersionOrUrl::Url(url)) => {
                dependency.source = PackageSource::from_direct_url(&url.to_string());
            }
            None => {}
        }
        if let Some(marker) = &requirement.marker {
            dependency.marker = MarkerTree::parse(&marker.to_string())?;
        }
        Ok(dependency)
    }

    #[must_use]
    pub fn with_extras(mut self, extras: impl IntoIterator<Item = String>) -> Self {
        self.extras = extras.into_iter().map(|extra| canonicalize_name(&extra)).collect();
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: MarkerTree) -> Self {
        self.marker = marker;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: PackageSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn without_features(&self) -> Self {
        let mut stripped = self.clone();
        stripped.extras.clear();
        stripped
    }

    /// Source location of the requirement: index URL, remote URL, or local path.
    #[must_use]
    pub fn source_url(&self) -> Option<String> {
        self.source.url()
    }

    /// Renders the requirement as PEP 508 text. With `resolved`, VCS
    /// references pin the locked commit instead of the requested ref.
    #[must_use]
    pub fn to_pep_508(&self, with_extras: bool, resolved: bool) -> String {
        let mut requirement = self.pretty_name.clone();
        if with_extras && !self.extras.is_empty() {
            requirement.push('[');
            requirement.push_str(&self.extras.iter().cloned().collect::<Vec<_>>().join(","));
            requirement.push(']');
        }
        match &self.source {
            PackageSource::Registry { .. } => {
                if !self.constraint.is_any() {
                    requirement.push_str(&self.constraint.to_pep440());
                }
            }
            PackageSource::Vcs {
                vcs,
                url,
                reference,
                resolved_reference,
                subdirectory,
            } => {
                requirement.push_str(&format!(" @ {vcs}+{url}"));
                let reference = if resolved {
                    resolved_reference.as_ref().or(reference.as_ref())
                } else {
                    reference.as_ref()
                };
                if let Some(reference) = reference.filter(|value| !value.is_empty()) {
                    requirement.push('@');
                    requirement.push_str(reference);
                }
                push_subdirectory(&mut requirement, subdirectory.as_deref());
            }
            PackageSource::Url { url, subdirectory } => {
                requirement.push_str(&format!(" @ {url}"));
                push_subdirectory(&mut requirement, subdirectory.as_deref());
            }
            PackageSource::File { path } | PackageSource::Directory { path } => {
                let location = path_to_url(path)
                    .map_or_else(|| path.to_string_lossy().into_owned(), String::from);
                requirement.push_str(&format!(" @ {location}"));
            }
        }
        if !self.marker.is_any() {
            requirement.push_str(" ; ");
            requirement.push_str(&self.marker.to_string());
        }
        requirement
    }
}

/// The name exactly as spelled at the start of a requirement string.
fn declared_name(spec: &str) -> &str {
    let trimmed = spec.trim();
    let end = trimmed
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

fn push_subdirectory(requirement: &mut String, subdirectory: Option<&str>) {
    if let Some(subdirectory) = subdirectory.filter(|value| !value.is_empty()) {
        requirement.push_str("#subdirectory=");
        requirement.push_str(subdirectory);
    }
}
