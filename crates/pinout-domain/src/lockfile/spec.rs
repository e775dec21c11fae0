//! Poetry-style requirement entries, shared by `poetry.lock` and the
//! `[tool.poetry]` manifest tables:
//!
//! ```toml
//! requests = ">=2.31"
//! rich = { version = "^13", extras = ["jupyter"], markers = "python_version >= '3.8'" }
//! demo = { git = "https://github.com/org/demo.git", rev = "main" }
//! numpy = [{ version = "<2", python = "<3.9" }, { version = ">=2", python = ">=3.9" }]
//! ```

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use toml_edit::{Item, TableLike, Value};

use crate::constraint::VersionConstraint;
use crate::marker::MarkerTree;
use crate::names::canonicalize_name;
use crate::package::{absolutize, local_source, Dependency, PackageSource, VCS_SCHEMES};

/// Reads one entry; array entries yield one requirement per alternative.
pub(crate) fn dependencies_from_item(
    name: &str,
    item: &Item,
    root: &Path,
) -> Result<Vec<Dependency>> {
    if let Some(array) = item.as_array() {
        return array
            .iter()
            .map(|value| dependency_from_value(name, value, root))
            .collect();
    }
    if let Some(table) = item.as_table_like() {
        return Ok(vec![dependency_from_table(name, table, root)?]);
    }
    match item.as_value() {
        Some(value) => Ok(vec![dependency_from_value(name, value, root)?]),
        None => Err(anyhow!("dependency `{name}` has an unsupported shape")),
    }
}

fn dependency_from_value(name: &str, value: &Value, root: &Path) -> Result<Dependency> {
    if let Some(constraint) = value.as_str() {
        let constraint = VersionConstraint::parse(constraint)
            .with_context(|| format!("dependency `{name}`"))?;
        return Ok(Dependency::new(name, constraint));
    }
    if let Some(table) = value.as_inline_table() {
        return dependency_from_table(name, table, root);
    }
    Err(anyhow!("dependency `{name}` has an unsupported shape"))
}

fn dependency_from_table(name: &str, table: &dyn TableLike, root: &Path) -> Result<Dependency> {
    let constraint = match str_field(table, "version") {
        Some(raw) => {
            VersionConstraint::parse(raw).with_context(|| format!("dependency `{name}`"))?
        }
        None => VersionConstraint::any(),
    };
    let mut dependency = Dependency::new(name, constraint)
        .with_extras(string_list(table, "extras"))
        .with_source(source_from_table(table, root));
    dependency.optional = table
        .get("optional")
        .and_then(Item::as_bool)
        .unwrap_or(false);

    let mut marker = match str_field(table, "markers") {
        Some(raw) => MarkerTree::parse(raw).with_context(|| format!("dependency `{name}`"))?,
        None => MarkerTree::Any,
    };
    if let Some(python) = str_field(table, "python") {
        let python = VersionConstraint::parse(python)
            .with_context(|| format!("dependency `{name}` python constraint"))?;
        marker = marker.intersect(&python.to_python_marker());
    }
    dependency.marker = marker;
    Ok(dependency)
}

fn source_from_table(table: &dyn TableLike, root: &Path) -> PackageSource {
    for vcs in VCS_SCHEMES {
        if let Some(url) = str_field(table, vcs) {
            let reference = ["rev", "tag", "branch"]
                .iter()
                .find_map(|key| str_field(table, key))
                .map(ToString::to_string);
            return PackageSource::Vcs {
                vcs: vcs.to_string(),
                url: url.to_string(),
                reference,
                resolved_reference: None,
                subdirectory: str_field(table, "subdirectory").map(ToString::to_string),
            };
        }
    }
    if let Some(url) = str_field(table, "url") {
        return PackageSource::Url {
            url: url.to_string(),
            subdirectory: str_field(table, "subdirectory").map(ToString::to_string),
        };
    }
    if let Some(path) = str_field(table, "path") {
        return local_source(absolutize(root, Path::new(path)));
    }
    PackageSource::Registry {
        url: None,
        reference: str_field(table, "source").map(ToString::to_string),
    }
}

pub(crate) fn str_field<'a>(table: &'a dyn TableLike, key: &str) -> Option<&'a str> {
    table.get(key).and_then(Item::as_str)
}

pub(crate) fn string_list(table: &dyn TableLike, key: &str) -> Vec<String> {
    table
        .get(key)
        .and_then(Item::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Name of a requirement written as `Name[extra] (>=1.0)` or `name>=1`.
pub(crate) fn requirement_name(spec: &str) -> String {
    let trimmed = crate::names::strip_wrapping_quotes(spec.trim());
    let end = trimmed
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
        .unwrap_or(trimmed.len());
    canonicalize_name(&trimmed[..end])
}
