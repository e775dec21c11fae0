use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use toml_edit::{DocumentMut, Item, TableLike, Value};

use crate::constraint::VersionConstraint;
use crate::marker::MarkerTree;
use crate::names::canonicalize_name;
use crate::package::{absolutize, Package, PackageFile, PackageSource, VCS_SCHEMES};

use super::spec::{dependencies_from_item, requirement_name, str_field, string_list};
use super::types::{LockData, LockMetadata, LockedMarkers, LockedPackage};

/// Loads a lock file; relative local paths are resolved against `root`.
pub fn load_lockfile(path: &Path, root: &Path) -> Result<LockData> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_lockfile(&contents, root).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn parse_lockfile(contents: &str, root: &Path) -> Result<LockData> {
    let doc: DocumentMut = contents.parse().context("lock file is not valid TOML")?;
    let metadata = parse_metadata(&doc)?;

    let mut packages = Vec::new();
    if let Some(tables) = doc.get("package").and_then(Item::as_array_of_tables) {
        for table in tables.iter() {
            packages.push(parse_package(table, root)?);
        }
    }

    // lock files before 2.0 kept hashes in a separate table
    if let Some(files) = doc
        .get("metadata")
        .and_then(|item| item.get("files"))
        .and_then(Item::as_table_like)
    {
        for (name, item) in files.iter() {
            let name = canonicalize_name(name);
            let entries = files_from_item(item);
            for locked in &mut packages {
                if locked.package.name == name && locked.package.files.is_empty() {
                    locked.package.files.clone_from(&entries);
                }
            }
        }
    }

    let mut extras = BTreeMap::new();
    if let Some(table) = doc.get("extras").and_then(Item::as_table_like) {
        for (extra, item) in table.iter() {
            let names = item
                .as_array()
                .map(|array| {
                    array
                        .iter()
                        .filter_map(Value::as_str)
                        .map(requirement_name)
                        .collect()
                })
                .unwrap_or_default();
            extras.insert(canonicalize_name(extra), names);
        }
    }

    Ok(LockData {
        metadata,
        packages,
        extras,
    })
}

fn parse_metadata(doc: &DocumentMut) -> Result<LockMetadata> {
    let Some(table) = doc.get("metadata").and_then(Item::as_table_like) else {
        return Ok(LockMetadata::default());
    };
    let lock_version = match table.get("lock-version") {
        Some(item) => item
            .as_str()
            .map(ToString::to_string)
            .or_else(|| item.as_float().map(|value| value.to_string()))
            .or_else(|| item.as_integer().map(|value| value.to_string()))
            .ok_or_else(|| anyhow!("metadata.lock-version must be a string"))?,
        None => String::new(),
    };
    let python_versions = str_field(table, "python-versions")
        .map(VersionConstraint::parse)
        .transpose()
        .context("metadata.python-versions")?;
    Ok(LockMetadata {
        lock_version,
        python_versions,
        content_hash: str_field(table, "content-hash").map(ToString::to_string),
    })
}

fn parse_package(table: &dyn TableLike, root: &Path) -> Result<LockedPackage> {
    let name = str_field(table, "name").ok_or_else(|| anyhow!("locked package without a name"))?;
    let version = str_field(table, "version")
        .ok_or_else(|| anyhow!("locked package `{name}` has no version"))?;
    let context = || format!("locked package `{name}`");

    let mut package = Package::new(name, version);
    package.optional = table.get("optional").and_then(Item::as_bool).unwrap_or(false);
    package.develop = table.get("develop").and_then(Item::as_bool).unwrap_or(false);
    package.python_versions = match str_field(table, "python-versions") {
        Some(raw) => VersionConstraint::parse(raw).unwrap_or_else(|_| VersionConstraint::any()),
        None => VersionConstraint::any(),
    };
    package.files = table.get("files").map(files_from_item).unwrap_or_default();
    package.source = match table.get("source").and_then(Item::as_table_like) {
        Some(source) => parse_source(source, root).with_context(context)?,
        None => PackageSource::default(),
    };

    if let Some(dependencies) = table.get("dependencies").and_then(Item::as_table_like) {
        for (dep_name, item) in dependencies.iter() {
            package
                .requires
                .extend(dependencies_from_item(dep_name, item, root).with_context(context)?);
        }
    }
    if let Some(extras) = table.get("extras").and_then(Item::as_table_like) {
        for (extra, item) in extras.iter() {
            let names = item
                .as_array()
                .map(|array| {
                    array
                        .iter()
                        .filter_map(Value::as_str)
                        .map(requirement_name)
                        .collect()
                })
                .unwrap_or_default();
            package.extras.insert(canonicalize_name(extra), names);
        }
    }

    let groups: BTreeSet<String> = string_list(table, "groups")
        .iter()
        .map(|group| canonicalize_name(group))
        .collect();
    let markers = parse_markers(table.get("markers")).with_context(context)?;

    Ok(LockedPackage {
        package,
        groups,
        markers,
    })
}

fn parse_source(table: &dyn TableLike, root: &Path) -> Result<PackageSource> {
    let kind = str_field(table, "type").unwrap_or("legacy");
    let url = str_field(table, "url").map(ToString::to_string);
    let reference = str_field(table, "reference")
        .filter(|value| !value.is_empty())
        .map(ToString::to_string);
    let subdirectory = str_field(table, "subdirectory").map(ToString::to_string);
    let require_url = || url.clone().ok_or_else(|| anyhow!("`{kind}` source without url"));

    Ok(match kind {
        "file" => PackageSource::File {
            path: absolutize(root, Path::new(&require_url()?)),
        },
        "directory" => PackageSource::Directory {
            path: absolutize(root, Path::new(&require_url()?)),
        },
        "url" => PackageSource::Url {
            url: require_url()?,
            subdirectory,
        },
        vcs if VCS_SCHEMES.contains(&vcs) => PackageSource::Vcs {
            vcs: vcs.to_string(),
            url: require_url()?,
            reference,
            resolved_reference: str_field(table, "resolved_reference").map(ToString::to_string),
            subdirectory,
        },
        _ => PackageSource::Registry { url, reference },
    })
}

fn parse_markers(item: Option<&Item>) -> Result<LockedMarkers> {
    let Some(item) = item else {
        return Ok(LockedMarkers::Unspecified);
    };
    if let Some(raw) = item.as_str() {
        return Ok(LockedMarkers::All(MarkerTree::parse(raw)?));
    }
    let table = item
        .as_table_like()
        .ok_or_else(|| anyhow!("markers must be a string or a table"))?;
    let mut per_group = BTreeMap::new();
    for (group, value) in table.iter() {
        let raw = value
            .as_str()
            .ok_or_else(|| anyhow!("marker for group `{group}` must be a string"))?;
        per_group.insert(canonicalize_name(group), MarkerTree::parse(raw)?);
    }
    Ok(LockedMarkers::PerGroup(per_group))
}

fn files_from_item(item: &Item) -> Vec<PackageFile> {
    let Some(array) = item.as_array() else {
        return Vec::new();
    };
    array
        .iter()
        .filter_map(Value::as_inline_table)
        .filter_map(|entry| {
            let hash = entry.get("hash").and_then(Value::as_str)?;
            let file = entry.get("file").and_then(Value::as_str).unwrap_or_default();
            Some(PackageFile {
                file: file.to_string(),
                hash: hash.to_string(),
            })
        })
        .collect()
}
