use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::str::FromStr;

use indexmap::map::Entry;
use indexmap::IndexMap;
use pep440_rs::Version;
use tracing::{debug, warn};

use crate::lockfile::LockData;
use crate::marker::MarkerTree;
use crate::names::canonicalize_name;
use crate::package::{Dependency, DependencyPackage, Package, PackageId};

use super::WalkError;

/// Walks the locked graph breadth-first from `root_requires`.
///
/// Root requirements whose locked package is optional are only followed when
/// one of `extras` activates it through the lock's `[extras]` table. A package
/// reached along several edges is yielded once, its markers joined.
pub fn walk_requirements(
    lock: &LockData,
    root_requires: &[Dependency],
    root_name: &str,
    python_marker: &MarkerTree,
    extras: &BTreeSet<String>,
) -> Result<impl Iterator<Item = DependencyPackage>, WalkError> {
    let root_name = canonicalize_name(root_name);
    let by_name = packages_by_name(lock);
    let activated = extra_package_names(lock, &by_name, extras);

    let mut queue = VecDeque::new();
    for require in root_requires {
        let mut require = require.clone();
        require.marker = require.marker.intersect(python_marker);
        let Some(package) = find_candidate(&by_name, &require) else {
            debug!(requirement = %require.name, "root requirement is not locked");
            continue;
        };
        if package.optional && !activated.contains(&package.name) {
            debug!(package = %package.name, "optional package not activated by extras");
            continue;
        }
        queue.push_back(require);
    }

    let mut visited = HashSet::new();
    let mut decided: IndexMap<PackageId, DependencyPackage> = IndexMap::new();
    while let Some(requirement) = queue.pop_front() {
        if requirement.name == root_name {
            continue;
        }
        if !visited.insert(requirement.to_pep_508(true, false)) {
            continue;
        }

        let mut locked = decided
            .values()
            .map(|entry| &entry.package)
            .find(|package| {
                package.name == requirement.name && requirement.constraint.allows(&package.version)
            })
            .or_else(|| find_candidate(&by_name, &requirement))
            .cloned()
            .ok_or_else(|| WalkError::MissingLockedPackage {
                requirement: requirement.to_pep_508(true, false),
            })?;
        if !requirement.extras.is_empty() {
            locked = locked.with_features(requirement.extras.iter().cloned());
        }

        let mut dependency = locked
            .to_dependency()
            .with_marker(requirement.marker.clone());
        dependency.constraint = requirement.constraint.clone();

        for require in &locked.requires {
            if require.optional && !locked.feature_enables(&require.name) {
                continue;
            }
            let marker = require.marker.intersect(&dependency.marker).without_extras();
            if marker.is_empty() {
                continue;
            }
            queue.push_back(require.clone().with_marker(marker));
        }

        match decided.entry(locked.id()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.dependency.marker = existing.dependency.marker.union(&dependency.marker);
                existing
                    .dependency
                    .extras
                    .extend(locked.features.iter().cloned());
                existing.package.features.extend(locked.features);
            }
            Entry::Vacant(entry) => {
                entry.insert(DependencyPackage::new(dependency, locked));
            }
        }
    }

    debug!(packages = decided.len(), "walked lock graph");
    Ok(decided.into_values())
}

/// Locked packages per canonical name, highest version first.
fn packages_by_name(lock: &LockData) -> HashMap<&str, Vec<&Package>> {
    let mut by_name: HashMap<&str, Vec<&Package>> = HashMap::new();
    for package in lock.packages() {
        by_name.entry(package.name.as_str()).or_default().push(package);
    }
    for candidates in by_name.values_mut() {
        candidates.sort_by(|left, right| compare_versions(&right.version, &left.version));
    }
    by_name
}

fn compare_versions(left: &str, right: &str) -> Ordering {
    match (Version::from_str(left), Version::from_str(right)) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        _ => left.cmp(right),
    }
}

fn find_candidate<'a>(
    by_name: &HashMap<&str, Vec<&'a Package>>,
    requirement: &Dependency,
) -> Option<&'a Package> {
    let candidates = by_name.get(requirement.name.as_str())?;
    if let Some(allowed) = candidates
        .iter()
        .copied()
        .find(|package| requirement.constraint.allows(&package.version))
    {
        return Some(allowed);
    }
    let fallback = candidates.first().copied()?;
    warn!(
        requirement = %requirement.to_pep_508(true, false),
        locked = %fallback.version,
        "no locked version satisfies the requirement, using the newest locked one"
    );
    Some(fallback)
}

/// Names of every locked package reachable from the packages the requested
/// extras list in the lock's top-level `[extras]` table.
fn extra_package_names(
    lock: &LockData,
    by_name: &HashMap<&str, Vec<&Package>>,
    extras: &BTreeSet<String>,
) -> HashSet<String> {
    let mut stack: Vec<String> = extras
        .iter()
        .filter_map(|extra| lock.extras.get(extra))
        .flatten()
        .cloned()
        .collect();
    let mut seen = HashSet::new();
    while let Some(name) = stack.pop() {
        let Some(package) = by_name.get(name.as_str()).and_then(|found| found.first()) else {
            continue;
        };
        if !seen.insert(package.name.clone()) {
            continue;
        }
        stack.extend(package.requires.iter().map(|require| require.name.clone()));
    }
    seen
}
