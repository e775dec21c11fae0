use std::collections::BTreeSet;

use tracing::debug;

use crate::lockfile::LockData;
use crate::marker::MarkerTree;
use crate::package::DependencyPackage;

use super::WalkError;

/// Lazily yields every locked package that belongs to one of `groups` and
/// whose marker survives the requested `extras`.
///
/// Yielded dependencies pin the locked version and carry the group marker
/// with `extra` clauses removed, intersected with `python_marker`.
pub fn walk_locked_groups<'a>(
    lock: &'a LockData,
    python_marker: &MarkerTree,
    groups: &BTreeSet<String>,
    extras: &BTreeSet<String>,
) -> Result<impl Iterator<Item = DependencyPackage> + 'a, WalkError> {
    if !lock.is_locked_groups_and_markers() {
        return Err(WalkError::GroupsAndMarkersUnavailable {
            version: lock.metadata.lock_version.clone(),
        });
    }
    let python_marker = python_marker.clone();
    let groups = groups.clone();
    let extras = extras.clone();

    Ok(lock.packages.iter().filter_map(move |locked| {
        if locked.groups.is_disjoint(&groups) {
            return None;
        }
        let marker = locked.marker_for(&groups);
        if !marker.validate_extras(&extras) {
            debug!(package = %locked.package.name, "marker excluded by requested extras");
            return None;
        }
        let marker = python_marker.intersect(&marker.without_extras());
        let dependency = locked.package.to_dependency().with_marker(marker);
        Some(DependencyPackage::new(dependency, locked.package.clone()))
    }))
}
