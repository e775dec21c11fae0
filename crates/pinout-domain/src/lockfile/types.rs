use std::collections::{BTreeMap, BTreeSet};

use crate::constraint::VersionConstraint;
use crate::marker::MarkerTree;
use crate::package::Package;

pub const LOCK_FILENAME: &str = "poetry.lock";

/// First lock version recording per-package groups and markers.
pub const GROUPS_AND_MARKERS_VERSION: (u64, u64) = (2, 1);

#[derive(Clone, Debug, Default)]
pub struct LockMetadata {
    pub lock_version: String,
    pub python_versions: Option<VersionConstraint>,
    pub content_hash: Option<String>,
}

/// Which environments a locked package applies to, per dependency group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LockedMarkers {
    #[default]
    Unspecified,
    All(MarkerTree),
    PerGroup(BTreeMap<String, MarkerTree>),
}

#[derive(Clone, Debug)]
pub struct LockedPackage {
    pub package: Package,
    pub groups: BTreeSet<String>,
    pub markers: LockedMarkers,
}

impl LockedPackage {
    /// Union of the markers of every selected group the package belongs to.
    #[must_use]
    pub fn marker_for(&self, groups: &BTreeSet<String>) -> MarkerTree {
        match &self.markers {
            LockedMarkers::Unspecified => MarkerTree::Any,
            LockedMarkers::All(marker) => marker.clone(),
            LockedMarkers::PerGroup(per_group) => self
                .groups
                .intersection(groups)
                .map(|group| per_group.get(group).cloned().unwrap_or(MarkerTree::Any))
                .fold(MarkerTree::Empty, |acc, marker| acc.union(&marker)),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LockData {
    pub metadata: LockMetadata,
    pub packages: Vec<LockedPackage>,
    /// Top-level `[extras]` table of older locks: extra name to package names.
    pub extras: BTreeMap<String, Vec<String>>,
}

impl LockData {
    /// Whether the lock carries per-package groups and markers, allowing the
    /// graph to be read without walking it.
    #[must_use]
    pub fn is_locked_groups_and_markers(&self) -> bool {
        parse_lock_version(&self.metadata.lock_version)
            .is_some_and(|version| version >= GROUPS_AND_MARKERS_VERSION)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().map(|locked| &locked.package)
    }
}

fn parse_lock_version(raw: &str) -> Option<(u64, u64)> {
    let mut parts = raw.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |part| part.parse().ok())?;
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_with_version(version: &str) -> LockData {
        LockData {
            metadata: LockMetadata {
                lock_version: version.to_string(),
                ..LockMetadata::default()
            },
            ..LockData::default()
        }
    }

    #[test]
    fn groups_and_markers_start_at_2_1() {
        assert!(!lock_with_version("1.1").is_locked_groups_and_markers());
        assert!(!lock_with_version("2.0").is_locked_groups_and_markers());
        assert!(lock_with_version("2.1").is_locked_groups_and_markers());
        assert!(lock_with_version("3").is_locked_groups_and_markers());
        assert!(!lock_with_version("").is_locked_groups_and_markers());
    }

    #[test]
    fn per_group_markers_union_over_selection() {
        let mut per_group = BTreeMap::new();
        per_group.insert(
            "main".to_string(),
            MarkerTree::parse("sys_platform == 'win32'").expect("marker"),
        );
        per_group.insert(
            "dev".to_string(),
            MarkerTree::parse("sys_platform == 'linux'").expect("marker"),
        );
        let locked = LockedPackage {
            package: Package::new("colorama", "0.4.6"),
            groups: ["main", "dev"].iter().map(ToString::to_string).collect(),
            markers: LockedMarkers::PerGroup(per_group),
        };
        let main_only: BTreeSet<String> = ["main".to_string()].into_iter().collect();
        assert_eq!(
            locked.marker_for(&main_only).to_string(),
            "sys_platform == \"win32\""
        );
        let both: BTreeSet<String> = ["main", "dev"].iter().map(ToString::to_string).collect();
        assert_eq!(
            locked.marker_for(&both).to_string(),
            "sys_platform == \"linux\" or sys_platform == \"win32\""
        );
    }
}
