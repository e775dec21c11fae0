#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod constraint;
pub mod lockfile;
pub mod marker;
pub mod names;
pub mod package;
pub mod project;
pub mod repository;
pub mod walker;

pub use constraint::{ConstraintParseError, VersionConstraint};
pub use lockfile::{
    load_lockfile, parse_lockfile, LockData, LockMetadata, LockedMarkers, LockedPackage,
    LOCK_FILENAME,
};
pub use marker::{MarkerExpression, MarkerOperator, MarkerParseError, MarkerTree};
pub use names::{canonicalize_name, split_name_list};
pub use package::{
    path_to_url, Dependency, DependencyPackage, Package, PackageFile, PackageId, PackageSource,
    SourceKind,
};
pub use project::{
    discover_project_root, DependencyGroup, Project, ProjectManifest, DEV_GROUP, MAIN_GROUP,
    MANIFEST_FILENAME,
};
pub use repository::{Credentials, Priority, Repository, RepositoryPool, PYPI_NAME};
pub use walker::{walk_locked_groups, walk_requirements, WalkError};
