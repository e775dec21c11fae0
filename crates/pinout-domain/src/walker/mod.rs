//! Turning a lock into the `(requirement, locked package)` pairs an export
//! prints.
//!
//! Locks that record groups and markers per package are read directly by
//! [`walk_locked_groups`]. Older locks only record the graph, which
//! [`walk_requirements`] walks from the project's root requirements.

mod groups;
mod requirements;

pub use groups::walk_locked_groups;
pub use requirements::walk_requirements;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WalkError {
    #[error("dependency walk failed at `{requirement}`: no locked package satisfies it")]
    MissingLockedPackage { requirement: String },
    #[error("lock version `{version}` does not record groups and markers")]
    GroupsAndMarkersUnavailable { version: String },
}
