pub(crate) mod io;
pub(crate) mod spec;
pub(crate) mod types;

pub use io::{load_lockfile, parse_lockfile};
pub use types::{
    LockData, LockMetadata, LockedMarkers, LockedPackage, GROUPS_AND_MARKERS_VERSION,
    LOCK_FILENAME,
};

impl LockData {
    /// Reads `poetry.lock` at `path`, resolving local sources against `root`.
    pub fn load(path: &std::path::Path, root: &std::path::Path) -> anyhow::Result<Self> {
        io::load_lockfile(path, root)
    }

    pub fn parse(contents: &str, root: &std::path::Path) -> anyhow::Result<Self> {
        io::parse_lockfile(contents, root)
    }
}
