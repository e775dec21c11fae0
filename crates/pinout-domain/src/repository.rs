//! Package indexes configured for a project and their priority order.

use serde::Serialize;
use url::Url;

pub const PYPI_NAME: &str = "PyPI";
pub const PYPI_SIMPLE_URL: &str = "https://pypi.org/simple";

/// Lower sorts first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Retired poetry priority that outranks every primary source.
    Default,
    #[default]
    Primary,
    Supplemental,
    Explicit,
}

impl Priority {
    /// Accepts the current names plus the retired `default`/`secondary`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "primary" => Some(Self::Primary),
            "supplemental" | "secondary" => Some(Self::Supplemental),
            "explicit" => Some(Self::Explicit),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    name: String,
    url: String,
    priority: Priority,
    credentials: Option<Credentials>,
}

impl Repository {
    pub fn new(name: &str, url: &str, priority: Priority) -> Self {
        Self {
            name: name.to_string(),
            url: url.trim().trim_end_matches('/').to_string(),
            priority,
            credentials: None,
        }
    }

    #[must_use]
    pub fn pypi() -> Self {
        Self::new(PYPI_NAME, PYPI_SIMPLE_URL, Priority::Primary)
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub fn is_pypi(&self) -> bool {
        self.name.eq_ignore_ascii_case("pypi")
    }

    /// Whether packages are served over HTTP(S) by this repository.
    #[must_use]
    pub fn is_http(&self) -> bool {
        Url::parse(&self.url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }

    /// The index URL with credentials embedded, or the plain URL when none
    /// are known.
    #[must_use]
    pub fn authenticated_url(&self) -> String {
        let Some(credentials) = &self.credentials else {
            return self.url.clone();
        };
        let Ok(mut url) = Url::parse(&self.url) else {
            return self.url.clone();
        };
        if url.set_username(&credentials.username).is_err() {
            return self.url.clone();
        }
        let _ = url.set_password(credentials.password.as_deref());
        url.as_str().trim_end_matches('/').to_string()
    }
}

/// Repositories ordered by priority, stable within one priority.
#[derive(Clone, Debug, Default)]
pub struct RepositoryPool {
    repositories: Vec<Repository>,
}

impl RepositoryPool {
    pub fn new(repositories: impl IntoIterator<Item = Repository>) -> Self {
        let mut pool = Self::default();
        for repository in repositories {
            pool.add_repository(repository);
        }
        pool
    }

    pub fn add_repository(&mut self, repository: Repository) {
        let index = self
            .repositories
            .iter()
            .position(|existing| existing.priority > repository.priority)
            .unwrap_or(self.repositories.len());
        self.repositories.insert(index, repository);
    }

    #[must_use]
    pub fn has_primary_repositories(&self) -> bool {
        self.repositories
            .iter()
            .any(|repository| repository.priority <= Priority::Primary)
    }

    /// Every repository, highest priority first.
    pub fn all_repositories(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter()
    }

    /// Repositories consulted without being named explicitly.
    pub fn repositories(&self) -> impl Iterator<Item = &Repository> {
        self.repositories
            .iter()
            .filter(|repository| repository.priority != Priority::Explicit)
    }

    #[must_use]
    pub fn top_priority(&self) -> Option<&Repository> {
        self.repositories().next()
    }

    #[must_use]
    pub fn repository(&self, name: &str) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|repository| repository.name.eq_ignore_ascii_case(name))
    }
}
