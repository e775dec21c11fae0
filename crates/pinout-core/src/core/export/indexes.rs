use std::collections::BTreeSet;

use pinout_domain::{Repository, RepositoryPool};
use url::Url;

/// `--index-url` / `--extra-index-url` / `--trusted-host` lines for the
/// repositories that supplied at least one exported package.
///
/// Repositories are visited in priority order, so the primary index comes
/// first. Without a repository named `pypi`, the top-priority repository
/// replaces the default index.
pub(crate) fn index_header(
    pool: &RepositoryPool,
    indexes: &BTreeSet<String>,
    with_credentials: bool,
) -> String {
    let has_pypi = pool.all_repositories().any(Repository::is_pypi);
    let top = pool.top_priority().map(Repository::name);

    let mut header = String::new();
    for repository in pool.all_repositories() {
        if !repository.is_http() || !indexes.contains(repository.url()) {
            continue;
        }
        let url = if with_credentials {
            repository.authenticated_url()
        } else {
            repository.url().to_string()
        };
        if let Some(host) = insecure_netloc(&url) {
            header.push_str(&format!("--trusted-host {host}\n"));
        }
        if !has_pypi && top == Some(repository.name()) {
            header.push_str(&format!("--index-url {url}\n"));
        } else {
            header.push_str(&format!("--extra-index-url {url}\n"));
        }
    }
    header
}

/// Network location of a plain-HTTP URL, credentials included.
fn insecure_netloc(url: &str) -> Option<&str> {
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "http" {
        return None;
    }
    let (_, rest) = url.split_once("://")?;
    rest.split(['/', '?', '#']).next()
}
