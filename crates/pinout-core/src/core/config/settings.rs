use std::collections::HashMap;
use std::env;

use pinout_domain::Credentials;
use serde::{Deserialize, Serialize};

/// Prefixes checked, in order, for `<PREFIX><NAME>_USERNAME` / `_PASSWORD`.
const CREDENTIAL_PREFIXES: [&str; 2] = ["PINOUT_HTTP_BASIC_", "POETRY_HTTP_BASIC_"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub no_color: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) credentials: CredentialConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_snapshot(EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: EnvSnapshot) -> Self {
        Self {
            credentials: CredentialConfig { env: snapshot },
        }
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialConfig {
        &self.credentials
    }
}

/// HTTP basic credentials for package sources, read from the environment.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    env: EnvSnapshot,
}

impl CredentialConfig {
    /// Credentials for the source called `repository`, if a username is set.
    #[must_use]
    pub fn lookup(&self, repository: &str) -> Option<Credentials> {
        let key = credential_key(repository);
        CREDENTIAL_PREFIXES.iter().find_map(|prefix| {
            let username = self
                .env
                .var(&format!("{prefix}{key}_USERNAME"))
                .filter(|value| !value.is_empty())?;
            let password = self
                .env
                .var(&format!("{prefix}{key}_PASSWORD"))
                .map(ToString::to_string);
            Some(Credentials {
                username: username.to_string(),
                password,
            })
        })
    }
}

/// `my-repo.internal` becomes `MY_REPO_INTERNAL`.
fn credential_key(repository: &str) -> String {
    repository
        .trim()
        .chars()
        .map(|ch| match ch {
            '-' | '.' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_prefer_pinout_variables() {
        let config = Config::from_snapshot(EnvSnapshot::testing(&[
            ("PINOUT_HTTP_BASIC_MY_REPO_USERNAME", "alice"),
            ("PINOUT_HTTP_BASIC_MY_REPO_PASSWORD", "wonderland"),
            ("POETRY_HTTP_BASIC_MY_REPO_USERNAME", "bob"),
        ]));
        assert_eq!(
            config.credentials().lookup("my-repo"),
            Some(Credentials {
                username: "alice".into(),
                password: Some("wonderland".into()),
            })
        );
    }

    #[test]
    fn credentials_fall_back_to_poetry_variables() {
        let config = Config::from_snapshot(EnvSnapshot::testing(&[(
            "POETRY_HTTP_BASIC_PKGS_EXAMPLE_USERNAME",
            "ci",
        )]));
        assert_eq!(
            config.credentials().lookup("pkgs.example"),
            Some(Credentials {
                username: "ci".into(),
                password: None,
            })
        );
        assert_eq!(config.credentials().lookup("other"), None);
    }

    #[test]
    fn empty_username_means_no_credentials() {
        let config = Config::from_snapshot(EnvSnapshot::testing(&[(
            "PINOUT_HTTP_BASIC_PRIVATE_USERNAME",
            "",
        )]));
        assert_eq!(config.credentials().lookup("private"), None);
    }
}
