//! Keyring configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default origin of the host runtime that loads the keyring.
pub const DEFAULT_HOST_ORIGIN: &str = "metamask";

/// Message attached to the redirect of a queued request.
pub const ASYNC_REDIRECT_MESSAGE: &str = "Redirecting to the keyring dapp to sign the request";

/// Deployment environment, selecting which companion dapp origin is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Published build.
    Production,
}

/// Static configuration of a keyring instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringConfig {
    /// Active environment.
    #[serde(default)]
    pub environment: Environment,
    /// Companion dapp URL used in development.
    #[serde(default)]
    pub dapp_origin_development: Option<String>,
    /// Companion dapp URL prefix used in production.
    #[serde(default)]
    pub dapp_origin_production: Option<String>,
    /// Dapp version appended to the production prefix.
    #[serde(default = "default_version")]
    pub dapp_version: String,
    /// Origin of the host runtime.
    #[serde(default = "default_host_origin")]
    pub host_origin: String,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_host_origin() -> String {
    DEFAULT_HOST_ORIGIN.to_string()
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            dapp_origin_development: None,
            dapp_origin_production: None,
            dapp_version: default_version(),
            host_origin: default_host_origin(),
        }
    }
}

impl KeyringConfig {
    /// Reads the configuration from the process environment.
    ///
    /// `KEYRING_ENV` selects the environment (unknown values fall back to
    /// development), `DAPP_ORIGIN_DEVELOPMENT` / `DAPP_ORIGIN_PRODUCTION` give
    /// the dapp URLs and `KEYRING_HOST_ORIGIN` overrides the host origin.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let environment = var("KEYRING_ENV")
            .and_then(|v| Environment::from_str(&v).ok())
            .unwrap_or_default();
        Self {
            environment,
            dapp_origin_development: var("DAPP_ORIGIN_DEVELOPMENT"),
            dapp_origin_production: var("DAPP_ORIGIN_PRODUCTION"),
            dapp_version: default_version(),
            host_origin: var("KEYRING_HOST_ORIGIN").unwrap_or_else(default_host_origin),
        }
    }

    /// Dapp URL prefix for the active environment.
    #[must_use]
    pub fn dapp_origin(&self) -> Option<&str> {
        match self.environment {
            Environment::Development => self.dapp_origin_development.as_deref(),
            Environment::Production => self.dapp_origin_production.as_deref(),
        }
    }

    /// URL users are sent to for completing a request out of band.
    ///
    /// Production builds pin the dapp version: `{prefix}{version}/`.
    #[must_use]
    pub fn redirect_url(&self) -> String {
        let prefix = self.dapp_origin().unwrap_or_default();
        if self.environment == Environment::Production
            && !prefix.is_empty()
            && !self.dapp_version.is_empty()
        {
            return format!("{prefix}{}/", self.dapp_version);
        }
        prefix.to_string()
    }

    /// Origins of the companion dapp, without trailing slash.
    pub fn dapp_origins(&self) -> impl Iterator<Item = &str> {
        [
            self.dapp_origin_development.as_deref(),
            self.dapp_origin_production.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(|origin| origin.strip_suffix('/').unwrap_or(origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: Environment) -> KeyringConfig {
        KeyringConfig {
            environment,
            dapp_origin_development: Some("http://localhost:8000/".to_string()),
            dapp_origin_production: Some("https://keyring.example/".to_string()),
            dapp_version: "1.2.0".to_string(),
            ..KeyringConfig::default()
        }
    }

    #[test]
    fn test_redirect_url_development() {
        assert_eq!(
            config(Environment::Development).redirect_url(),
            "http://localhost:8000/"
        );
    }

    #[test]
    fn test_redirect_url_production_pins_version() {
        assert_eq!(
            config(Environment::Production).redirect_url(),
            "https://keyring.example/1.2.0/"
        );
    }

    #[test]
    fn test_redirect_url_without_prefix() {
        assert_eq!(KeyringConfig::default().redirect_url(), "");
    }

    #[test]
    fn test_dapp_origins_trim_slash() {
        let config = config(Environment::Development);
        let origins: Vec<_> = config.dapp_origins().collect();
        assert_eq!(origins, ["http://localhost:8000", "https://keyring.example"]);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            Environment::from_str("production").unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("staging").is_err());
    }
}
