//! Edge server configuration.

use std::path::PathBuf;

use session::{ConfigError, RouteGuardConfig};

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the storefront's static build.
    pub site_dir: PathBuf,
    pub route_guard: RouteGuardConfig,
}

impl ServerConfig {
    /// Build from process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SITE_DIR`: default `site/` next to this crate's manifest
    /// - every variable read by [`RouteGuardConfig::from_env`]
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `PORT` is not a valid port or the route
    /// guard settings are malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let site_dir = lookup("SITE_DIR")
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty())
            .map_or_else(default_site_dir, PathBuf::from);

        Ok(Self { port, site_dir, route_guard: RouteGuardConfig::from_lookup(&lookup)? })
    }
}

fn default_site_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("site")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
