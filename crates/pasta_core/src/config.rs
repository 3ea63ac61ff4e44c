//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_CORS_ORIGIN, DEFAULT_DATA_DIR, DEFAULT_MAX_PASTE_SIZE, DEFAULT_MAX_TRACKED_CLIENTS,
    DEFAULT_PORT, DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW_SECS,
};
use crate::ident::IdentifierMode;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Backing store used for persisted pastes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One file per paste under the data directory.
    #[default]
    Fs,
    /// A single redb database file under the data directory.
    Redb,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fs" | "file" | "files" | "filesystem" => Ok(Self::Fs),
            "redb" | "db" | "database" => Ok(Self::Redb),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fs => f.write_str("fs"),
            Self::Redb => f.write_str("redb"),
        }
    }
}

/// Runtime configuration for Pasta.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data_dir: String,
    pub storage: StorageBackend,
    pub port: u16,
    pub bind: Option<SocketAddr>,
    pub base_url: Option<String>,
    pub shared_secret: Option<String>,
    pub max_paste_bytes: usize,
    pub rate_limit: u32,
    pub rate_window_secs: u64,
    pub max_tracked_clients: usize,
    pub identifier_mode: IdentifierMode,
    pub cors_origins: Vec<String>,
    pub trust_forwarded_for: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            storage: StorageBackend::default(),
            port: DEFAULT_PORT,
            bind: None,
            base_url: None,
            shared_secret: None,
            max_paste_bytes: DEFAULT_MAX_PASTE_SIZE,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window_secs: DEFAULT_RATE_WINDOW_SECS,
            max_tracked_clients: DEFAULT_MAX_TRACKED_CLIENTS,
            identifier_mode: IdentifierMode::default(),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            trust_forwarded_for: false,
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}


fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_enum_or<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr<Err = String> + fmt::Display,
{
    match non_empty(value) {
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            tracing::warn!("Invalid {}='{}': {}. Using {}", name, raw, err, default);
            default
        }),
        None => default,
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unset or unparsable values fall back to their defaults.
    ///
    /// # Arguments
    /// - `lookup`: Returns the raw value for a variable name, if set.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let port = lookup("PORT")
            .or_else(|| lookup("SERVER_PORT"))
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);
        let bind = non_empty(lookup("BIND")).and_then(|raw| match raw.parse::<SocketAddr>() {
            Ok(addr) => Some(addr),
            Err(err) => {
                tracing::warn!("Invalid BIND='{}': {}. Using 0.0.0.0:{}", raw, err, port);
                None
            }
        });
        let cors_origins = non_empty(lookup("CORS_ORIGINS"))
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Self {
            data_dir: non_empty(lookup("DATA_DIR")).unwrap_or(defaults.data_dir),
            storage: parse_enum_or("STORAGE", lookup("STORAGE"), defaults.storage),
            port,
            bind,
            base_url: non_empty(lookup("BASE_URL")).map(|url| url.trim_end_matches('/').to_string()),
            shared_secret: non_empty(lookup("PASTA_SECRET")),
            max_paste_bytes: parse_or(lookup("MAX_PASTE_SIZE"), defaults.max_paste_bytes),
            rate_limit: parse_or(lookup("RATE_LIMIT"), defaults.rate_limit),
            rate_window_secs: parse_or(lookup("RATE_WINDOW_SECS"), defaults.rate_window_secs),
            max_tracked_clients: parse_or(
                lookup("RATE_MAX_CLIENTS"),
                defaults.max_tracked_clients,
            ),
            identifier_mode: parse_enum_or("ID_MODE", lookup("ID_MODE"), defaults.identifier_mode),
            cors_origins,
            trust_forwarded_for: lookup("TRUST_FORWARDED_FOR")
                .and_then(|v| parse_env_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Rate-limit window as a [`Duration`].
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    /// Address the HTTP listener binds to.
    ///
    /// Defaults to all interfaces on the configured port.
    pub fn bind_address(&self) -> SocketAddr {
        self.bind
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], self.port)))
    }
}
