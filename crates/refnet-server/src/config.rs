//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use refnet_shared::constants::{APP_NAME, DEFAULT_HTTP_PORT, MAX_BODY_SIZE};

/// Which [`Repository`](refnet_store::Repository) implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local tables, lost on restart.
    Memory,
    /// SQLite file at [`ServerConfig::database_path`].
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown storage backend {other:?}")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Env: `STORAGE_BACKEND` (`memory` | `sqlite`)
    /// Default: `memory`
    pub storage: StorageBackend,

    /// Env: `DATABASE_PATH`
    /// Default: `./refnet.db`
    pub database_path: PathBuf,

    /// Load the demo network into an empty store on startup.
    /// Env: `SEED_SAMPLE_DATA` (true/false)
    /// Default: `true`
    pub seed_sample_data: bool,

    /// Human-readable name for this instance, used in logs.
    /// Env: `INSTANCE_NAME`
    pub instance_name: String,

    /// Largest accepted request body in bytes.
    /// Env: `MAX_BODY_BYTES`
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            storage: StorageBackend::Memory,
            database_path: PathBuf::from("./refnet.db"),
            seed_sample_data: true,
            instance_name: APP_NAME.to_string(),
            max_body_bytes: MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Unparseable
    /// values are logged and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(val) = lookup("STORAGE_BACKEND") {
            match val.parse() {
                Ok(backend) => config.storage = backend,
                Err(e) => tracing::warn!(error = %e, "Invalid STORAGE_BACKEND, using default"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(val) = lookup("SEED_SAMPLE_DATA") {
            config.seed_sample_data = val != "false" && val != "0";
        }

        if let Some(name) = lookup("INSTANCE_NAME").filter(|n| !n.is_empty()) {
            config.instance_name = name;
        }

        if let Some(val) = lookup("MAX_BODY_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_body_bytes = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_BODY_BYTES, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = load(&[]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.seed_sample_data);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HTTP_ADDR", "127.0.0.1:3000"),
            ("STORAGE_BACKEND", "SQLite"),
            ("DATABASE_PATH", "/var/lib/refnet/data.db"),
            ("SEED_SAMPLE_DATA", "0"),
            ("MAX_BODY_BYTES", "4096"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 3000).into());
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/refnet/data.db"));
        assert!(!config.seed_sample_data);
        assert_eq!(config.max_body_bytes, 4096);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = load(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("STORAGE_BACKEND", "postgres"),
            ("MAX_BODY_BYTES", "0"),
        ]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.max_body_bytes, MAX_BODY_SIZE);
    }
}
