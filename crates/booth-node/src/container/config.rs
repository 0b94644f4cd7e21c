//! # Node Configuration
//!
//! Defaults, environment overrides and validation for the booth runtime.
//!
//! ## Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VG_STORAGE` | `storage.backend` (`memory` or `rocksdb`) |
//! | `VG_DATA_DIR` | `storage.data_dir` |
//! | `VG_SYNC_WRITES` | `storage.sync_writes` |
//! | `VG_LOG_LEVEL` | `logging.level` |
//! | `VG_JSON_LOGS` | `logging.json` |
//! | `VG_SEED_DEMO` | `seed_demo` |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use vg_01_token_verification::VerificationConfig;

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Verification pipeline configuration.
    pub verification: VerificationConfig,
    /// Register the demo voter, election and token at startup.
    pub seed_demo: bool,
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("VG_STORAGE") {
            self.storage.backend = parse("VG_STORAGE", &value)?;
        }
        if let Some(value) = lookup("VG_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("VG_SYNC_WRITES") {
            self.storage.sync_writes = parse_bool("VG_SYNC_WRITES", &value)?;
        }
        if let Some(value) = lookup("VG_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = lookup("VG_JSON_LOGS") {
            self.logging.json = parse_bool("VG_JSON_LOGS", &value)?;
        }
        if let Some(value) = lookup("VG_SEED_DEMO") {
            self.seed_demo = parse_bool("VG_SEED_DEMO", &value)?;
        }
        Ok(())
    }

    /// Check the configuration can be started with this build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::RocksDb {
            if !cfg!(feature = "rocksdb") {
                return Err(ConfigError::BackendNotCompiled("rocksdb"));
            }
            if self.storage.data_dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "data_dir must be set for the rocksdb backend".to_string(),
                ));
            }
        }
        if self.verification.audit_backlog_capacity == 0 {
            return Err(ConfigError::Invalid(
                "audit_backlog_capacity must be at least 1".to_string(),
            ));
        }
        if self.verification.max_credential_len == 0 {
            return Err(ConfigError::Invalid(
                "max_credential_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },

    #[error("storage backend {0} is not compiled into this build")]
    BackendNotCompiled(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn parse<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

/// Where verification state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; lost on exit.
    #[default]
    Memory,
    /// RocksDB under `data_dir`.
    RocksDb,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            _ => Err(()),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to open at startup.
    pub backend: StorageBackend,
    /// Data directory for the RocksDB backend.
    pub data_dir: PathBuf,
    /// fsync on every commit.
    pub sync_writes: bool,
    /// Row lock wait before a ledger write counts as a conflict.
    pub lock_timeout_ms: i64,
    /// Conflict retries before a scan fails as storage unavailable.
    pub max_conflict_retries: u32,
    /// Base backoff between conflict retries.
    pub retry_backoff_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
            lock_timeout_ms: 1_000,
            max_conflict_retries: 5,
            retry_backoff_ms: 10,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
