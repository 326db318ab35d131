//! Adapter configuration types.
//!
//! [`AdapterConfig`] is the single source of truth for adapter behaviour.  It
//! can be built in code, loaded from a TOML file, or assembled from CLI
//! arguments by the `sluice-invoke` binary.
//!
//! ```toml
//! lifespan = true
//! protocol_version = 3
//! shutdown_policy = "after_each_request"
//! debug = false
//! log_level = "info"
//! ```
//!
//! Every field has a serde default, so an empty file is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sluice_core::ProtocolVersion;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Serialize(_) => "config_serialize",
        }
    }
}

/// When the lifespan shutdown handshake runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Request shutdown at the tail of every successful invocation.  The first
    /// request runs the handshake; later ones find the signal already set and
    /// return immediately.
    #[default]
    AfterEachRequest,
    /// Request shutdown once, when the adapter is shut down or dropped.
    OnDrop,
}

/// All runtime configuration for the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Run the lifespan startup/shutdown handshake.
    #[serde(default = "default_true")]
    pub lifespan: bool,

    /// Calling convention the application uses.
    #[serde(default)]
    pub protocol_version: ProtocolVersion,

    #[serde(default)]
    pub shutdown_policy: ShutdownPolicy,

    /// Reserved for diagnostic error responses; currently has no effect.
    #[serde(default)]
    pub debug: bool,

    /// Default `tracing` level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AdapterConfig {
    /// | Field            | Default                |
    /// |------------------|------------------------|
    /// | lifespan         | `true`                 |
    /// | protocol_version | `3`                    |
    /// | shutdown_policy  | `after_each_request`   |
    /// | debug            | `false`                |
    /// | log_level        | `"info"`               |
    fn default() -> Self {
        Self {
            lifespan: default_true(),
            protocol_version: ProtocolVersion::default(),
            shutdown_policy: ShutdownPolicy::default(),
            debug: false,
            log_level: default_log_level(),
        }
    }
}

impl AdapterConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML or field values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Serializes the config to TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads a config file from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AdapterConfig::default();
        assert!(cfg.lifespan);
        assert_eq!(cfg.protocol_version, ProtocolVersion::V3);
        assert_eq!(cfg.shutdown_policy, ShutdownPolicy::AfterEachRequest);
        assert!(!cfg.debug);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg = AdapterConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AdapterConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        // Arrange
        let text = r#"
            lifespan = false
            protocol_version = 2
            shutdown_policy = "on_drop"
            debug = true
            log_level = "debug"
        "#;

        // Act
        let cfg = AdapterConfig::from_toml_str(text).unwrap();

        // Assert
        assert!(!cfg.lifespan);
        assert_eq!(cfg.protocol_version, ProtocolVersion::V2);
        assert_eq!(cfg.shutdown_policy, ShutdownPolicy::OnDrop);
        assert!(cfg.debug);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn test_unsupported_protocol_version_is_rejected() {
        let result = AdapterConfig::from_toml_str("protocol_version = 4");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let cfg = AdapterConfig {
            lifespan: false,
            protocol_version: ProtocolVersion::V2,
            shutdown_policy: ShutdownPolicy::OnDrop,
            debug: true,
            log_level: "trace".to_string(),
        };
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(AdapterConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let path = Path::new("/definitely/not/here/sluice.toml");
        let err = AdapterConfig::load(path).unwrap_err();
        match &err {
            ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert_eq!(err.as_label(), "config_io");
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!("sluice-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "lifespan = false\n").unwrap();

        let cfg = AdapterConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!cfg.lifespan);
        assert_eq!(cfg.protocol_version, ProtocolVersion::V3);
    }
}
