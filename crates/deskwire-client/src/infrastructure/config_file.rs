//! TOML configuration file for the client.
//!
//! Every table and field is optional; anything absent keeps the
//! [`ClientConfig`] default.
//!
//! ```toml
//! [agent]
//! host = "desk.lan"
//! port = 44325
//! use_ssl = false
//! api_key = "s3cret"
//! connect_timeout_secs = 30
//! request_timeout_secs = 10
//!
//! [session]
//! client_id = "living-room"
//! ttl_secs = 3600
//! cross_endpoint_reuse = false
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 300
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::config::{ClientConfig, RetryPolicy, DEFAULT_PORT, INPUT_SESSION_TTL};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── File schema ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub agent: AgentSection,
    pub session: SessionSection,
    pub retry: RetrySection,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSection {
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub api_key: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    pub client_id: String,
    pub ttl_secs: u64,
    pub cross_endpoint_reuse: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            use_ssl: false,
            api_key: None,
            connect_timeout_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            client_id: "deskwire".to_string(),
            ttl_secs: INPUT_SESSION_TTL.as_secs(),
            cross_endpoint_reuse: false,
        }
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 300,
        }
    }
}

impl ConfigFile {
    pub fn into_client_config(self) -> ClientConfig {
        ClientConfig {
            host: self.agent.host,
            port: self.agent.port,
            use_ssl: self.agent.use_ssl,
            api_key: self.agent.api_key.filter(|k| !k.is_empty()),
            client_id: self.session.client_id,
            session_ttl: Duration::from_secs(self.session.ttl_secs),
            connect_timeout: Duration::from_secs(self.agent.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.agent.request_timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.retry.max_attempts,
                base_delay: Duration::from_millis(self.retry.base_delay_ms),
            },
            cross_endpoint_session_reuse: self.session.cross_endpoint_reuse,
            ..ClientConfig::default()
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses TOML text into a [`ClientConfig`].
///
/// # Errors
///
/// [`ConfigError::Parse`] for malformed TOML, wrong types or unknown keys.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.into_client_config())
}

/// Loads a [`ClientConfig`] from `path`.
///
/// # Errors
///
/// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`] if
/// its content is invalid.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    parse_config(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
