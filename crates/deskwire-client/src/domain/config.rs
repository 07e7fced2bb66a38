//! Client configuration types.
//!
//! [`ClientConfig`] is the single source of truth for all runtime settings.
//! It can be built from defaults, from a TOML file (see
//! [`crate::infrastructure::config_file`]) or from CLI arguments layered on
//! top of either.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads inside the domain) lets tests construct exactly the settings they
//! need.

use std::time::Duration;

use deskwire_core::{protocol::dialect::LEGACY_PATH, Endpoint};
use uuid::Uuid;

/// Default agent port.
pub const DEFAULT_PORT: u16 = 44325;

/// Session lifetime requested for long-lived input connections.
pub const INPUT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Session lifetime for general, short-lived use.
pub const GENERAL_SESSION_TTL: Duration = Duration::from_secs(900);

/// Bounded retry schedule for the connect step before a send.
///
/// The delay grows linearly: attempt `n` waits `base_delay * n` before the
/// next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connect attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(300),
        }
    }
}

/// All runtime configuration for one client instance.
///
/// # Example
///
/// ```rust
/// use deskwire_client::ClientConfig;
///
/// let cfg = ClientConfig::default();
/// assert_eq!(cfg.port, 44325);
/// assert_eq!(cfg.legacy_ws_url(), "ws://127.0.0.1:44325/api/v1/rd/session");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Agent hostname or IP address.
    pub host: String,
    pub port: u16,
    /// Use `https`/`wss` instead of `http`/`ws`.
    pub use_ssl: bool,
    /// Shared secret sent as `X-Openctrol-Key` to the REST API and to the
    /// legacy WebSocket endpoint.  Never logged.
    pub api_key: Option<String>,
    /// Identifier sent as `ha_id` when creating sessions.
    pub client_id: String,
    /// Lifetime requested for new sessions.
    pub session_ttl: Duration,
    /// Upper bound on the WebSocket handshake.
    pub connect_timeout: Duration,
    /// Upper bound on each REST call.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// After a session-limit refusal, also reuse sessions cached for other
    /// endpoints.  Off by default: such a session may belong to a different
    /// agent.
    pub cross_endpoint_session_reuse: bool,
    /// Random per-instance id attached to log records.
    pub instance_id: Uuid,
}

impl Default for ClientConfig {
    /// | Field                        | Default       |
    /// |------------------------------|---------------|
    /// | host                         | `127.0.0.1`   |
    /// | port                         | `44325`       |
    /// | use_ssl                      | `false`       |
    /// | api_key                      | none          |
    /// | client_id                    | `deskwire`    |
    /// | session_ttl                  | 3600 s        |
    /// | connect_timeout              | 30 s          |
    /// | request_timeout              | 10 s          |
    /// | retry                        | 3 × 300 ms    |
    /// | cross_endpoint_session_reuse | `false`       |
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            use_ssl: false,
            api_key: None,
            client_id: "deskwire".to_string(),
            session_ttl: INPUT_SESSION_TTL,
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            cross_endpoint_session_reuse: false,
            instance_id: Uuid::new_v4(),
        }
    }
}

impl ClientConfig {
    /// Logical identity of the agent this client targets.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Base URL of the agent's REST API, without a trailing slash.
    pub fn rest_base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// URL of the legacy fixed WebSocket endpoint.
    pub fn legacy_ws_url(&self) -> String {
        let scheme = if self.use_ssl { "wss" } else { "ws" };
        format!("{scheme}://{}:{}{LEGACY_PATH}", self.host, self.port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_local_agent() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 44325);
        assert!(!cfg.use_ssl);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_default_timeouts() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.connect_timeout, Duration::from_secs(30));
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.session_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_default_cross_endpoint_reuse_is_off() {
        assert!(!ClientConfig::default().cross_endpoint_session_reuse);
    }

    #[test]
    fn test_instance_ids_differ() {
        assert_ne!(
            ClientConfig::default().instance_id,
            ClientConfig::default().instance_id
        );
    }

    #[test]
    fn test_urls_follow_tls_flag() {
        // Arrange
        let cfg = ClientConfig {
            host: "desk.lan".into(),
            port: 8443,
            use_ssl: true,
            ..ClientConfig::default()
        };

        // Assert
        assert_eq!(cfg.rest_base_url(), "https://desk.lan:8443");
        assert_eq!(cfg.legacy_ws_url(), "wss://desk.lan:8443/api/v1/rd/session");
        assert_eq!(cfg.endpoint(), Endpoint::new("desk.lan", 8443));
    }

    #[test]
    fn test_retry_delay_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(1), Duration::from_millis(300));
        assert_eq!(policy.delay_for(2), Duration::from_millis(600));
    }
}
