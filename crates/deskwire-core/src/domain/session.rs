//! Desktop session records.
//!
//! A session is a time-limited token handed out by the agent's REST API.  It
//! carries the WebSocket URL (with the token embedded) that a session-based
//! connection must use.  Expiry is enforced by the agent, not by this crate:
//! `expires_at` is informational.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A desktop session as returned by `POST /api/v1/sessions/desktop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub websocket_url: String,
    /// Absent or unparseable expiry timestamps deserialize to `None`.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, websocket_url: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            websocket_url: websocket_url.into(),
            expires_at: None,
        }
    }

    /// Sets the expiry timestamp.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Older agents send `""` for a missing expiry; treat anything that is not
/// an RFC 3339 timestamp as unknown.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }))
}

/// The logical identity of an agent: host plus port.
///
/// Session caches are keyed by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
