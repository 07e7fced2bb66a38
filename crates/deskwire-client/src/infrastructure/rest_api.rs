//! Agent session REST client.
//!
//! Async HTTP client using `reqwest`, authenticated with the agent's
//! `X-Openctrol-Key` header when an API key is configured.
//!
//! | Call                                          | Body                                  |
//! |-----------------------------------------------|---------------------------------------|
//! | `POST /api/v1/sessions/desktop`               | `{"ha_id": id, "ttl_seconds": ttl}`   |
//! | `POST /api/v1/sessions/desktop/{id}/end`      | none                                  |

use async_trait::async_trait;
use deskwire_core::Session;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

use crate::application::resolve_session::{SessionApi, SessionApiError};
use crate::domain::config::ClientConfig;

/// Header carrying the agent's shared secret (`X-Openctrol-Key`).
pub const API_KEY_HEADER: &str = "x-openctrol-key";

/// Body fragments the agent uses when it refuses a session for capacity.
const LIMIT_MARKERS: [&str; 2] = ["Maximum sessions limit", "session_creation_failed"];

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    ha_id: &'a str,
    ttl_seconds: u64,
}

/// reqwest-backed [`SessionApi`].
pub struct AgentRestClient {
    http: reqwest::Client,
    base_url: String,
}

impl AgentRestClient {
    /// Creates a client for the agent described by `config`.
    ///
    /// # Errors
    ///
    /// [`SessionApiError::Http`] if the API key is not a valid header value
    /// or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, SessionApiError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| SessionApiError::Http("API key is not a valid header value".into()))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SessionApiError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.rest_base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &str, body: Option<&CreateSessionRequest<'_>>) -> Result<Vec<u8>, SessionApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| SessionApiError::Http(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SessionApiError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &String::from_utf8_lossy(&bytes)));
        }
        Ok(bytes.to_vec())
    }
}

/// Maps a non-success response to a [`SessionApiError`].
pub fn classify_failure(status: u16, body: &str) -> SessionApiError {
    if LIMIT_MARKERS.iter().any(|m| body.contains(m)) {
        SessionApiError::LimitReached
    } else {
        SessionApiError::Rejected {
            status,
            body: body.to_string(),
        }
    }
}

/// Parses a create-session response body.
pub fn parse_session(body: &[u8]) -> Result<Session, SessionApiError> {
    let session: Session =
        serde_json::from_slice(body).map_err(|e| SessionApiError::Decode(e.to_string()))?;
    if session.websocket_url.is_empty() {
        return Err(SessionApiError::Decode("websocket_url is empty".into()));
    }
    Ok(session)
}

#[async_trait]
impl SessionApi for AgentRestClient {
    async fn create_session(&self, client_id: &str, ttl_secs: u64) -> Result<Session, SessionApiError> {
        let body = CreateSessionRequest {
            ha_id: client_id,
            ttl_seconds: ttl_secs,
        };
        let bytes = self.post("/api/v1/sessions/desktop", Some(&body)).await?;
        parse_session(&bytes)
    }

    async fn end_session(&self, session_id: &str) -> Result<(), SessionApiError> {
        self.post(&format!("/api/v1/sessions/desktop/{session_id}/end"), None)
            .await
            .map(|_| ())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_message_is_limit_reached() {
        let err = classify_failure(500, r#"{"error":"Maximum sessions limit (5) reached"}"#);
        assert!(matches!(err, SessionApiError::LimitReached));
    }

    #[test]
    fn test_session_creation_failed_code_is_limit_reached() {
        let err = classify_failure(409, r#"{"code":"session_creation_failed"}"#);
        assert!(matches!(err, SessionApiError::LimitReached));
    }

    #[test]
    fn test_other_failure_keeps_status_and_body() {
        let err = classify_failure(401, "unauthorized");
        match err {
            SessionApiError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_session_response() {
        let body = br#"{"session_id":"abc","websocket_url":"ws://h:44325/ws/desktop?sess=abc","expires_at":"2026-10-17T13:00:00Z"}"#;
        let s = parse_session(body).unwrap();
        assert_eq!(s.session_id, "abc");
        assert!(s.expires_at.is_some());
    }

    #[test]
    fn test_parse_session_without_url_is_decode_error() {
        let body = br#"{"session_id":"abc","websocket_url":""}"#;
        assert!(matches!(parse_session(body), Err(SessionApiError::Decode(_))));
    }

    #[test]
    fn test_parse_garbage_is_decode_error() {
        assert!(matches!(parse_session(b"<html>"), Err(SessionApiError::Decode(_))));
    }

    #[test]
    fn test_create_request_body_shape() {
        let body = CreateSessionRequest {
            ha_id: "deskwire",
            ttl_seconds: 3600,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"ha_id":"deskwire","ttl_seconds":3600})
        );
    }

    #[test]
    fn test_client_uses_configured_base_url() {
        let config = ClientConfig {
            host: "desk.lan".into(),
            port: 9000,
            api_key: Some("secret".into()),
            ..ClientConfig::default()
        };
        let client = AgentRestClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://desk.lan:9000");
    }

    #[test]
    fn test_invalid_api_key_is_rejected() {
        let config = ClientConfig {
            api_key: Some("bad\nkey".into()),
            ..ClientConfig::default()
        };
        assert!(AgentRestClient::new(&config).is_err());
    }
}
