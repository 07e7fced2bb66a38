//! SessionResolver: decides which session a new connection should use.
//!
//! Preference order for an endpoint (host + port):
//!
//! 1. A session already cached for that endpoint.
//! 2. A new session from the agent's REST API, cached on success.
//! 3. If the agent refuses because its session limit is reached: whatever
//!    the cache holds for the endpoint now (another client instance may have
//!    created one meanwhile), then, only when cross-endpoint reuse is
//!    enabled, the most recent session cached for any endpoint.
//! 4. Otherwise [`ResolveError::NoSessionAvailable`]; the caller falls back
//!    to the legacy endpoint.
//!
//! The resolver never retires a cached session on its own; only
//! [`SessionResolver::end_session`] does.
//!
//! # Architecture
//!
//! This use case depends only on the [`SessionApi`] and [`SessionStore`]
//! traits.  Infrastructure implementations are injected at construction
//! time, making the use case fully unit-testable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskwire_core::{Endpoint, Session};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::config::ClientConfig;

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Errors returned by a [`SessionApi`].
#[derive(Debug, Error)]
pub enum SessionApiError {
    /// The agent already holds as many sessions as it allows.
    #[error("agent session limit reached")]
    LimitReached,

    /// Any other non-success HTTP status.
    #[error("agent rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The request never produced a response (DNS, refused, timeout).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The response body did not have the expected shape.
    #[error("malformed response body: {0}")]
    Decode(String),
}

/// The agent's session REST API.
///
/// Infrastructure implementation uses reqwest; tests use `MockSessionApi`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Creates a session for `client_id` that expires after `ttl_secs`.
    async fn create_session(&self, client_id: &str, ttl_secs: u64) -> Result<Session, SessionApiError>;

    /// Ends a session early.
    async fn end_session(&self, session_id: &str) -> Result<(), SessionApiError>;
}

/// Cache of known sessions keyed by endpoint.
///
/// Shared by every client instance in the process.  Implementations must
/// tolerate concurrent use; a lost race may create an extra session but
/// must never corrupt the cache.
pub trait SessionStore: Send + Sync {
    fn get(&self, endpoint: &Endpoint) -> Option<Session>;

    /// Records `session` as the current one for `endpoint`, replacing any
    /// previous entry.
    fn put(&self, endpoint: Endpoint, session: Session);

    /// Forgets the session with this id, whatever endpoint it is cached for.
    fn remove(&self, session_id: &str);

    /// The most recently stored session across all endpoints.
    fn latest(&self) -> Option<(Endpoint, Session)>;
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no session available for {endpoint}: {cause}")]
    NoSessionAvailable {
        endpoint: Endpoint,
        #[source]
        cause: SessionApiError,
    },
}

// ── Use case ──────────────────────────────────────────────────────────────────

pub struct SessionResolver {
    api: Arc<dyn SessionApi>,
    store: Arc<dyn SessionStore>,
    client_id: String,
    ttl: Duration,
    cross_endpoint_reuse: bool,
}

impl SessionResolver {
    pub fn new(
        api: Arc<dyn SessionApi>,
        store: Arc<dyn SessionStore>,
        client_id: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            api,
            store,
            client_id: client_id.into(),
            ttl,
            cross_endpoint_reuse: false,
        }
    }

    /// Builds a resolver with the client id, TTL and reuse policy of `config`.
    pub fn from_config(
        config: &ClientConfig,
        api: Arc<dyn SessionApi>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self::new(api, store, config.client_id.clone(), config.session_ttl)
            .with_cross_endpoint_reuse(config.cross_endpoint_session_reuse)
    }

    /// Allows falling back to sessions cached for other endpoints after a
    /// session-limit refusal.
    pub fn with_cross_endpoint_reuse(mut self, enabled: bool) -> Self {
        self.cross_endpoint_reuse = enabled;
        self
    }

    /// Returns a session usable for `endpoint`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NoSessionAvailable`] when neither the cache nor the
    /// REST API yields a session.
    pub async fn resolve(&self, endpoint: &Endpoint) -> Result<Session, ResolveError> {
        if let Some(session) = self.store.get(endpoint) {
            debug!(%endpoint, session_id = %session.session_id, "reusing cached session");
            return Ok(session);
        }

        let ttl_secs = self.ttl.as_secs();
        match self.api.create_session(&self.client_id, ttl_secs).await {
            Ok(session) => {
                info!(%endpoint, session_id = %session.session_id, ttl_secs, "created desktop session");
                self.store.put(endpoint.clone(), session.clone());
                Ok(session)
            }
            Err(SessionApiError::LimitReached) => {
                warn!(%endpoint, "agent session limit reached, looking for a cached session");
                self.fallback(endpoint).ok_or(ResolveError::NoSessionAvailable {
                    endpoint: endpoint.clone(),
                    cause: SessionApiError::LimitReached,
                })
            }
            Err(cause) => {
                warn!(%endpoint, error = %cause, "session creation failed");
                Err(ResolveError::NoSessionAvailable {
                    endpoint: endpoint.clone(),
                    cause,
                })
            }
        }
    }

    fn fallback(&self, endpoint: &Endpoint) -> Option<Session> {
        if let Some(session) = self.store.get(endpoint) {
            info!(%endpoint, session_id = %session.session_id, "reusing session cached after limit refusal");
            return Some(session);
        }
        if !self.cross_endpoint_reuse {
            return None;
        }
        let (owner, session) = self.store.latest()?;
        warn!(
            %endpoint,
            %owner,
            session_id = %session.session_id,
            "reusing session cached for another endpoint"
        );
        Some(session)
    }

    /// Ends `session_id` at the agent and drops it from the cache.
    ///
    /// The cache entry is removed even when the agent call fails, so a
    /// session the agent no longer knows is not offered again.
    pub async fn end_session(&self, session_id: &str) -> Result<(), SessionApiError> {
        let result = self.api.end_session(session_id).await;
        self.store.remove(session_id);
        match &result {
            Ok(()) => info!(session_id, "ended desktop session"),
            Err(e) => warn!(session_id, error = %e, "ending session failed; removed from cache anyway"),
        }
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
