//! Process-wide in-memory [`SessionStore`].
//!
//! Share one instance (behind an `Arc`) between every client that targets
//! the same agents.  Nothing is persisted; a restarted process starts with an
//! empty cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use deskwire_core::{Endpoint, Session};
use tracing::debug;

use crate::application::resolve_session::SessionStore;

/// Session cache keyed by endpoint.
///
/// Each entry carries an insertion sequence number so [`SessionStore::latest`]
/// can find the most recently stored session.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<Endpoint, (u64, Session)>>,
    seq: AtomicU64,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// No operation here can leave a partial entry behind, so poisoned guards
// are recovered.
impl SessionStore for InMemorySessionStore {
    fn get(&self, endpoint: &Endpoint) -> Option<Session> {
        let map = self.entries.read().unwrap_or_else(|p| p.into_inner());
        map.get(endpoint).map(|(_, s)| s.clone())
    }

    fn put(&self, endpoint: Endpoint, session: Session) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        debug!(%endpoint, session_id = %session.session_id, "caching session");
        let mut map = self.entries.write().unwrap_or_else(|p| p.into_inner());
        map.insert(endpoint, (seq, session));
    }

    fn remove(&self, session_id: &str) {
        let mut map = self.entries.write().unwrap_or_else(|p| p.into_inner());
        map.retain(|_, (_, s)| s.session_id != session_id);
    }

    fn latest(&self) -> Option<(Endpoint, Session)> {
        let map = self.entries.read().unwrap_or_else(|p| p.into_inner());
        map.iter()
            .max_by_key(|(_, (seq, _))| *seq)
            .map(|(e, (_, s))| (e.clone(), s.clone()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
