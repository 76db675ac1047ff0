//! Registry of active sessions.
//!
//! # Responsibilities
//! - Record each session's backend endpoint and lifecycle state
//! - Provide snapshots for the admin API and logs
//!
//! # Design Decisions
//! - Observational only: never consulted to route or to decide writability
//! - Sharded map, no cross-session lock; each entry is written only by the
//!   session task that owns it

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use serde::Serialize;

use crate::net::SessionId;
use crate::observability::metrics;
use crate::relay::SessionState;

/// Bookkeeping for one session.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// Browser-side peer address.
    pub client_addr: Option<SocketAddr>,
    /// Configured backend target (`host:port`).
    pub backend: String,
    /// Local address of the dedicated backend connection.
    pub backend_local_addr: Option<SocketAddr>,
    pub state: SessionState,
    pub opened_at: Instant,
}

impl SessionEntry {
    pub fn new(backend: impl Into<String>, client_addr: Option<SocketAddr>) -> Self {
        Self {
            client_addr,
            backend: backend.into(),
            backend_local_addr: None,
            state: SessionState::Connecting,
            opened_at: Instant::now(),
        }
    }

    pub fn with_state(mut self, state: SessionState) -> Self {
        self.state = state;
        self
    }
}

/// Point-in-time view of one session.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub client: Option<String>,
    pub backend: String,
    pub backend_local_addr: Option<String>,
    pub state: SessionState,
    pub live: bool,
    pub age_ms: u64,
}

/// A thread-safe map of session id → entry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<SessionId, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: SessionId, entry: SessionEntry) {
        tracing::debug!(session_id = %id, backend = %entry.backend, "Session registered");
        self.inner.insert(id, entry);
        metrics::record_active_sessions(self.inner.len());
    }

    /// Update the recorded state. Returns false if the session is unknown.
    pub fn set_state(&self, id: SessionId, state: SessionState) -> bool {
        match self.inner.get_mut(&id) {
            Some(mut entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    /// Record the local address of the backend connection once it exists.
    pub fn set_backend_local_addr(&self, id: SessionId, addr: Option<SocketAddr>) -> bool {
        match self.inner.get_mut(&id) {
            Some(mut entry) => {
                entry.backend_local_addr = addr;
                true
            }
            None => false,
        }
    }

    pub fn unregister(&self, id: SessionId) -> Option<SessionEntry> {
        let removed = self.inner.remove(&id).map(|(_, entry)| entry);
        if removed.is_some() {
            tracing::debug!(session_id = %id, "Session unregistered");
            metrics::record_active_sessions(self.inner.len());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// All sessions, ordered by id.
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        let mut sessions: Vec<_> = self
            .inner
            .iter()
            .map(|r| {
                let entry = r.value();
                SessionSnapshot {
                    session_id: *r.key(),
                    client: entry.client_addr.map(|a| a.to_string()),
                    backend: entry.backend.clone(),
                    backend_local_addr: entry.backend_local_addr.map(|a| a.to_string()),
                    state: entry.state,
                    live: entry.state.is_live(),
                    age_ms: entry.opened_at.elapsed().as_millis() as u64,
                }
            })
            .collect();
        sessions.sort_by_key(|s| s.session_id);
        sessions
    }
}
