//! In-process session store
//!
//! All sessions live in one `HashMap` behind a tokio `RwLock`. Every trait
//! operation takes the lock exactly once, so `renew` (remove old entry, insert
//! under new id) is a single critical section and no reader can observe both
//! identifiers live at the same time.
//!
//! Sessions expire after `idle_timeout` without access. Expired entries are
//! treated as absent on access and physically removed by `purge_expired`,
//! which the background sweeper calls periodically.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::id::SessionId;
use crate::store::{BoxFuture, SessionStore};

struct SessionEntry {
    attributes: HashMap<String, Value>,
    last_accessed: Instant,
}

impl SessionEntry {
    fn new(now: Instant) -> Self {
        Self {
            attributes: HashMap::new(),
            last_accessed: now,
        }
    }

    fn is_live(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_accessed) < idle_timeout
    }
}

/// Thread-safe in-memory session store with idle expiry.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    idle_timeout: Duration,
}

impl MemorySessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        info!(
            idle_timeout_secs = idle_timeout.as_secs(),
            "in-memory session store initialized"
        );
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Number of live (non-expired) sessions.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|entry| entry.is_live(now, self.idle_timeout))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove every expired session. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.is_live(now, self.idle_timeout));
        before - sessions.len()
    }

    /// Look up a live entry mutably, refreshing its access time.
    ///
    /// Expired entries are removed on the way.
    fn live_entry<'m>(
        sessions: &'m mut HashMap<SessionId, SessionEntry>,
        id: &SessionId,
        idle_timeout: Duration,
    ) -> Option<&'m mut SessionEntry> {
        let now = Instant::now();
        let expired = match sessions.get(id) {
            Some(entry) => !entry.is_live(now, idle_timeout),
            None => return None,
        };
        if expired {
            debug!(session = id.redacted(), "session expired on access");
            sessions.remove(id);
            return None;
        }
        let entry = sessions.get_mut(id)?;
        entry.last_accessed = now;
        Some(entry)
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self) -> BoxFuture<'_, Result<SessionId>> {
        Box::pin(async move {
            let mut sessions = self.sessions.write().await;
            let mut id = SessionId::generate();
            while sessions.contains_key(&id) {
                id = SessionId::generate();
            }
            sessions.insert(id.clone(), SessionEntry::new(Instant::now()));
            debug!(session = id.redacted(), "session created");
            Ok(id)
        })
    }

    fn exists<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let now = Instant::now();
            let sessions = self.sessions.read().await;
            sessions
                .get(id)
                .is_some_and(|entry| entry.is_live(now, self.idle_timeout))
        })
    }

    fn get<'a>(&'a self, id: &'a SessionId, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move {
            let mut sessions = self.sessions.write().await;
            Ok(Self::live_entry(&mut sessions, id, self.idle_timeout)
                .and_then(|entry| entry.attributes.get(key).cloned()))
        })
    }

    fn set<'a>(
        &'a self,
        id: &'a SessionId,
        key: &'a str,
        value: Value,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut sessions = self.sessions.write().await;
            let entry = Self::live_entry(&mut sessions, id, self.idle_timeout)
                .ok_or_else(|| SessionError::NotFound(id.redacted().to_owned()))?;
            entry.attributes.insert(key.to_owned(), value);
            Ok(())
        })
    }

    fn remove<'a>(
        &'a self,
        id: &'a SessionId,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move {
            let mut sessions = self.sessions.write().await;
            Ok(Self::live_entry(&mut sessions, id, self.idle_timeout)
                .and_then(|entry| entry.attributes.remove(key)))
        })
    }

    fn renew<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<SessionId>> {
        Box::pin(async move {
            let mut sessions = self.sessions.write().await;
            if Self::live_entry(&mut sessions, id, self.idle_timeout).is_none() {
                return Err(SessionError::NotFound(id.redacted().to_owned()));
            }

            let mut new_id = SessionId::generate();
            while sessions.contains_key(&new_id) {
                new_id = SessionId::generate();
            }

            // Both steps happen under the same write guard.
            if let Some(mut entry) = sessions.remove(id) {
                entry.last_accessed = Instant::now();
                sessions.insert(new_id.clone(), entry);
            }

            debug!(
                old_session = id.redacted(),
                new_session = new_id.redacted(),
                "session renewed"
            );
            Ok(new_id)
        })
    }

    fn invalidate<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut sessions = self.sessions.write().await;
            if sessions.remove(id).is_some() {
                debug!(session = id.redacted(), "session invalidated");
            }
            Ok(())
        })
    }
}
