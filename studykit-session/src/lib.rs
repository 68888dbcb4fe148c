//! Per-user session state for StudyKit tutoring bots.
//!
//! Chat handlers read and update a small state struct per user (selected
//! grade, subject, topic, a pending question). [`SessionStore`] keeps those
//! states in one explicit keyed store with a defined lifecycle (create on
//! first access, explicit clear, optional TTL eviction) instead of a
//! module-global map.
//!
//! ```rust,ignore
//! use studykit_session::SessionStore;
//!
//! let store: SessionStore<TutorState> = SessionStore::with_ttl(Duration::from_secs(1800));
//! let state = store.update(user_id, |s| s.grade = Some(10)).await;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct Entry<S> {
    state: S,
    touched_at: Instant,
}

/// A keyed store of per-user session state.
///
/// `S` is the consumer-defined state struct. States are created on first
/// access from `S::default()` and refreshed on every read or update. With a
/// TTL configured, an entry idle past the TTL is treated as absent: dropped
/// lazily on access, or eagerly by [`purge_expired`](SessionStore::purge_expired)
/// from a periodic task.
pub struct SessionStore<S> {
    sessions: RwLock<HashMap<i64, Entry<S>>>,
    ttl: Option<Duration>,
}

impl<S: Clone + Default + Send + Sync> SessionStore<S> {
    /// Create a store whose sessions never expire.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: None,
        }
    }

    /// Create a store that treats sessions idle past `ttl` as absent.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    fn is_expired(&self, entry: &Entry<S>, now: Instant) -> bool {
        self.ttl
            .map(|ttl| now.duration_since(entry.touched_at) > ttl)
            .unwrap_or(false)
    }

    /// Fetch the state for `user_id`, creating a default one on first
    /// access (or after expiry). Refreshes the idle timer.
    pub async fn get(&self, user_id: i64) -> S {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(user_id).or_insert_with(|| Entry {
            state: S::default(),
            touched_at: now,
        });
        if self.is_expired(entry, now) {
            debug!(user_id, "session expired, resetting");
            entry.state = S::default();
        }
        entry.touched_at = now;
        entry.state.clone()
    }

    /// Apply `f` to the state under the write lock and return the result.
    ///
    /// Creates the state on first access (or after expiry) before applying
    /// `f`, so a mutation never resurrects stale fields.
    pub async fn update<F>(&self, user_id: i64, f: F) -> S
    where
        F: FnOnce(&mut S),
    {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(user_id).or_insert_with(|| Entry {
            state: S::default(),
            touched_at: now,
        });
        if self.is_expired(entry, now) {
            debug!(user_id, "session expired, resetting");
            entry.state = S::default();
        }
        f(&mut entry.state);
        entry.touched_at = now;
        entry.state.clone()
    }

    /// Drop the state for `user_id`. Idempotent.
    ///
    /// Returns whether a live (non-expired) session existed.
    pub async fn clear(&self, user_id: i64) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.remove(&user_id) {
            Some(entry) => !self.is_expired(&entry, Instant::now()),
            None => false,
        }
    }

    /// Drop every entry idle past the TTL; returns how many were removed.
    ///
    /// A no-op for stores without a TTL.
    pub async fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
        removed
    }

    /// Number of live (non-expired) sessions.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|entry| !self.is_expired(entry, now))
            .count()
    }

    /// True when no live sessions exist.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<S: Clone + Default + Send + Sync> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}
