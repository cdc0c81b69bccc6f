//! In-memory session store
//!
//! Sessions are keyed by an opaque token issued in a cookie. The store is
//! process-local; a restart starts everyone fresh on the free tier, which
//! is acceptable for this service's retention semantics. Idle sessions are
//! purged once they pass the retention window.
//!
//! Concurrency note: the lock serializes individual mutations, but two
//! concurrent uploads from one session may both pass the gate before
//! either increments `total_uploads`. That race under-restricts (both
//! succeed) and is accepted.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};
use rand::RngCore;
use zapimg_core::models::Session;

const SESSION_TOKEN_BYTES: usize = 16;

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    retention: Duration,
}

impl SessionStore {
    pub fn new(retention_days: i64) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            retention: Duration::days(retention_days.max(1)),
        }
    }

    fn generate_token() -> String {
        let mut buf = [0u8; SESSION_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut buf);
        hex::encode(buf)
    }

    /// Create a fresh session and return its token.
    pub fn create(&self) -> String {
        let token = Self::generate_token();
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        sessions.insert(token.clone(), Session::new(Utc::now()));
        token
    }

    pub fn contains(&self, token: &str) -> bool {
        self.sessions
            .read()
            .expect("session store lock poisoned")
            .contains_key(token)
    }

    /// Clone the session for `token`, creating it if absent, and touch its
    /// last-seen time.
    pub fn snapshot(&self, token: &str) -> Session {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        let now = Utc::now();
        let session = sessions
            .entry(token.to_string())
            .or_insert_with(|| Session::new(now));
        session.last_seen_at = now;
        session.clone()
    }

    /// Mutate the session for `token`, creating it if absent.
    pub fn update<R>(&self, token: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        let now = Utc::now();
        let session = sessions
            .entry(token.to_string())
            .or_insert_with(|| Session::new(now));
        session.last_seen_at = now;
        f(session)
    }

    /// Drop sessions idle past the retention window. Returns how many were
    /// removed.
    pub fn purge_expired(&self) -> usize {
        let cutoff = Utc::now() - self.retention;
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen_at > cutoff);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .expect("session store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
