//! In-memory sessions keyed by an opaque cookie id.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::Duration,
};
use tracing::debug;

use crate::authc::Session;

#[derive(Debug)]
pub struct MemorySession {
    id: String,
    attributes: Mutex<HashMap<String, Value>>,
    last_access: Mutex<DateTime<Utc>>,
}

impl MemorySession {
    fn new(id: String) -> Self {
        Self {
            id,
            attributes: Mutex::new(HashMap::new()),
            last_access: Mutex::new(Utc::now()),
        }
    }

    fn touch(&self) {
        *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Utc::now();
    }

    fn is_expired(&self, idle_ttl: TimeDelta, now: DateTime<Utc>) -> bool {
        let last_access = *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        now.signed_duration_since(last_access) > idle_ttl
    }
}

impl Session for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_attribute(&self, key: &str, value: Value) {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove_attribute(&self, key: &str) -> Option<Value> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Live sessions of a single process.
///
/// A session not accessed for longer than the idle TTL is dropped: `get`
/// stops resolving it and `create` sweeps it out of the map.
#[derive(Debug)]
pub struct MemorySessionRegistry {
    sessions: RwLock<HashMap<String, Arc<MemorySession>>>,
    idle_ttl: Duration,
}

impl Default for MemorySessionRegistry {
    fn default() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl: DEFAULT_SESSION_IDLE_TTL,
        }
    }
}

impl MemorySessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    #[must_use]
    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    fn idle_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.idle_ttl).unwrap_or(TimeDelta::MAX)
    }

    /// Create and register a session with a random 256-bit id.
    #[must_use]
    pub fn create(&self) -> Arc<MemorySession> {
        let session = Arc::new(MemorySession::new(generate_session_id()));
        let idle_ttl = self.idle_delta();
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, live| !live.is_expired(idle_ttl, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {evicted} idle sessions");
        }
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Resolve a live session and refresh its idle timer.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<MemorySession>> {
        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()?;
        if session.is_expired(self.idle_delta(), Utc::now()) {
            self.remove(id);
            return None;
        }
        session.touch();
        Some(session)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<MemorySession>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}
