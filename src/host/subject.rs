use serde_json::{Value, json};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use super::session::{MemorySession, MemorySessionRegistry};
use crate::authc::{AuthenticationError, AuthenticationToken, Realm, Session, Subject};

/// Session attribute holding the authenticated principal.
pub const PRINCIPAL_ATTRIBUTE: &str = "portierPrincipal";

/// What happened to the session while the request was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionChange {
    #[default]
    Unchanged,
    Created,
    Destroyed,
}

/// Subject bound to one request, backed by the in-memory registry.
pub struct HostSubject {
    realm: Arc<dyn Realm>,
    registry: Arc<MemorySessionRegistry>,
    session: Mutex<Option<Arc<MemorySession>>>,
    change: Mutex<SessionChange>,
}

impl HostSubject {
    #[must_use]
    pub fn new(
        realm: Arc<dyn Realm>,
        registry: Arc<MemorySessionRegistry>,
        session: Option<Arc<MemorySession>>,
    ) -> Self {
        Self {
            realm,
            registry,
            session: Mutex::new(session),
            change: Mutex::new(SessionChange::Unchanged),
        }
    }

    /// Session id currently bound to this subject, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.id().to_string())
    }

    #[must_use]
    pub fn change(&self) -> SessionChange {
        *self.change.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_change(&self, change: SessionChange) {
        *self.change.lock().unwrap_or_else(PoisonError::into_inner) = change;
    }

    fn existing_session(&self) -> Option<Arc<MemorySession>> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Subject for HostSubject {
    fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }

    fn principal(&self) -> Option<String> {
        match self.existing_session()?.attribute(PRINCIPAL_ATTRIBUTE)? {
            Value::String(principal) => Some(principal),
            _ => None,
        }
    }

    fn login(&self, token: &AuthenticationToken) -> Result<(), AuthenticationError> {
        let principal = self.realm.authenticate(token)?;
        info!("Authenticated principal {principal}");
        self.session()
            .set_attribute(PRINCIPAL_ATTRIBUTE, json!(principal));
        Ok(())
    }

    fn logout(&self) -> Result<(), AuthenticationError> {
        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = session {
            debug!("Destroying session");
            self.registry.remove(session.id());
            self.set_change(SessionChange::Destroyed);
        }
        Ok(())
    }

    fn session(&self) -> Arc<dyn Session> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = guard.as_ref() {
            return session.clone();
        }
        let session = self.registry.create();
        *guard = Some(session.clone());
        drop(guard);
        self.set_change(SessionChange::Created);
        session
    }
}
