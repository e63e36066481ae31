//! Seams into the host authentication stack.
//!
//! Filters never own sessions or verify passwords themselves: they receive an
//! `Arc<dyn Subject>` through the request extensions and delegate to it.

use serde_json::Value;
use std::sync::Arc;

use super::{AuthenticationError, AuthenticationToken};

/// Attribute bag owned by the host session implementation.
pub trait Session: Send + Sync {
    fn id(&self) -> &str;
    fn attribute(&self, key: &str) -> Option<Value>;
    fn set_attribute(&self, key: &str, value: Value);
    fn remove_attribute(&self, key: &str) -> Option<Value>;
}

/// The principal bound to the current request.
pub trait Subject: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn principal(&self) -> Option<String>;

    /// Verify `token` and, on success, mark the subject authenticated.
    ///
    /// # Errors
    /// Returns the realm failure when the credentials are rejected.
    fn login(&self, token: &AuthenticationToken) -> Result<(), AuthenticationError>;

    /// # Errors
    /// Returns an error when the host cannot tear the session down.
    fn logout(&self) -> Result<(), AuthenticationError>;

    /// The session of this subject, created on first access.
    fn session(&self) -> Arc<dyn Session>;
}

/// Credential verification delegated to by `Subject::login`.
pub trait Realm: Send + Sync {
    /// Resolve the principal the token authenticates.
    ///
    /// # Errors
    /// Returns an `AuthenticationError` when the account is unknown, locked or
    /// the credentials do not match.
    fn authenticate(&self, token: &AuthenticationToken) -> Result<String, AuthenticationError>;
}

/// Read a counter attribute that may be stored as a number or numeric string.
#[must_use]
pub fn counter_attribute(session: &dyn Session, key: &str) -> Option<u64> {
    parse_counter(&session.attribute(key)?)
}

#[must_use]
pub fn parse_counter(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
