//! Hooks notified when a login attempt fails.

use axum::http::request::Parts;

use super::{AuthenticationError, AuthenticationToken};

/// Observer for failed logins, e.g. for auditing or account lockout.
pub trait AuthenticationFailureHandler: Send + Sync {
    fn supports(&self, error: &AuthenticationError) -> bool;

    /// Called for every failed login whose error this handler supports.
    fn on_authentication_failure(
        &self,
        token: Option<&AuthenticationToken>,
        request: &Parts,
        error: &AuthenticationError,
    );
}
