//! Log-only observers wired into the bundled server.

use axum::http::request::Parts;
use tracing::{info, warn};

use crate::{
    authc::{AuthenticationError, AuthenticationFailureHandler, AuthenticationToken, Subject},
    web::{LogoutListener, request::remote_addr},
};

#[derive(Debug, Default)]
pub struct LoginAudit;

impl AuthenticationFailureHandler for LoginAudit {
    fn supports(&self, _error: &AuthenticationError) -> bool {
        true
    }

    fn on_authentication_failure(
        &self,
        token: Option<&AuthenticationToken>,
        request: &Parts,
        error: &AuthenticationError,
    ) {
        warn!(
            username = ?token.map(AuthenticationToken::username),
            remote = ?remote_addr(request),
            kind = error.kind(),
            "Login failed"
        );
    }
}

#[derive(Debug, Default)]
pub struct LogoutAudit;

impl LogoutListener for LogoutAudit {
    fn on_success(&self, subject: &dyn Subject, request: &Parts) {
        info!(
            principal = ?subject.principal(),
            remote = ?remote_addr(request),
            "Logged out"
        );
    }

    fn on_failure(&self, subject: &dyn Subject, _request: &Parts, error: &AuthenticationError) {
        warn!(principal = ?subject.principal(), "Logout failed: {error}");
    }
}
