//! Captcha validation for logins past the retry threshold.

use axum::http::request::Parts;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{AuthenticationError, AuthenticationToken, Session};

pub const DEFAULT_CAPTCHA_ATTRIBUTE: &str = "portierCaptcha";
const DEFAULT_CAPTCHA_TTL: Duration = Duration::from_secs(5 * 60);

/// Validates the captcha answer carried by a login token.
pub trait CaptchaResolver: Send + Sync {
    /// Returns `Ok(false)` when the answer does not match.
    ///
    /// # Errors
    /// Returns an `AuthenticationError` for captchas that cannot be checked at
    /// all (missing, never issued, expired).
    fn valid_captcha(
        &self,
        request: &Parts,
        session: &dyn Session,
        token: &AuthenticationToken,
    ) -> Result<bool, AuthenticationError>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct IssuedCaptcha {
    value: String,
    issued_at: i64,
}

/// Resolver comparing the answer with a captcha previously issued into the
/// session. Issued captchas are single use.
#[derive(Clone, Debug)]
pub struct SessionCaptchaResolver {
    attribute: String,
    ttl: Duration,
}

impl Default for SessionCaptchaResolver {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_CAPTCHA_ATTRIBUTE.to_string(),
            ttl: DEFAULT_CAPTCHA_TTL,
        }
    }
}

impl SessionCaptchaResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: String) -> Self {
        self.attribute = attribute;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Store a freshly generated captcha answer in the session.
    pub fn issue(&self, session: &dyn Session, value: &str) {
        let issued = IssuedCaptcha {
            value: value.to_string(),
            issued_at: Utc::now().timestamp(),
        };
        match serde_json::to_value(issued) {
            Ok(value) => session.set_attribute(&self.attribute, value),
            Err(err) => debug!("Failed to serialize captcha: {err}"),
        }
    }

    fn expired(&self, issued_at: i64) -> bool {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        Utc::now().timestamp().saturating_sub(issued_at) > ttl
    }
}

impl CaptchaResolver for SessionCaptchaResolver {
    fn valid_captcha(
        &self,
        _request: &Parts,
        session: &dyn Session,
        token: &AuthenticationToken,
    ) -> Result<bool, AuthenticationError> {
        let Some(answer) = token.captcha().filter(|answer| !answer.trim().is_empty()) else {
            return Err(AuthenticationError::CaptchaRequired);
        };

        let Some(stored) = session.remove_attribute(&self.attribute) else {
            return Err(AuthenticationError::InvalidCaptcha(
                "no captcha was issued for this session".to_string(),
            ));
        };

        let issued: IssuedCaptcha = serde_json::from_value(stored)
            .map_err(|err| AuthenticationError::InvalidCaptcha(err.to_string()))?;

        if self.expired(issued.issued_at) {
            return Err(AuthenticationError::ExpiredCaptcha);
        }

        Ok(issued.value.eq_ignore_ascii_case(answer.trim()))
    }
}
