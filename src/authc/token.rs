//! Credentials submitted by a login request.

use secrecy::{ExposeSecret, SecretString};

/// Username/password token, optionally carrying a captcha answer.
///
/// A token built while captcha checking is enabled always carries the captcha
/// slot (possibly empty), which is what makes it eligible for captcha
/// validation once the retry threshold is exceeded.
#[derive(Clone, Debug, Default)]
pub struct AuthenticationToken {
    username: String,
    password: SecretString,
    host: Option<String>,
    remember_me: bool,
    captcha: Option<Option<String>>,
}

impl AuthenticationToken {
    #[must_use]
    pub fn new(username: String, password: SecretString) -> Self {
        Self {
            username,
            password,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_remember_me(mut self, remember_me: bool) -> Self {
        self.remember_me = remember_me;
        self
    }

    /// Attach the captcha slot; `None` means the client sent no captcha.
    #[must_use]
    pub fn with_captcha(mut self, captcha: Option<String>) -> Self {
        self.captcha = Some(captcha);
        self
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub const fn remember_me(&self) -> bool {
        self.remember_me
    }

    /// Whether the token was built for captcha-protected logins.
    #[must_use]
    pub const fn is_captcha_token(&self) -> bool {
        self.captcha.is_some()
    }

    /// The submitted captcha answer, if any.
    #[must_use]
    pub fn captcha(&self) -> Option<&str> {
        self.captcha.as_ref().and_then(Option::as_deref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let token = AuthenticationToken::new("alice".to_string(), SecretString::from("s3cret"));
        let debug = format!("{token:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("s3cret"));
        assert_eq!(token.password(), "s3cret");
    }

    #[test]
    fn captcha_slot_is_distinct_from_answer() {
        let plain = AuthenticationToken::new("alice".to_string(), SecretString::from("pw"));
        assert!(!plain.is_captcha_token());

        let empty = plain.clone().with_captcha(None);
        assert!(empty.is_captcha_token());
        assert_eq!(empty.captcha(), None);

        let answered = plain.with_captcha(Some("x7k2".to_string()));
        assert_eq!(answered.captcha(), Some("x7k2"));
    }
}
