use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::authc::{AuthenticationError, AuthenticationToken, Realm};

/// Fixed set of `username -> password` accounts.
#[derive(Clone, Debug, Default)]
pub struct StaticRealm {
    accounts: HashMap<String, SecretString>,
}

impl StaticRealm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_account(mut self, username: String, password: SecretString) -> Self {
        self.accounts.insert(username, password);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Realm for StaticRealm {
    fn authenticate(&self, token: &AuthenticationToken) -> Result<String, AuthenticationError> {
        let Some(expected) = self.accounts.get(token.username()) else {
            return Err(AuthenticationError::UnknownAccount(
                token.username().to_string(),
            ));
        };

        if constant_time_eq(expected.expose_secret().as_bytes(), token.password().as_bytes()) {
            Ok(token.username().to_string())
        } else {
            Err(AuthenticationError::IncorrectCredentials)
        }
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
