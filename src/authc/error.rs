//! Authentication failures raised by realms, captcha resolvers and filters.

use super::AuthcResponseCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    #[error("{0}")]
    Authentication(String),
    #[error("Unknown account: {0}")]
    UnknownAccount(String),
    #[error("Incorrect credentials")]
    IncorrectCredentials,
    #[error("Expired credentials")]
    ExpiredCredentials,
    #[error("Account is disabled: {0}")]
    DisabledAccount(String),
    #[error("Account is locked: {0}")]
    LockedAccount(String),
    #[error("Excessive login attempts")]
    ExcessiveAttempts,
    #[error("Captcha is required")]
    CaptchaRequired,
    #[error("Captcha is invalid: {0}")]
    InvalidCaptcha(String),
    #[error("{0}")]
    IncorrectCaptcha(String),
    #[error("Captcha has expired")]
    ExpiredCaptcha,
}

impl AuthenticationError {
    /// Whether this failure belongs to the credentials family.
    ///
    /// Captcha failures count as credential failures: the captcha is a second
    /// factor submitted alongside the password.
    #[must_use]
    pub const fn is_credentials(&self) -> bool {
        matches!(
            self,
            Self::IncorrectCredentials
                | Self::ExpiredCredentials
                | Self::CaptchaRequired
                | Self::InvalidCaptcha(_)
                | Self::IncorrectCaptcha(_)
                | Self::ExpiredCaptcha
        )
    }

    /// Response code reported to clients for this failure.
    #[must_use]
    pub const fn response_code(&self) -> AuthcResponseCode {
        match self {
            Self::Authentication(_) => AuthcResponseCode::AuthcFail,
            Self::UnknownAccount(_) => AuthcResponseCode::AuthcUserNotFound,
            Self::IncorrectCredentials => AuthcResponseCode::AuthcCredentialsIncorrect,
            Self::ExpiredCredentials => AuthcResponseCode::AuthcCredentialsExpired,
            Self::DisabledAccount(_) => AuthcResponseCode::AuthcUserDisabled,
            Self::LockedAccount(_) => AuthcResponseCode::AuthcUserLocked,
            Self::ExcessiveAttempts => AuthcResponseCode::AuthcExcessiveAttempts,
            Self::CaptchaRequired => AuthcResponseCode::AuthcCaptchaRequired,
            Self::InvalidCaptcha(_) => AuthcResponseCode::AuthcCaptchaInvalid,
            Self::IncorrectCaptcha(_) => AuthcResponseCode::AuthcCaptchaIncorrect,
            Self::ExpiredCaptcha => AuthcResponseCode::AuthcCaptchaExpired,
        }
    }

    /// Short type name used in audit logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AuthenticationError",
            Self::UnknownAccount(_) => "UnknownAccount",
            Self::IncorrectCredentials => "IncorrectCredentials",
            Self::ExpiredCredentials => "ExpiredCredentials",
            Self::DisabledAccount(_) => "DisabledAccount",
            Self::LockedAccount(_) => "LockedAccount",
            Self::ExcessiveAttempts => "ExcessiveAttempts",
            Self::CaptchaRequired => "CaptchaRequired",
            Self::InvalidCaptcha(_) => "InvalidCaptcha",
            Self::IncorrectCaptcha(_) => "IncorrectCaptcha",
            Self::ExpiredCaptcha => "ExpiredCaptcha",
        }
    }
}
