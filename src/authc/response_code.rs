//! Response codes returned to clients alongside authentication payloads.
//!
//! Each entry maps a symbolic name to a display code and an i18n message key.
//! `SC_AUTHC_SUCCESS` and `SC_AUTHZ_SUCCESS` share the code `"200"`: the two
//! are told apart by the endpoint that produced them, not by the code.
//! `SC_AUTHC_ERROR` and `SC_AUTHC_LOGOUT` reuse the HTTP status the host
//! answers with (500 and the session-logout 401).

use std::{fmt, str::FromStr};

macro_rules! response_codes {
    ($($variant:ident => ($name:literal, $code:expr, $key:literal)),+ $(,)?) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum AuthcResponseCode {
            $($variant),+
        }

        impl AuthcResponseCode {
            /// Every entry, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Display code sent to clients.
            #[must_use]
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            /// Message key used for localized error text.
            #[must_use]
            pub const fn msg_key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key),+
                }
            }

            /// Symbolic name, e.g. `SC_AUTHC_SUCCESS`.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }
    };
}

response_codes! {
    AuthcSuccess => ("SC_AUTHC_SUCCESS", "200", "shiro.authc.success"),
    AuthcError => ("SC_AUTHC_ERROR", "500", "shiro.authc.error"),
    AuthcLogout => ("SC_AUTHC_LOGOUT", "401", "shiro.authc.logout"),
    AuthcFail => ("SC_AUTHC_FAIL", "10001", "shiro.authc.fail"),
    AuthcMethodNotAllowed => ("SC_AUTHC_METHOD_NOT_ALLOWED", "10002", "shiro.authc.method-not-supported"),
    AuthcExcessiveAttempts => ("SC_AUTHC_EXCESSIVE_ATTEMPTS", "10003", "shiro.authc.excessive.attempts"),
    AuthcCaptchaSendFail => ("SC_AUTHC_CAPTCHA_SEND_FAIL", "10004", "shiro.authc.captcha.send-fail"),
    AuthcCaptchaRequired => ("SC_AUTHC_CAPTCHA_REQUIRED", "10005", "shiro.authc.captcha.required"),
    AuthcCaptchaExpired => ("SC_AUTHC_CAPTCHA_EXPIRED", "10006", "shiro.authc.captcha.expired"),
    AuthcCaptchaInvalid => ("SC_AUTHC_CAPTCHA_INVALID", "10007", "shiro.authc.captcha.invalid"),
    AuthcCaptchaIncorrect => ("SC_AUTHC_CAPTCHA_INCORRECT", "10008", "shiro.authc.captcha.incorrect"),
    AuthcCredentialsExpired => ("SC_AUTHC_CREDENTIALS_EXPIRED", "10009", "shiro.authc.credentials.expired"),
    AuthcCredentialsIncorrect => ("SC_AUTHC_CREDENTIALS_INCORRECT", "10010", "shiro.authc.credentials.incorrect"),
    AuthcUserUnregistered => ("SC_AUTHC_USER_UNREGISTERED", "10011", "shiro.authc.principal.unregistered"),
    AuthcUserRegistered => ("SC_AUTHC_USER_REGISTERED", "10012", "shiro.authc.principal.registered"),
    AuthcUserNotFound => ("SC_AUTHC_USER_NOT_FOUND", "10013", "shiro.authc.principal.not-found"),
    AuthcUserDisabled => ("SC_AUTHC_USER_DISABLED", "10014", "shiro.authc.principal.disabled"),
    AuthcUserExpired => ("SC_AUTHC_USER_EXPIRED", "10015", "shiro.authc.principal.expired"),
    AuthcUserLocked => ("SC_AUTHC_USER_LOCKED", "10016", "shiro.authc.principal.locked"),
    AuthcUserNoRole => ("SC_AUTHC_USER_NO_ROLE", "10017", "shiro.authc.principal.no-role"),

    AuthcSessionKickedout => ("SC_AUTHC_SESSION_KICKEDOUT", "10018", "shiro.authc.session.kickedout"),
    AuthcSessionRestricted => ("SC_AUTHC_SESSION_RESTRICTED", "10019", "shiro.authc.session.restricted"),
    AuthcSessionTerminalRestricted => ("SC_AUTHC_SESSION_TERMINAL_RESTRICTED", "10020", "shiro.authc.session.terminal.restricted"),

    AuthzSuccess => ("SC_AUTHZ_SUCCESS", "200", "shiro.authz.success"),
    AuthzFail => ("SC_AUTHZ_FAIL", "10021", "shiro.authz.fail"),
    AuthzCodeRequired => ("SC_AUTHZ_CODE_REQUIRED", "10022", "shiro.authz.code.required"),
    AuthzCodeExpired => ("SC_AUTHZ_CODE_EXPIRED", "10023", "shiro.authz.code.expired"),
    AuthzCodeInvalid => ("SC_AUTHZ_CODE_INVALID", "10024", "shiro.authz.code.invalid"),
    AuthzCodeIncorrect => ("SC_AUTHZ_CODE_INCORRECT", "10025", "shiro.authz.code.incorrect"),
    AuthzDingtalkRequired => ("SC_AUTHZ_DINGTALK_REQUIRED", "10026", "shiro.authz.dingtalk.required"),
    AuthzDingtalkExpired => ("SC_AUTHZ_DINGTALK_EXPIRED", "10027", "shiro.authz.dingtalk.expired"),
    AuthzDingtalkInvalid => ("SC_AUTHZ_DINGTALK_INVALID", "10028", "shiro.authz.dingtalk.invalid"),
    AuthzDingtalkIncorrect => ("SC_AUTHZ_DINGTALK_INCORRECT", "10029", "shiro.authz.dingtalk.incorrect"),
    AuthzTicketIssued => ("SC_AUTHZ_TICKET_ISSUED", "10030", "shiro.authz.ticket.issued"),
    AuthzTicketRequired => ("SC_AUTHZ_TICKET_REQUIRED", "10031", "shiro.authz.ticket.required"),
    AuthzTicketExpired => ("SC_AUTHZ_TICKET_EXPIRED", "10032", "shiro.authz.ticket.expired"),
    AuthzTicketInvalid => ("SC_AUTHZ_TICKET_INVALID", "10033", "shiro.authz.ticket.invalid"),
    AuthzTicketIncorrect => ("SC_AUTHZ_TICKET_INCORRECT", "10034", "shiro.authz.ticket.incorrect"),
    AuthzTokenIssued => ("SC_AUTHZ_TOKEN_ISSUED", "10035", "shiro.authz.token.issued"),
    AuthzTokenRequired => ("SC_AUTHZ_TOKEN_REQUIRED", "10036", "shiro.authz.token.required"),
    AuthzTokenExpired => ("SC_AUTHZ_TOKEN_EXPIRED", "10037", "shiro.authz.token.expired"),
    AuthzTokenInvalid => ("SC_AUTHZ_TOKEN_INVALID", "10038", "shiro.authz.token.invalid"),
    AuthzTokenIncorrect => ("SC_AUTHZ_TOKEN_INCORRECT", "10039", "shiro.authz.token.incorrect"),
    AuthzThirdPartyService => ("SC_AUTHZ_THIRD_PARTY_SERVICE", "10040", "shiro.authz.server.error"),
}

impl fmt::Display for AuthcResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown response code: {0}")]
pub struct UnknownResponseCode(pub String);

impl FromStr for AuthcResponseCode {
    type Err = UnknownResponseCode;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|entry| entry.name() == name)
            .ok_or_else(|| UnknownResponseCode(name.to_string()))
    }
}
