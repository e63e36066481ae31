//! Authentication building blocks shared by the web filters.
//!
//! Nothing here verifies passwords or stores sessions: [`Subject`], [`Session`]
//! and [`Realm`] are implemented by the host stack (see [`crate::host`] for the
//! in-memory reference adapters).

mod captcha;
mod error;
mod failure;
mod response_code;
mod subject;
mod token;

pub use captcha::{CaptchaResolver, DEFAULT_CAPTCHA_ATTRIBUTE, SessionCaptchaResolver};
pub use error::AuthenticationError;
pub use failure::AuthenticationFailureHandler;
pub use response_code::{AuthcResponseCode, UnknownResponseCode};
pub use subject::{Realm, Session, Subject, counter_attribute, parse_counter};
pub use token::AuthenticationToken;
