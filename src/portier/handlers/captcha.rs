use axum::{Extension, response::Json};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::authc::{SessionCaptchaResolver, Subject};

const CAPTCHA_LENGTH: usize = 4;

#[derive(Serialize, Deserialize, Debug)]
pub struct Captcha {
    pub captcha: String,
}

/// Issue a fresh captcha into the caller's session.
///
/// The answer is returned as text; clients are expected to render it.
pub async fn captcha(
    Extension(subject): Extension<Arc<dyn Subject>>,
    Extension(resolver): Extension<Arc<SessionCaptchaResolver>>,
) -> Json<Captcha> {
    let value: String = rand::thread_rng()
        .sample_iter(Alphanumeric)
        .take(CAPTCHA_LENGTH)
        .map(char::from)
        .collect();

    resolver.issue(subject.session().as_ref(), &value);

    Json(Captcha { captcha: value })
}
