//! JSON payloads written by the filters instead of redirects.

use axum::{
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::authc::AuthcResponseCode;

pub const APPLICATION_JSON_UTF8: &str = "application/json;charset=UTF-8";

/// Value of the `captcha` field once the retry threshold is exceeded.
pub const CAPTCHA_REQUIRED_FLAG: &str = "1";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JsonPayload {
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
}

impl JsonPayload {
    #[must_use]
    pub fn new(status: StatusCode, code: AuthcResponseCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            code: code.code().to_string(),
            message: message.into(),
            captcha: None,
        }
    }

    /// Ask the client to show a captcha on the next attempt.
    #[must_use]
    pub fn with_captcha(mut self) -> Self {
        self.captcha = Some(CAPTCHA_REQUIRED_FLAG.to_string());
        self
    }
}

impl IntoResponse for JsonPayload {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_string(&self).unwrap_or_default();
        (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON_UTF8))],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn payload_sets_status_and_content_type() -> Result<()> {
        let response = JsonPayload::new(
            StatusCode::BAD_REQUEST,
            AuthcResponseCode::AuthcMethodNotAllowed,
            "nope",
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static(APPLICATION_JSON_UTF8))
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value["status"], 400);
        assert_eq!(value["code"], "10002");
        assert_eq!(value["message"], "nope");
        assert!(value.get("captcha").is_none());
        Ok(())
    }

    #[test]
    fn captcha_flag_is_serialized_when_set() -> Result<()> {
        let payload = JsonPayload::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            AuthcResponseCode::AuthcExcessiveAttempts,
            "too many",
        )
        .with_captcha();
        let value = serde_json::to_value(&payload)?;
        assert_eq!(value["captcha"], "1");
        Ok(())
    }
}
