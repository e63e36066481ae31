//! Request inspection helpers shared by the filters.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, header::CONTENT_TYPE, request::Parts},
};
use std::{collections::HashMap, net::SocketAddr};

pub const X_REQUESTED_WITH: &str = "x-requested-with";
const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Whether the request was sent by `XMLHttpRequest`/`fetch` with the usual marker.
#[must_use]
pub fn is_ajax_request(headers: &HeaderMap) -> bool {
    headers
        .get(X_REQUESTED_WITH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case(XML_HTTP_REQUEST))
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer.
#[must_use]
pub fn remote_addr(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("unknown"));
    if let Some(addr) = forwarded {
        return Some(addr.to_string());
    }

    let real_ip = parts
        .headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(addr) = real_ip {
        return Some(addr.to_string());
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

/// Lenient boolean used for flags such as `rememberMe`.
#[must_use]
pub fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "true" | "t" | "1" | "enabled" | "y" | "yes" | "on"
        )
    })
}

/// Request parameters merged from the query string and the body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    /// Raw parameter value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Trimmed parameter value, `None` when missing or blank.
    #[must_use]
    pub fn clean(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn insert_missing(&mut self, name: String, value: String) {
        self.0.entry(name).or_insert(value);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("Failed to read request body: {0}")]
    Body(#[from] axum::Error),
    #[error("Malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Collect parameters from a form-encoded or JSON body, then the query string.
///
/// Body values win over query values of the same name.
///
/// # Errors
/// Returns an error when the body exceeds `limit` bytes or is malformed JSON.
pub async fn read_params(parts: &Parts, body: Body, limit: usize) -> Result<Params, ParamsError> {
    let bytes = axum::body::to_bytes(body, limit).await?;
    let mut params = Params::default();

    if !bytes.is_empty() {
        if is_json(&parts.headers) {
            let value: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&bytes)?;
            for (name, value) in value {
                let value = match value {
                    serde_json::Value::String(text) => text,
                    serde_json::Value::Null => continue,
                    other => other.to_string(),
                };
                params.insert_missing(name, value);
            }
        } else {
            for (name, value) in url::form_urlencoded::parse(&bytes) {
                params.insert_missing(name.into_owned(), value.into_owned());
            }
        }
    }

    if let Some(query) = parts.uri.query() {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert_missing(name.into_owned(), value.into_owned());
        }
    }

    Ok(params)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::{HeaderValue, Request};

    fn parts(builder: axum::http::request::Builder) -> Result<Parts> {
        let (parts, ()) = builder.body(())?.into_parts();
        Ok(parts)
    }

    #[test]
    fn ajax_marker_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax_request(&headers));
        headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("xmlhttprequest"));
        assert!(is_ajax_request(&headers));
        headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("fetch"));
        assert!(!is_ajax_request(&headers));
    }

    #[test]
    fn remote_addr_prefers_forwarded_header() -> Result<()> {
        let parts = parts(
            Request::builder()
                .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                .header("x-real-ip", "10.0.0.2"),
        )?;
        assert_eq!(remote_addr(&parts), Some("203.0.113.7".to_string()));

        let parts = parts_with_peer()?;
        assert_eq!(remote_addr(&parts), Some("192.0.2.10".to_string()));
        Ok(())
    }

    fn parts_with_peer() -> Result<Parts> {
        let mut parts = parts(Request::builder())?;
        let addr: SocketAddr = "192.0.2.10:4242".parse()?;
        parts.extensions.insert(ConnectInfo(addr));
        Ok(parts)
    }

    #[test]
    fn truthy_values() {
        for value in ["true", "T", "1", "enabled", "y", "YES", "on"] {
            assert!(is_true(Some(value)), "{value} should be true");
        }
        for value in ["false", "0", "off", ""] {
            assert!(!is_true(Some(value)), "{value} should be false");
        }
        assert!(!is_true(None));
    }

    #[tokio::test]
    async fn reads_form_body_and_query() -> Result<()> {
        let parts = parts(Request::builder().uri("/login?username=query&lang=en"))?;
        let params = read_params(
            &parts,
            Body::from("username=alice&password=wonder%20land"),
            1024,
        )
        .await?;
        assert_eq!(params.get("username"), Some("alice"));
        assert_eq!(params.get("password"), Some("wonder land"));
        assert_eq!(params.get("lang"), Some("en"));
        Ok(())
    }

    #[tokio::test]
    async fn reads_json_body() -> Result<()> {
        let parts = parts(
            Request::builder()
                .uri("/login")
                .header(CONTENT_TYPE, "application/json; charset=utf-8"),
        )?;
        let body = r#"{"username":"alice","password":"pw","rememberMe":true,"captcha":null}"#;
        let params = read_params(&parts, Body::from(body), 1024).await?;
        assert_eq!(params.get("username"), Some("alice"));
        assert_eq!(params.get("rememberMe"), Some("true"));
        assert_eq!(params.get("captcha"), None);
        Ok(())
    }

    #[test]
    fn clean_trims_and_drops_blank() {
        let mut params = Params::default();
        params.insert_missing("a".to_string(), "  x ".to_string());
        params.insert_missing("b".to_string(), "   ".to_string());
        assert_eq!(params.clean("a"), Some("x".to_string()));
        assert_eq!(params.clean("b"), None);
        assert_eq!(params.clean("c"), None);
    }
}
