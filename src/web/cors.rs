//! Cross-origin support.
//!
//! Every response gets the `Access-Control-Allow-*` headers. Preflight
//! `OPTIONS` requests are answered here with `200` and never reach the inner
//! service. `Access-Control-Allow-Origin` must not be `*` when credentials are
//! allowed; browsers reject that combination.

use axum::{
    body::Body,
    http::{
        HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN,
        },
    },
    response::{IntoResponse, Response},
};
use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::{debug, trace};

pub const DEFAULT_ACCESS_CONTROL_ALLOW_METHODS: &str = "PUT,POST,GET,DELETE,OPTIONS";
pub const DEFAULT_ACCESS_CONTROL_ALLOW_HEADERS: &str =
    "Origin, X-Requested-With, Content-Type, Accept";
const DEFAULT_ACCESS_CONTROL_ALLOW_ORIGIN: &str = "*";

#[derive(Clone, Debug)]
pub struct CorsConfig {
    allow_credentials: bool,
    allow_origin: String,
    allow_methods: String,
    allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_credentials: false,
            allow_origin: DEFAULT_ACCESS_CONTROL_ALLOW_ORIGIN.to_string(),
            allow_methods: DEFAULT_ACCESS_CONTROL_ALLOW_METHODS.to_string(),
            allow_headers: DEFAULT_ACCESS_CONTROL_ALLOW_HEADERS.to_string(),
        }
    }
}

impl CorsConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// An empty value echoes the request `Origin` instead.
    #[must_use]
    pub fn with_allow_origin(mut self, origin: String) -> Self {
        self.allow_origin = origin;
        self
    }

    /// An empty value falls back to [`DEFAULT_ACCESS_CONTROL_ALLOW_METHODS`].
    #[must_use]
    pub fn with_allow_methods(mut self, methods: String) -> Self {
        self.allow_methods = methods;
        self
    }

    /// An empty value echoes `Access-Control-Request-Headers` instead.
    #[must_use]
    pub fn with_allow_headers(mut self, headers: String) -> Self {
        self.allow_headers = headers;
        self
    }

    #[must_use]
    pub const fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    #[must_use]
    pub fn allow_origin(&self) -> &str {
        &self.allow_origin
    }

    #[must_use]
    pub fn allow_methods(&self) -> &str {
        &self.allow_methods
    }

    #[must_use]
    pub fn allow_headers(&self) -> &str {
        &self.allow_headers
    }

    /// Headers to write for a request carrying `request_headers`.
    ///
    /// A header is left out when it is neither configured nor derivable from
    /// the request.
    #[must_use]
    pub fn response_headers(&self, request_headers: &HeaderMap) -> Vec<(HeaderName, HeaderValue)> {
        let origin = configured(&self.allow_origin)
            .and_then(|value| HeaderValue::from_str(value).ok())
            .or_else(|| request_headers.get(ORIGIN).cloned());
        let methods = configured(&self.allow_methods)
            .and_then(|value| HeaderValue::from_str(value).ok())
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ACCESS_CONTROL_ALLOW_METHODS));
        let headers = configured(&self.allow_headers)
            .and_then(|value| HeaderValue::from_str(value).ok())
            .or_else(|| request_headers.get(ACCESS_CONTROL_REQUEST_HEADERS).cloned());

        let credentials = if self.allow_credentials {
            HeaderValue::from_static("true")
        } else {
            HeaderValue::from_static("false")
        };

        let mut out = vec![(ACCESS_CONTROL_ALLOW_CREDENTIALS, credentials)];
        if let Some(origin) = origin {
            out.push((ACCESS_CONTROL_ALLOW_ORIGIN, origin));
        }
        out.push((ACCESS_CONTROL_ALLOW_METHODS, methods));
        if let Some(headers) = headers {
            out.push((ACCESS_CONTROL_ALLOW_HEADERS, headers));
        }
        out
    }
}

fn configured(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Tower layer injecting CORS headers and answering preflight requests.
#[derive(Clone, Debug, Default)]
pub struct CorsFilter {
    config: Arc<CorsConfig>,
}

impl CorsFilter {
    #[must_use]
    pub fn new(config: CorsConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for CorsFilter {
    type Service = CorsFilterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsFilterService {
            inner,
            config: self.config.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CorsFilterService<S> {
    inner: S,
    config: Arc<CorsConfig>,
}

impl<S> Service<Request<Body>> for CorsFilterService<S>
where
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let headers = self.config.response_headers(req.headers());

        if req.method() == Method::OPTIONS {
            debug!("Answering preflight request for {}", req.uri().path());
            return Box::pin(async move {
                let mut response = StatusCode::OK.into_response();
                apply(&mut response, headers);
                Ok(response)
            });
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner
                .call(req)
                .await
                .unwrap_or_else(|infallible| match infallible {})
                .into_response();
            trace!("Applying CORS headers");
            apply(&mut response, headers);
            Ok(response)
        })
    }
}

fn apply(response: &mut Response, headers: Vec<(HeaderName, HeaderValue)>) {
    let map = response.headers_mut();
    for (name, value) in headers {
        map.insert(name, value);
    }
}
