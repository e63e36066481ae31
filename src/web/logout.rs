//! Logout endpoint with ordered listeners.

use axum::{
    body::Body,
    http::{Request, StatusCode, request::Parts},
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
use tracing::{debug, error, info};

use super::json::JsonPayload;
use crate::authc::{AuthcResponseCode, AuthenticationError, Subject};

pub const DEFAULT_LOGOUT_URL: &str = "/logout";

const MSG_SUCCESS: &str = "Logout Success.";
const MSG_FAILURE: &str = "Logout Exception.";

/// Observer around `Subject::logout`.
///
/// Listeners run in ascending [`LogoutListener::order`]; ties keep
/// registration order.
pub trait LogoutListener: Send + Sync {
    fn order(&self) -> i32 {
        i32::MIN
    }

    fn before_logout(&self, _subject: &dyn Subject, _request: &Parts) {}

    fn on_success(&self, _subject: &dyn Subject, _request: &Parts) {}

    fn on_failure(&self, _subject: &dyn Subject, _request: &Parts, _error: &AuthenticationError) {}
}

#[derive(Clone, Debug)]
pub struct LogoutConfig {
    logout_url: String,
}

impl Default for LogoutConfig {
    fn default() -> Self {
        Self {
            logout_url: DEFAULT_LOGOUT_URL.to_string(),
        }
    }
}

impl LogoutConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_logout_url(mut self, logout_url: String) -> Self {
        self.logout_url = logout_url;
        self
    }

    #[must_use]
    pub fn logout_url(&self) -> &str {
        &self.logout_url
    }
}

#[derive(Clone, Default)]
pub struct LogoutFilter {
    config: LogoutConfig,
    listeners: Vec<Arc<dyn LogoutListener>>,
}

impl LogoutFilter {
    #[must_use]
    pub fn new(config: LogoutConfig) -> Self {
        Self {
            config,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn LogoutListener>) -> Self {
        self.listeners.push(listener);
        self.listeners.sort_by_key(|listener| listener.order());
        self
    }

    #[must_use]
    pub fn config(&self) -> &LogoutConfig {
        &self.config
    }
}

impl<S> Layer<S> for LogoutFilter {
    type Service = LogoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LogoutService {
            inner,
            filter: Arc::new(self.clone()),
        }
    }
}

#[derive(Clone)]
pub struct LogoutService<S> {
    inner: S,
    filter: Arc<LogoutFilter>,
}

impl<S> Service<Request<Body>> for LogoutService<S>
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
        if req.uri().path() != self.filter.config.logout_url {
            let clone = self.inner.clone();
            let mut inner = std::mem::replace(&mut self.inner, clone);
            return Box::pin(async move {
                let response = inner
                    .call(req)
                    .await
                    .unwrap_or_else(|infallible| match infallible {});
                Ok(response.into_response())
            });
        }

        let filter = self.filter.clone();
        Box::pin(async move {
            let (parts, _body) = req.into_parts();
            Ok(filter.logout(&parts))
        })
    }
}

impl LogoutFilter {
    fn logout(&self, parts: &Parts) -> Response {
        let Some(subject) = parts.extensions.get::<Arc<dyn Subject>>() else {
            error!("No subject bound to request {}", parts.uri.path());
            return JsonPayload::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                AuthcResponseCode::AuthcError,
                MSG_FAILURE,
            )
            .into_response();
        };

        for listener in &self.listeners {
            listener.before_logout(subject.as_ref(), parts);
        }

        let principal = subject.principal();
        match subject.logout() {
            Ok(()) => {
                info!("Logout succeeded for {}", principal.as_deref().unwrap_or("anonymous"));
                for listener in &self.listeners {
                    listener.on_success(subject.as_ref(), parts);
                }
                JsonPayload::new(StatusCode::OK, AuthcResponseCode::AuthcLogout, MSG_SUCCESS)
                    .into_response()
            }
            Err(err) => {
                debug!("Encountered error during logout: {err}");
                for listener in &self.listeners {
                    listener.on_failure(subject.as_ref(), parts, &err);
                }
                JsonPayload::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AuthcResponseCode::AuthcError,
                    MSG_FAILURE,
                )
                .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authc::{AuthenticationToken, Session};
    use crate::host::{MemorySession, MemorySessionRegistry};
    use anyhow::Result;
    use axum::{Router, routing::get};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct FakeSubject {
        fail: bool,
        session: Arc<MemorySession>,
    }

    impl Subject for FakeSubject {
        fn is_authenticated(&self) -> bool {
            true
        }

        fn principal(&self) -> Option<String> {
            Some("alice".to_string())
        }

        fn login(&self, _token: &AuthenticationToken) -> Result<(), AuthenticationError> {
            Ok(())
        }

        fn logout(&self) -> Result<(), AuthenticationError> {
            if self.fail {
                Err(AuthenticationError::Authentication("session store down".to_string()))
            } else {
                Ok(())
            }
        }

        fn session(&self) -> Arc<dyn Session> {
            self.session.clone()
        }
    }

    struct Recorder {
        name: &'static str,
        order: i32,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn push(&self, event: &str) {
            if let Ok(mut events) = self.events.lock() {
                events.push(format!("{}:{event}", self.name));
            }
        }
    }

    impl LogoutListener for Recorder {
        fn order(&self) -> i32 {
            self.order
        }

        fn before_logout(&self, _subject: &dyn Subject, _request: &Parts) {
            self.push("before");
        }

        fn on_success(&self, _subject: &dyn Subject, _request: &Parts) {
            self.push("success");
        }

        fn on_failure(&self, _subject: &dyn Subject, _request: &Parts, _error: &AuthenticationError) {
            self.push("failure");
        }
    }

    fn app(fail: bool, events: &Arc<Mutex<Vec<String>>>) -> Router {
        let registry = MemorySessionRegistry::new();
        let subject: Arc<dyn Subject> = Arc::new(FakeSubject {
            fail,
            session: registry.create(),
        });
        let filter = LogoutFilter::new(LogoutConfig::new())
            .with_listener(Arc::new(Recorder {
                name: "late",
                order: 10,
                events: events.clone(),
            }))
            .with_listener(Arc::new(Recorder {
                name: "early",
                order: -10,
                events: events.clone(),
            }));
        Router::new()
            .route("/other", get(|| async { "other" }))
            .route("/logout", get(|| async { "unreachable" }))
            .layer(filter)
            .layer(axum::Extension(subject))
    }

    fn events(events: &Arc<Mutex<Vec<String>>>) -> Result<Vec<String>> {
        Ok(events
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?
            .clone())
    }

    #[tokio::test]
    async fn logout_notifies_listeners_in_order() -> Result<()> {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let response = app(false, &recorded)
            .oneshot(Request::builder().uri("/logout").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(value["status"], 200);
        assert_eq!(value["code"], "401");
        assert_eq!(value["message"], MSG_SUCCESS);
        assert_eq!(
            events(&recorded)?,
            vec!["early:before", "late:before", "early:success", "late:success"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_logout_is_reported() -> Result<()> {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let response = app(true, &recorded)
            .oneshot(Request::builder().uri("/logout").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            events(&recorded)?,
            vec!["early:before", "late:before", "early:failure", "late:failure"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn other_paths_pass_through() -> Result<()> {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let response = app(false, &recorded)
            .oneshot(Request::builder().uri("/other").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(events(&recorded)?.is_empty());
        Ok(())
    }

    #[test]
    fn default_order_runs_first() {
        struct Silent;
        impl LogoutListener for Silent {}
        assert_eq!(Silent.order(), i32::MIN);
    }
}
