//! Tower layer binding a [`Subject`] to every request.
//!
//! Flow Overview: read the session cookie, resolve it against the registry,
//! expose the subject as `Arc<dyn Subject>` in the request extensions, then
//! emit `Set-Cookie` when the session was created or destroyed downstream.

use axum::{
    body::Body,
    http::{
        HeaderMap, HeaderValue, Request,
        header::{COOKIE, SET_COOKIE},
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
use tracing::error;

use super::{
    session::MemorySessionRegistry,
    subject::{HostSubject, SessionChange},
};
use crate::authc::{Realm, Subject};

pub const SESSION_COOKIE_NAME: &str = "portier_session";

#[derive(Clone)]
pub struct SubjectLayer {
    realm: Arc<dyn Realm>,
    registry: Arc<MemorySessionRegistry>,
}

impl SubjectLayer {
    #[must_use]
    pub fn new(realm: Arc<dyn Realm>, registry: Arc<MemorySessionRegistry>) -> Self {
        Self { realm, registry }
    }
}

impl<S> Layer<S> for SubjectLayer {
    type Service = SubjectService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SubjectService {
            inner,
            realm: self.realm.clone(),
            registry: self.registry.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SubjectService<S> {
    inner: S,
    realm: Arc<dyn Realm>,
    registry: Arc<MemorySessionRegistry>,
}

impl<S> Service<Request<Body>> for SubjectService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        // Unknown or stale cookies are treated as "no session".
        let registry = self.registry.clone();
        let session = extract_session_id(req.headers()).and_then(|id| registry.get(&id));
        let subject = Arc::new(HostSubject::new(
            self.realm.clone(),
            self.registry.clone(),
            session,
        ));
        let bound: Arc<dyn Subject> = subject.clone();
        req.extensions_mut().insert(bound);

        Box::pin(async move {
            let mut response = inner
                .call(req)
                .await
                .unwrap_or_else(|infallible| match infallible {})
                .into_response();

            let cookie = match subject.change() {
                SessionChange::Unchanged => None,
                SessionChange::Created => subject
                    .session_id()
                    .map(|id| session_cookie(&id, registry.idle_ttl().as_secs())),
                SessionChange::Destroyed => Some(clear_session_cookie()),
            };

            if let Some(cookie) = cookie {
                match cookie {
                    Ok(value) => {
                        response.headers_mut().append(SET_COOKIE, value);
                    }
                    Err(err) => error!("Failed to build session cookie: {err}"),
                }
            }

            Ok(response)
        })
    }
}

fn session_cookie(
    id: &str,
    ttl_seconds: u64,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    ))
}

fn clear_session_cookie() -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    ))
}

fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty() {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}
