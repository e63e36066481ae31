//! Bundled server: the filters in front of a small axum application.
//!
//! Routes behind authentication: `/`, the login URL (for already authenticated
//! callers) and `/v1/me`. The logout URL, `/captcha` (when enabled) and
//! `/health` are reachable anonymously.
//!
//! `/health` sits outside every layer, so it carries no `Access-Control-*`
//! headers and answers `OPTIONS` itself.

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    routing::{any, get},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, debug_span, error, info};
use ulid::Ulid;

use crate::{
    authc::SessionCaptchaResolver,
    host::{MemorySessionRegistry, StaticRealm, SubjectLayer},
    web::{
        AuthcConfig, CorsConfig, CorsFilter, LogoutConfig, LogoutFilter, RestAuthenticationFilter,
    },
};

mod audit;
pub mod handlers;

pub use self::audit::{LoginAudit, LogoutAudit};

const X_REQUEST_ID: &str = "x-request-id";

/// Fixed routes of the bundled server. The login and logout URLs must not
/// reuse them.
pub const RESERVED_PATHS: &[&str] = &["/", "/v1/me", "/health", "/captcha"];

#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub cors: CorsConfig,
    pub authc: AuthcConfig,
    pub logout: LogoutConfig,
    pub realm: StaticRealm,
}

/// Build the application router.
///
/// # Panics
/// Panics when the login or logout URL is one of [`RESERVED_PATHS`] or both
/// URLs are equal, since axum rejects overlapping routes.
#[must_use]
pub fn router(settings: Settings, registry: Arc<MemorySessionRegistry>) -> Router {
    let Settings {
        cors,
        authc,
        logout,
        realm,
    } = settings;

    let login_url = authc.login_url().to_string();
    let logout_url = logout.logout_url().to_string();
    let captcha_enabled = authc.captcha_enabled();
    let resolver = Arc::new(SessionCaptchaResolver::new());

    let mut authc_filter =
        RestAuthenticationFilter::new(authc).with_failure_handler(Arc::new(LoginAudit));
    if captcha_enabled {
        authc_filter = authc_filter.with_captcha_resolver(resolver.clone());
    }

    let protected = Router::new()
        .route("/", get(handlers::me))
        .route(&login_url, get(handlers::me).post(handlers::me))
        .route("/v1/me", get(handlers::me))
        .route_layer(authc_filter);

    let mut app = Router::new()
        .merge(protected)
        // answered by the logout filter
        .route(&logout_url, any(|| async { StatusCode::NO_CONTENT }));

    if captcha_enabled {
        app = app.route("/captcha", get(handlers::captcha));
    }

    app.layer(LogoutFilter::new(logout).with_listener(Arc::new(LogoutAudit)))
        .layer(Extension(resolver))
        .layer(SubjectLayer::new(Arc::new(realm), registry))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(X_REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    X_REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsFilter::new(cors)),
        )
        .route("/health", get(handlers::health).options(handlers::health))
}

/// Serve the application until interrupted.
/// # Errors
/// Returns an error if the server fails to bind or serve.
pub async fn new(port: u16, settings: Settings) -> Result<()> {
    let registry = Arc::new(MemorySessionRegistry::new());
    let app = router(settings, registry);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Gracefully shutdown");
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", path, ?headers, request_id)
}
