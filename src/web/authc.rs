//! REST-style form authentication.
//!
//! Flow Overview:
//! 1) Authenticated subjects pass straight through to the inner service.
//! 2) Requests to the login URL must be an ajax `POST`; anything else gets `400`.
//! 3) A login submission builds a token from the request parameters, checks the
//!    captcha once the session retry counter is past the threshold, then calls
//!    `Subject::login`.
//! 4) Outcomes are written as JSON; failures bump the session retry counter.
//! 5) Any other request from an anonymous subject gets `401`.

use axum::{
    body::Body,
    http::{Request, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde_json::json;
use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::{debug, error, info, trace};

use super::{
    json::JsonPayload,
    request::{Params, is_ajax_request, is_true, read_params, remote_addr},
};
use crate::authc::{
    AuthcResponseCode, AuthenticationError, AuthenticationFailureHandler, AuthenticationToken,
    CaptchaResolver, Session, Subject, parse_counter,
};

pub const DEFAULT_LOGIN_URL: &str = "/login";
pub const DEFAULT_USERNAME_PARAM: &str = "username";
pub const DEFAULT_PASSWORD_PARAM: &str = "password";
pub const DEFAULT_REMEMBER_ME_PARAM: &str = "rememberMe";
pub const DEFAULT_CAPTCHA_PARAM: &str = "captcha";
pub const DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME: &str = "portierLoginFailureRetries";
pub const DEFAULT_RETRY_TIMES_WHEN_ACCESS_DENIED: u64 = 3;
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

const MSG_SUCCESS: &str = "Authentication Success.";
const MSG_FAILURE: &str = "Authentication Exception.";
const MSG_OVER_RETRY: &str = "Over Maximum number of retry to login.";
const MSG_CAPTCHA_FAILED: &str = "Captcha validation failed!";

#[derive(Clone, Debug)]
pub struct AuthcConfig {
    login_url: String,
    username_param: String,
    password_param: String,
    remember_me_param: String,
    captcha_param: String,
    captcha_enabled: bool,
    retry_times_key_attribute: String,
    retry_times_when_access_denied: u64,
    max_body_bytes: usize,
}

impl Default for AuthcConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            username_param: DEFAULT_USERNAME_PARAM.to_string(),
            password_param: DEFAULT_PASSWORD_PARAM.to_string(),
            remember_me_param: DEFAULT_REMEMBER_ME_PARAM.to_string(),
            captcha_param: DEFAULT_CAPTCHA_PARAM.to_string(),
            captcha_enabled: false,
            retry_times_key_attribute: DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME.to_string(),
            retry_times_when_access_denied: DEFAULT_RETRY_TIMES_WHEN_ACCESS_DENIED,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AuthcConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_login_url(mut self, login_url: String) -> Self {
        self.login_url = login_url;
        self
    }

    #[must_use]
    pub fn with_username_param(mut self, param: String) -> Self {
        self.username_param = param;
        self
    }

    #[must_use]
    pub fn with_password_param(mut self, param: String) -> Self {
        self.password_param = param;
        self
    }

    #[must_use]
    pub fn with_remember_me_param(mut self, param: String) -> Self {
        self.remember_me_param = param;
        self
    }

    #[must_use]
    pub fn with_captcha_param(mut self, param: String) -> Self {
        self.captcha_param = param;
        self
    }

    #[must_use]
    pub fn with_captcha_enabled(mut self, enabled: bool) -> Self {
        self.captcha_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_retry_times_key_attribute(mut self, attribute: String) -> Self {
        self.retry_times_key_attribute = attribute;
        self
    }

    /// Failed attempts allowed before a captcha is demanded.
    #[must_use]
    pub fn with_retry_times_when_access_denied(mut self, retries: u64) -> Self {
        self.retry_times_when_access_denied = retries;
        self
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    #[must_use]
    pub fn captcha_param(&self) -> &str {
        &self.captcha_param
    }

    #[must_use]
    pub const fn captcha_enabled(&self) -> bool {
        self.captcha_enabled
    }

    #[must_use]
    pub fn retry_times_key_attribute(&self) -> &str {
        &self.retry_times_key_attribute
    }

    #[must_use]
    pub const fn retry_times_when_access_denied(&self) -> u64 {
        self.retry_times_when_access_denied
    }
}

/// Error of a rejected login, attached to the response extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginFailure(pub AuthenticationError);

#[derive(Clone)]
struct FilterState {
    config: AuthcConfig,
    captcha_resolver: Option<Arc<dyn CaptchaResolver>>,
    failure_handlers: Vec<Arc<dyn AuthenticationFailureHandler>>,
}

/// Tower layer answering login submissions with JSON.
///
/// Needs an `Arc<dyn Subject>` in the request extensions; install
/// [`crate::host::SubjectLayer`] (or an equivalent) outside of it.
#[derive(Clone)]
pub struct RestAuthenticationFilter {
    state: FilterState,
}

impl RestAuthenticationFilter {
    #[must_use]
    pub fn new(config: AuthcConfig) -> Self {
        Self {
            state: FilterState {
                config,
                captcha_resolver: None,
                failure_handlers: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn with_captcha_resolver(mut self, resolver: Arc<dyn CaptchaResolver>) -> Self {
        self.state.captcha_resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_failure_handler(mut self, handler: Arc<dyn AuthenticationFailureHandler>) -> Self {
        self.state.failure_handlers.push(handler);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AuthcConfig {
        &self.state.config
    }

    /// Captcha checks need both the flag and a resolver.
    #[must_use]
    pub fn is_captcha_enabled(&self) -> bool {
        self.state.is_captcha_enabled()
    }
}

impl<S> Layer<S> for RestAuthenticationFilter {
    type Service = RestAuthenticationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RestAuthenticationService {
            inner,
            state: Arc::new(self.state.clone()),
        }
    }
}

#[derive(Clone)]
pub struct RestAuthenticationService<S> {
    inner: S,
    state: Arc<FilterState>,
}

impl<S> Service<Request<Body>> for RestAuthenticationService<S>
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
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();

        Box::pin(async move {
            let Some(subject) = req.extensions().get::<Arc<dyn Subject>>().cloned() else {
                error!("No subject bound to request {}", req.uri().path());
                return Ok(JsonPayload::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AuthcResponseCode::AuthcError,
                    MSG_FAILURE,
                )
                .into_response());
            };

            if subject.is_authenticated() {
                let response = inner
                    .call(req)
                    .await
                    .unwrap_or_else(|infallible| match infallible {});
                return Ok(response.into_response());
            }

            Ok(state.on_access_denied(req, subject).await)
        })
    }
}

impl FilterState {
    fn is_captcha_enabled(&self) -> bool {
        self.config.captcha_enabled && self.captcha_resolver.is_some()
    }

    fn is_login_request(&self, req: &Request<Body>) -> bool {
        req.uri().path() == self.config.login_url
    }

    /// Only ajax `POST`s count as login submissions.
    fn is_login_submission(req: &Request<Body>) -> bool {
        req.method().as_str().eq_ignore_ascii_case("POST") && is_ajax_request(req.headers())
    }

    async fn on_access_denied(&self, req: Request<Body>, subject: Arc<dyn Subject>) -> Response {
        if !self.is_login_request(&req) {
            let message = format!(
                "Attempting to access a path which requires authentication.  Forwarding to the Authentication url [{}]",
                self.config.login_url
            );
            trace!("{message}");
            return JsonPayload::new(
                StatusCode::UNAUTHORIZED,
                AuthcResponseCode::AuthcFail,
                message,
            )
            .into_response();
        }

        if !Self::is_login_submission(&req) {
            let message = format!(
                "Authentication url [{}] Not Http Post request.",
                self.config.login_url
            );
            trace!("{message}");
            return JsonPayload::new(
                StatusCode::BAD_REQUEST,
                AuthcResponseCode::AuthcMethodNotAllowed,
                message,
            )
            .into_response();
        }

        trace!("Login submission detected.  Attempting to execute login.");
        self.execute_login(req, subject.as_ref()).await
    }

    async fn execute_login(&self, req: Request<Body>, subject: &dyn Subject) -> Response {
        let (parts, body) = req.into_parts();

        let token = match read_params(&parts, body, self.config.max_body_bytes).await {
            Ok(params) => self.create_token(&parts, &params),
            Err(err) => {
                debug!("Failed to read login parameters: {err}");
                Err(AuthenticationError::Authentication(err.to_string()))
            }
        };

        let token = match token {
            Ok(token) => token,
            Err(err) => return self.on_login_failure(None, &err, &parts, subject),
        };

        match self.login(&parts, subject, &token) {
            Ok(()) => Self::on_login_success(&token),
            Err(err) => self.on_login_failure(Some(&token), &err, &parts, subject),
        }
    }

    fn create_token(
        &self,
        parts: &Parts,
        params: &Params,
    ) -> Result<AuthenticationToken, AuthenticationError> {
        let (Some(username), Some(password)) = (
            params.clean(&self.config.username_param),
            params.clean(&self.config.password_param),
        ) else {
            return Err(AuthenticationError::Authentication(
                "Username and password are required".to_string(),
            ));
        };

        let token = AuthenticationToken::new(username, SecretString::from(password))
            .with_host(remote_addr(parts))
            .with_remember_me(is_true(params.get(&self.config.remember_me_param)));

        if self.is_captcha_enabled() {
            return Ok(token.with_captcha(params.clean(&self.config.captcha_param)));
        }
        Ok(token)
    }

    fn login(
        &self,
        parts: &Parts,
        subject: &dyn Subject,
        token: &AuthenticationToken,
    ) -> Result<(), AuthenticationError> {
        if token.is_captcha_token() {
            let session = subject.session();
            if let (true, Some(resolver)) = (
                self.is_over_retry_times(session.as_ref()),
                self.captcha_resolver.as_ref(),
            ) {
                if !resolver.valid_captcha(parts, session.as_ref(), token)? {
                    return Err(AuthenticationError::IncorrectCaptcha(
                        MSG_CAPTCHA_FAILED.to_string(),
                    ));
                }
            }
        }
        subject.login(token)
    }

    fn on_login_success(token: &AuthenticationToken) -> Response {
        info!("Login succeeded for {}", token.username());
        JsonPayload::new(StatusCode::OK, AuthcResponseCode::AuthcSuccess, MSG_SUCCESS)
            .into_response()
    }

    fn on_login_failure(
        &self,
        token: Option<&AuthenticationToken>,
        err: &AuthenticationError,
        parts: &Parts,
        subject: &dyn Subject,
    ) -> Response {
        debug!("Authentication exception: {err}");

        for handler in self
            .failure_handlers
            .iter()
            .filter(|handler| handler.supports(err))
        {
            handler.on_authentication_failure(token, parts, err);
        }

        let session = subject.session();
        let retries = self.increment_failure_count(session.as_ref());

        let payload = if self.is_over_retry_times(session.as_ref()) {
            debug!("Login retries exceeded ({retries}), captcha required");
            JsonPayload::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                AuthcResponseCode::AuthcExcessiveAttempts,
                MSG_OVER_RETRY,
            )
            .with_captcha()
        } else {
            JsonPayload::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.response_code(),
                MSG_FAILURE,
            )
        };

        let mut response = payload.into_response();
        response
            .extensions_mut()
            .insert(LoginFailure(err.clone()));
        response
    }

    /// Failed logins recorded in the session. An unreadable counter counts as
    /// exhausted so that tampering cannot reset it.
    fn failure_count(&self, session: &dyn Session) -> u64 {
        let key = &self.config.retry_times_key_attribute;
        let Some(value) = session.attribute(key) else {
            return 0;
        };
        parse_counter(&value).unwrap_or_else(|| {
            debug!("Unreadable login retry counter {key}={value}, treating as exhausted");
            u64::MAX
        })
    }

    fn increment_failure_count(&self, session: &dyn Session) -> u64 {
        let retries = self.failure_count(session).saturating_add(1);
        session.set_attribute(&self.config.retry_times_key_attribute, json!(retries));
        retries
    }

    fn is_over_retry_times(&self, session: &dyn Session) -> bool {
        self.failure_count(session) > self.config.retry_times_when_access_denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authc::{SessionCaptchaResolver, counter_attribute};
    use crate::host::{MemorySessionRegistry, SESSION_COOKIE_NAME, StaticRealm, SubjectLayer};
    use crate::web::request::X_REQUESTED_WITH;
    use anyhow::{Context as _, Result};
    use axum::{
        Router,
        http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        routing::get,
    };
    use serde_json::Value;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        registry: Arc<MemorySessionRegistry>,
    }

    impl Harness {
        fn new(filter: RestAuthenticationFilter) -> Self {
            let registry = Arc::new(MemorySessionRegistry::new());
            let realm = StaticRealm::new()
                .with_account("alice".to_string(), SecretString::from("wonderland"));
            let app = Router::new()
                .route("/login", get(|| async { "login page" }).post(|| async { "welcome back" }))
                .route("/private", get(|| async { "secret" }))
                .layer(filter)
                .layer(SubjectLayer::new(Arc::new(realm), registry.clone()));
            Self { app, registry }
        }

        async fn send(&self, req: Request<Body>) -> Result<(Response, Option<String>)> {
            let response = self.app.clone().oneshot(req).await?;
            let cookie = response
                .headers()
                .get(SET_COOKIE)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(';').next())
                .map(ToString::to_string);
            Ok((response, cookie))
        }

        async fn login(&self, body: &str, cookie: Option<&str>) -> Result<(Response, Option<String>)> {
            let mut builder = Request::builder()
                .method("POST")
                .uri("/login")
                .header(X_REQUESTED_WITH, "XMLHttpRequest")
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            self.send(builder.body(Body::from(body.to_string()))?).await
        }
    }

    async fn json_body(response: Response) -> Result<Value> {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn text_body(response: Response) -> Result<String> {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(body.to_vec())?)
    }

    fn session_id(cookie: &str) -> Option<&str> {
        cookie.strip_prefix(&format!("{SESSION_COOKIE_NAME}="))
    }

    #[tokio::test]
    async fn anonymous_access_is_unauthorized() -> Result<()> {
        let harness = Harness::new(RestAuthenticationFilter::new(AuthcConfig::new()));
        let (response, _) = harness
            .send(Request::builder().uri("/private").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await?;
        assert_eq!(body["status"], 401);
        assert!(body["message"]
            .as_str()
            .is_some_and(|message| message.contains("[/login]")));
        Ok(())
    }

    #[tokio::test]
    async fn post_without_ajax_marker_is_not_a_submission() -> Result<()> {
        let harness = Harness::new(RestAuthenticationFilter::new(AuthcConfig::new()));
        let (response, cookie) = harness
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=alice&password=wonderland"))?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(cookie.is_none());
        let body = json_body(response).await?;
        assert_eq!(body["message"], "Authentication url [/login] Not Http Post request.");
        assert_eq!(body["code"], "10002");
        assert!(harness.registry.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn ajax_get_is_not_a_submission() -> Result<()> {
        let harness = Harness::new(RestAuthenticationFilter::new(AuthcConfig::new()));
        let (response, _) = harness
            .send(
                Request::builder()
                    .uri("/login")
                    .header(X_REQUESTED_WITH, "XMLHttpRequest")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn successful_login_opens_session() -> Result<()> {
        let harness = Harness::new(RestAuthenticationFilter::new(AuthcConfig::new()));
        let (response, cookie) = harness
            .login("username=alice&password=wonderland&rememberMe=on", None)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await?;
        assert_eq!(body["status"], 200);
        assert_eq!(body["code"], "200");
        assert_eq!(body["message"], MSG_SUCCESS);

        let cookie = cookie.context("missing session cookie")?;
        let (response, _) = harness
            .send(
                Request::builder()
                    .uri("/private")
                    .header(COOKIE, cookie.as_str())
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text_body(response).await?, "secret");

        // Authenticated subjects reach the login route itself.
        let (response, _) = harness.login("", Some(cookie.as_str())).await?;
        assert_eq!(text_body(response).await?, "welcome back");
        Ok(())
    }

    #[tokio::test]
    async fn captcha_flag_appears_only_past_threshold() -> Result<()> {
        let config = AuthcConfig::new().with_retry_times_when_access_denied(3);
        let harness = Harness::new(RestAuthenticationFilter::new(config));

        let (response, cookie) = harness
            .login("username=alice&password=nope", None)
            .await?;
        let cookie = cookie.context("missing session cookie")?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<LoginFailure>(),
            Some(&LoginFailure(AuthenticationError::IncorrectCredentials))
        );
        let body = json_body(response).await?;
        assert_eq!(body["message"], MSG_FAILURE);
        assert_eq!(body["code"], "10010");
        assert!(body.get("captcha").is_none());

        for _ in 0..2 {
            let (response, _) = harness
                .login("username=alice&password=nope", Some(cookie.as_str()))
                .await?;
            let body = json_body(response).await?;
            assert!(body.get("captcha").is_none());
        }

        let (response, _) = harness
            .login("username=alice&password=nope", Some(cookie.as_str()))
            .await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await?;
        assert_eq!(body["status"], 500);
        assert_eq!(body["message"], MSG_OVER_RETRY);
        assert_eq!(body["captcha"], "1");

        let id = session_id(&cookie).context("malformed cookie")?;
        let session = harness.registry.get(id).context("session not registered")?;
        assert_eq!(
            counter_attribute(session.as_ref(), DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME),
            Some(4)
        );
        Ok(())
    }

    fn filter_state(retry_times: u64) -> FilterState {
        RestAuthenticationFilter::new(
            AuthcConfig::new().with_retry_times_when_access_denied(retry_times),
        )
        .state
    }

    #[test]
    fn numeric_string_counter_is_honoured() {
        let state = filter_state(3);
        let session = MemorySessionRegistry::new().create();
        session.set_attribute(DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME, json!("4"));

        assert!(state.is_over_retry_times(session.as_ref()));
        assert_eq!(state.increment_failure_count(session.as_ref()), 5);
        assert_eq!(
            session.attribute(DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME),
            Some(json!(5))
        );
    }

    #[test]
    fn missing_counter_starts_at_zero() {
        let state = filter_state(3);
        let session = MemorySessionRegistry::new().create();

        assert!(!state.is_over_retry_times(session.as_ref()));
        assert_eq!(state.increment_failure_count(session.as_ref()), 1);
    }

    #[test]
    fn unreadable_counter_counts_as_exhausted() {
        let state = filter_state(3);
        let session = MemorySessionRegistry::new().create();
        session.set_attribute(DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME, json!("lots"));

        assert!(state.is_over_retry_times(session.as_ref()));
        assert_eq!(state.increment_failure_count(session.as_ref()), u64::MAX);
        assert!(state.is_over_retry_times(session.as_ref()));
    }

    #[tokio::test]
    async fn captcha_is_checked_once_over_threshold() -> Result<()> {
        let resolver = Arc::new(SessionCaptchaResolver::new());
        let filter = RestAuthenticationFilter::new(
            AuthcConfig::new()
                .with_captcha_enabled(true)
                .with_retry_times_when_access_denied(0),
        )
        .with_captcha_resolver(resolver.clone());
        assert!(filter.is_captcha_enabled());
        let harness = Harness::new(filter);

        let (_, cookie) = harness
            .login("username=alice&password=nope", None)
            .await?;
        let cookie = cookie.context("missing session cookie")?;

        // Correct password alone is no longer enough.
        let (response, _) = harness
            .login("username=alice&password=wonderland", Some(cookie.as_str()))
            .await?;
        assert_eq!(
            response.extensions().get::<LoginFailure>(),
            Some(&LoginFailure(AuthenticationError::CaptchaRequired))
        );
        assert_eq!(json_body(response).await?["captcha"], "1");

        let id = session_id(&cookie).context("malformed cookie")?;
        let session = harness.registry.get(id).context("session not registered")?;

        resolver.issue(session.as_ref(), "q7zk");
        let (response, _) = harness
            .login("username=alice&password=wonderland&captcha=wrong", Some(cookie.as_str()))
            .await?;
        assert_eq!(
            response.extensions().get::<LoginFailure>(),
            Some(&LoginFailure(AuthenticationError::IncorrectCaptcha(
                MSG_CAPTCHA_FAILED.to_string()
            )))
        );

        resolver.issue(session.as_ref(), "q7zk");
        let (response, _) = harness
            .login("username=alice&password=wonderland&captcha=Q7ZK", Some(cookie.as_str()))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn captcha_flag_without_resolver_is_ignored() -> Result<()> {
        let filter = RestAuthenticationFilter::new(
            AuthcConfig::new()
                .with_captcha_enabled(true)
                .with_retry_times_when_access_denied(0),
        );
        assert!(!filter.is_captcha_enabled());
        let harness = Harness::new(filter);

        let (_, cookie) = harness
            .login("username=alice&password=nope", None)
            .await?;
        let cookie = cookie.context("missing session cookie")?;
        let (response, _) = harness
            .login("username=alice&password=wonderland", Some(cookie.as_str()))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn missing_credentials_fail_the_login() -> Result<()> {
        let harness = Harness::new(RestAuthenticationFilter::new(AuthcConfig::new()));
        let (response, _) = harness.login("username=alice", None).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            response.extensions().get::<LoginFailure>(),
            Some(LoginFailure(AuthenticationError::Authentication(_)))
        ));
        Ok(())
    }

    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<(Option<String>, String)>>,
    }

    impl AuthenticationFailureHandler for RecordingHandler {
        fn supports(&self, error: &AuthenticationError) -> bool {
            error.is_credentials()
        }

        fn on_authentication_failure(
            &self,
            token: Option<&AuthenticationToken>,
            _request: &Parts,
            error: &AuthenticationError,
        ) {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((
                    token.map(|token| token.username().to_string()),
                    error.kind().to_string(),
                ));
            }
        }
    }

    #[tokio::test]
    async fn failure_handlers_see_supported_errors() -> Result<()> {
        let handler = Arc::new(RecordingHandler::default());
        let harness = Harness::new(
            RestAuthenticationFilter::new(AuthcConfig::new()).with_failure_handler(handler.clone()),
        );

        harness.login("username=alice&password=nope", None).await?;
        harness.login("username=mallory&password=nope", None).await?;

        let seen = handler
            .seen
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?
            .clone();
        assert_eq!(
            seen,
            vec![(Some("alice".to_string()), "IncorrectCredentials".to_string())]
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_subject_is_a_server_error() -> Result<()> {
        let app = Router::new()
            .route("/private", get(|| async { "secret" }))
            .layer(RestAuthenticationFilter::new(AuthcConfig::new()));
        let response = app
            .oneshot(Request::builder().uri("/private").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }
}
