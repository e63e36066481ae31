use crate::{
    host::StaticRealm,
    portier::{self, Settings},
    web::{AuthcConfig, CorsConfig, LogoutConfig},
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub login_url: String,
    pub logout_url: String,
    pub cors_allow_origin: String,
    pub cors_allow_methods: String,
    pub cors_allow_headers: String,
    pub cors_allow_credentials: bool,
    pub captcha_enabled: bool,
    pub captcha_param: String,
    pub retry_times: u64,
    pub retry_times_key: String,
    pub users: Vec<(String, SecretString)>,
}

impl Args {
    /// Filter and realm settings derived from the arguments.
    #[must_use]
    pub fn settings(self) -> Settings {
        let cors = CorsConfig::new()
            .with_allow_origin(self.cors_allow_origin)
            .with_allow_methods(self.cors_allow_methods)
            .with_allow_headers(self.cors_allow_headers)
            .with_allow_credentials(self.cors_allow_credentials);

        let authc = AuthcConfig::new()
            .with_login_url(self.login_url)
            .with_captcha_enabled(self.captcha_enabled)
            .with_captcha_param(self.captcha_param)
            .with_retry_times_when_access_denied(self.retry_times)
            .with_retry_times_key_attribute(self.retry_times_key);

        let logout = LogoutConfig::new().with_logout_url(self.logout_url);

        let realm = self
            .users
            .into_iter()
            .fold(StaticRealm::new(), |realm, (username, password)| {
                realm.with_account(username, password)
            });

        Settings {
            cors,
            authc,
            logout,
            realm,
        }
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to bind or serve.
pub async fn execute(args: Args) -> Result<()> {
    let port = args.port;
    debug!("Server args: {:?}", args);

    let settings = args.settings();
    if settings.realm.is_empty() {
        warn!("No users configured, every login attempt will fail");
    }

    portier::new(port, settings).await
}
