//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to an action, such as starting the server with
//! its filter configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{authc, cors};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if arguments are missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let cors_opts = cors::Options::parse(matches);
    let authc_opts = authc::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        login_url: authc_opts.login_url,
        logout_url: authc_opts.logout_url,
        cors_allow_origin: cors_opts.allow_origin,
        cors_allow_methods: cors_opts.allow_methods,
        cors_allow_headers: cors_opts.allow_headers,
        cors_allow_credentials: cors_opts.allow_credentials,
        captcha_enabled: authc_opts.captcha_enabled,
        captcha_param: authc_opts.captcha_param,
        retry_times: authc_opts.retry_times,
        retry_times_key: authc_opts.retry_times_key,
        users: authc_opts.users,
    }))
}
