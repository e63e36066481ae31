use anyhow::{Context, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, builder::BoolishValueParser};
use secrecy::SecretString;

use crate::portier::RESERVED_PATHS;
use crate::web::{
    authc::{
        DEFAULT_CAPTCHA_PARAM, DEFAULT_LOGIN_URL, DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME,
        DEFAULT_RETRY_TIMES_WHEN_ACCESS_DENIED,
    },
    logout::DEFAULT_LOGOUT_URL,
};

pub const ARG_LOGIN_URL: &str = "login-url";
pub const ARG_LOGOUT_URL: &str = "logout-url";
pub const ARG_CAPTCHA_ENABLED: &str = "captcha-enabled";
pub const ARG_CAPTCHA_PARAM: &str = "captcha-param";
pub const ARG_RETRY_TIMES: &str = "retry-times";
pub const ARG_RETRY_TIMES_KEY: &str = "retry-times-key";
pub const ARG_USERS: &str = "users";

#[derive(Debug)]
pub struct Options {
    pub login_url: String,
    pub logout_url: String,
    pub captcha_enabled: bool,
    pub captcha_param: String,
    pub retry_times: u64,
    pub retry_times_key: String,
    pub users: Vec<(String, SecretString)>,
}

impl Options {
    /// Parse login, logout and realm arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a URL is not absolute, collides with a built-in
    /// route or with the other URL, or a user entry is not `name:password`.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let login_url = path_arg(matches, ARG_LOGIN_URL)?;
        let logout_url = path_arg(matches, ARG_LOGOUT_URL)?;
        if login_url == logout_url {
            bail!("--{ARG_LOGIN_URL} and --{ARG_LOGOUT_URL} must differ, both are: {login_url}");
        }

        let users = matches
            .get_many::<String>(ARG_USERS)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|entry| !entry.trim().is_empty())
            .map(parse_user)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            login_url,
            logout_url,
            captcha_enabled: matches.get_flag(ARG_CAPTCHA_ENABLED),
            captcha_param: matches
                .get_one::<String>(ARG_CAPTCHA_PARAM)
                .cloned()
                .unwrap_or_else(|| DEFAULT_CAPTCHA_PARAM.to_string()),
            retry_times: matches
                .get_one::<u64>(ARG_RETRY_TIMES)
                .copied()
                .unwrap_or(DEFAULT_RETRY_TIMES_WHEN_ACCESS_DENIED),
            retry_times_key: matches
                .get_one::<String>(ARG_RETRY_TIMES_KEY)
                .cloned()
                .unwrap_or_else(|| DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME.to_string()),
            users,
        })
    }
}

fn path_arg(matches: &ArgMatches, id: &str) -> anyhow::Result<String> {
    let value = matches
        .get_one::<String>(id)
        .map(|value| value.trim().to_string())
        .with_context(|| format!("missing required argument: --{id}"))?;
    if !value.starts_with('/') {
        bail!("--{id} must start with '/', got: {value}");
    }
    if RESERVED_PATHS.contains(&value.as_str()) {
        bail!("--{id} cannot be {value}, the path is already routed");
    }
    Ok(value)
}

fn parse_user(entry: &str) -> anyhow::Result<(String, SecretString)> {
    let Some((username, password)) = entry.split_once(':') else {
        bail!("invalid user entry, expected name:password");
    };
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        bail!("invalid user entry, expected name:password");
    }
    Ok((username.to_string(), SecretString::from(password)))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_url_args(command);
    let command = with_retry_args(command);
    command.arg(
        Arg::new(ARG_USERS)
            .long(ARG_USERS)
            .help("Comma separated name:password accounts for the built-in realm")
            .env("PORTIER_USERS")
            .hide_env_values(true)
            .value_delimiter(','),
    )
}

fn with_url_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LOGIN_URL)
                .long(ARG_LOGIN_URL)
                .help("Path accepting login submissions")
                .env("PORTIER_LOGIN_URL")
                .default_value(DEFAULT_LOGIN_URL),
        )
        .arg(
            Arg::new(ARG_LOGOUT_URL)
                .long(ARG_LOGOUT_URL)
                .help("Path logging the current subject out")
                .env("PORTIER_LOGOUT_URL")
                .default_value(DEFAULT_LOGOUT_URL),
        )
}

fn with_retry_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CAPTCHA_ENABLED)
                .long(ARG_CAPTCHA_ENABLED)
                .help("Require a captcha once the retry threshold is exceeded")
                .env("PORTIER_CAPTCHA_ENABLED")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_CAPTCHA_PARAM)
                .long(ARG_CAPTCHA_PARAM)
                .help("Request parameter carrying the captcha answer")
                .env("PORTIER_CAPTCHA_PARAM")
                .default_value(DEFAULT_CAPTCHA_PARAM),
        )
        .arg(
            Arg::new(ARG_RETRY_TIMES)
                .long(ARG_RETRY_TIMES)
                .help("Failed logins allowed before a captcha is required")
                .env("PORTIER_RETRY_TIMES")
                .default_value("3")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_RETRY_TIMES_KEY)
                .long(ARG_RETRY_TIMES_KEY)
                .help("Session attribute holding the failed login counter")
                .env("PORTIER_RETRY_TIMES_KEY")
                .default_value(DEFAULT_RETRY_TIMES_KEY_ATTRIBUTE_NAME),
        )
}
