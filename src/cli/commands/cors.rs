use clap::{Arg, ArgAction, ArgMatches, Command, builder::BoolishValueParser};

use crate::web::cors::{DEFAULT_ACCESS_CONTROL_ALLOW_HEADERS, DEFAULT_ACCESS_CONTROL_ALLOW_METHODS};

pub const ARG_CORS_ALLOW_ORIGIN: &str = "cors-allow-origin";
pub const ARG_CORS_ALLOW_METHODS: &str = "cors-allow-methods";
pub const ARG_CORS_ALLOW_HEADERS: &str = "cors-allow-headers";
pub const ARG_CORS_ALLOW_CREDENTIALS: &str = "cors-allow-credentials";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
    pub allow_credentials: bool,
}

impl Options {
    /// Parse CORS arguments from matches.
    ///
    /// Empty values are kept: the filter then derives the header from the request.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let get = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();

        Self {
            allow_origin: get(ARG_CORS_ALLOW_ORIGIN),
            allow_methods: get(ARG_CORS_ALLOW_METHODS),
            allow_headers: get(ARG_CORS_ALLOW_HEADERS),
            allow_credentials: matches.get_flag(ARG_CORS_ALLOW_CREDENTIALS),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CORS_ALLOW_ORIGIN)
                .long(ARG_CORS_ALLOW_ORIGIN)
                .help("Access-Control-Allow-Origin, empty echoes the request Origin")
                .env("PORTIER_CORS_ALLOW_ORIGIN")
                .default_value("*"),
        )
        .arg(
            Arg::new(ARG_CORS_ALLOW_METHODS)
                .long(ARG_CORS_ALLOW_METHODS)
                .help("Access-Control-Allow-Methods")
                .env("PORTIER_CORS_ALLOW_METHODS")
                .default_value(DEFAULT_ACCESS_CONTROL_ALLOW_METHODS),
        )
        .arg(
            Arg::new(ARG_CORS_ALLOW_HEADERS)
                .long(ARG_CORS_ALLOW_HEADERS)
                .help("Access-Control-Allow-Headers, empty echoes Access-Control-Request-Headers")
                .env("PORTIER_CORS_ALLOW_HEADERS")
                .default_value(DEFAULT_ACCESS_CONTROL_ALLOW_HEADERS),
        )
        .arg(
            Arg::new(ARG_CORS_ALLOW_CREDENTIALS)
                .long(ARG_CORS_ALLOW_CREDENTIALS)
                .help("Send Access-Control-Allow-Credentials: true")
                .env("PORTIER_CORS_ALLOW_CREDENTIALS")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}
