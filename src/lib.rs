//! # Portier (REST authentication filters for axum)
//!
//! `portier` turns a session-backed login flow into a JSON API. It ships tower
//! layers that sit in front of an axum router:
//!
//! - [`web::CorsFilter`]: writes `Access-Control-Allow-*` on every response and
//!   answers preflight `OPTIONS` requests itself.
//! - [`web::RestAuthenticationFilter`]: accepts ajax login submissions, counts
//!   failed attempts per session and demands a captcha past a threshold.
//! - [`web::LogoutFilter`]: logs the subject out and notifies listeners.
//!
//! ## Host seams
//!
//! Filters do not own sessions or verify passwords. They read an
//! `Arc<dyn authc::Subject>` from the request extensions and delegate to it.
//! [`host`] provides in-memory adapters used by the bundled server and tests.
//!
//! ## Payloads
//!
//! Every filter outcome is `{ "status", "code", "message" [, "captcha"] }` with
//! the HTTP status equal to `status`. Codes come from [`authc::AuthcResponseCode`].

pub mod authc;
pub mod cli;
pub mod host;
pub mod portier;
pub mod web;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
