//! Tower layers turning the authentication seams into a JSON-speaking REST API.

pub mod authc;
pub mod cors;
pub mod json;
pub mod logout;
pub mod request;

pub use authc::{AuthcConfig, LoginFailure, RestAuthenticationFilter, RestAuthenticationService};
pub use cors::{CorsConfig, CorsFilter, CorsFilterService};
pub use json::{APPLICATION_JSON_UTF8, JsonPayload};
pub use logout::{LogoutConfig, LogoutFilter, LogoutListener, LogoutService};
