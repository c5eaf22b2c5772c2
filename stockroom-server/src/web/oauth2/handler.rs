use {axum::http::HeaderMap, tracing::debug, url::form_urlencoded};

use crate::{auth::request_cookie_values, util::Config};

/// Why a callback did not end in a signed-in session. The code is what the
/// frontend receives in `?error=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoginFailure {
    InvalidRequest,
    RequestNotFound,
    RegistrationMismatch,
    Provider(String),
    InvalidState,
    AuthenticationFailed,
    LoginFailed,
}

impl LoginFailure {
    pub fn code(&self) -> &str {
        match self {
            LoginFailure::InvalidRequest => "invalid_request",
            LoginFailure::RequestNotFound => "authorization_request_not_found",
            LoginFailure::RegistrationMismatch => "client_registration_mismatch",
            LoginFailure::Provider(error) => error.as_str(),
            LoginFailure::InvalidState => "invalid_state_parameter",
            LoginFailure::AuthenticationFailed => "authentication_failed",
            LoginFailure::LoginFailed => "login_failed",
        }
    }
}

/// The first allow-listed return origin the browser sent back, else the
/// configured frontend, followed by the landing path.
pub(crate) fn success_target(config: &Config, request_headers: &HeaderMap) -> String {
    let cookies = &config.auth_cookies;
    let origin = request_cookie_values(request_headers, &cookies.return_cookie_name)
        .into_iter()
        .find(|origin| cookies.is_allowed_return_origin(origin))
        .unwrap_or(config.frontend.base_url.as_str());

    let target = join(origin, &config.frontend.landing_path);
    debug!("Login succeeded, redirecting to {}", target);
    target
}

pub(crate) fn failure_target(config: &Config, failure: &LoginFailure) -> String {
    let error: String = form_urlencoded::byte_serialize(failure.code().as_bytes()).collect();
    format!("{}?error={}", config.frontend.failure_path, error)
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
