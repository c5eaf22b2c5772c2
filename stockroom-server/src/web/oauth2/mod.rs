use {
    axum::{
        http::{header::LOCATION, request::Parts, StatusCode},
        response::{IntoResponse, Response},
    },
    oauth2::CsrfToken,
};

use crate::auth::query_param;

mod logout;
pub(crate) use logout::router as create_logout_router;

mod callback;
pub(crate) use callback::router as create_callback_router;

mod login;
pub(crate) use login::router as create_login_router;

mod handler;

mod backend;
pub(crate) use backend::Backend;

pub(crate) type AuthSession = axum_login::AuthSession<Backend>;

/// Query parameters of a provider callback. Every field is optional so that
/// malformed callbacks still reach the failure redirect.
#[derive(Debug, Clone, Default)]
pub(crate) struct AuthzResp {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl AuthzResp {
    /// Reads the callback parameters; the first value of a repeated key wins.
    pub fn from_request(request: &Parts) -> Self {
        Self {
            code: query_param(request, "code"),
            state: query_param(request, "state"),
            error: query_param(request, "error"),
            error_description: query_param(request, "error_description"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    pub code: String,
    pub old_state: CsrfToken,
    pub new_state: CsrfToken,
    pub provider: String,
}

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}
