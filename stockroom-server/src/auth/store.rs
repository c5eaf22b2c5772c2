use axum::http::{request::Parts, HeaderMap};
use tracing::{debug, warn};

use super::{
    codec::{decode_cookie_value, encode_cookie_value},
    cookie::{is_secure_or_forwarded_https, query_param, request_cookie_values, SetCookie},
    AuthorizationRequest,
};
use crate::util::AuthCookieConfig;

/// Query parameter naming where the frontend wants to land after login.
pub const RETURN_PARAM: &str = "return";

/// Holds the authorization request between login initiation and callback.
///
/// None of the operations fail: a request that cannot be read back is
/// reported as absent, which the callback turns into the usual
/// `authorization_request_not_found` outcome.
pub trait AuthorizationRequestRepository: Send + Sync {
    fn load(&self, request: &Parts) -> Option<AuthorizationRequest>;

    /// `None` clears any stored request.
    fn save(
        &self,
        authorization_request: Option<&AuthorizationRequest>,
        request: &Parts,
        response: &mut HeaderMap,
    );

    /// Returns the stored request and clears it, so a callback can be
    /// processed only once.
    fn remove(&self, request: &Parts, response: &mut HeaderMap) -> Option<AuthorizationRequest>;
}

#[derive(Debug, Clone)]
pub struct CookieAuthorizationRequestStore {
    settings: AuthCookieConfig,
}

impl CookieAuthorizationRequestStore {
    pub fn new(settings: AuthCookieConfig) -> Self {
        Self { settings }
    }

    fn request_cookie(&self, value: &str, max_age: u64, secure: bool) -> SetCookie {
        SetCookie::new(&self.settings.request_cookie_name, value)
            .max_age(max_age)
            .secure(secure)
            .http_only(true)
            .same_site(self.settings.same_site)
    }

    fn delete_cookie(&self, request: &Parts, response: &mut HeaderMap) {
        self.request_cookie("", 0, is_secure_or_forwarded_https(request))
            .append_to(response);
        debug!("Deleted {} cookie.", self.settings.request_cookie_name);
    }

    fn capture_return_url(&self, request: &Parts, response: &mut HeaderMap) {
        let Some(return_url) = query_param(request, RETURN_PARAM) else {
            return;
        };
        if return_url.trim().is_empty() {
            return;
        }

        if !self.settings.is_allowed_return_origin(&return_url) {
            warn!("Ignored non-whitelisted return origin: {}", return_url);
            return;
        }

        // Not HttpOnly: the frontend reads it after login.
        SetCookie::new(&self.settings.return_cookie_name, &return_url)
            .max_age(self.settings.return_max_age_secs)
            .secure(is_secure_or_forwarded_https(request))
            .http_only(false)
            .same_site(self.settings.same_site)
            .append_to(response);
        debug!("Set {} cookie for {}", self.settings.return_cookie_name, return_url);
    }
}

impl AuthorizationRequestRepository for CookieAuthorizationRequestStore {
    fn load(&self, request: &Parts) -> Option<AuthorizationRequest> {
        let name = &self.settings.request_cookie_name;
        request_cookie_values(&request.headers, name)
            .into_iter()
            .find_map(|value| match decode_cookie_value(value) {
                Ok(authorization_request) => Some(authorization_request),
                Err(e) => {
                    warn!("Ignoring unreadable {} cookie: {}", name, e);
                    None
                }
            })
    }

    fn save(
        &self,
        authorization_request: Option<&AuthorizationRequest>,
        request: &Parts,
        response: &mut HeaderMap,
    ) {
        let Some(authorization_request) = authorization_request else {
            self.delete_cookie(request, response);
            return;
        };

        self.capture_return_url(request, response);

        let secure = is_secure_or_forwarded_https(request);
        let value = encode_cookie_value(authorization_request);
        self.request_cookie(&value, self.settings.request_max_age_secs, secure)
            .append_to(response);
        debug!(
            "Saved {} cookie. secure={}, maxAge={}, sameSite={}",
            self.settings.request_cookie_name,
            secure,
            self.settings.request_max_age_secs,
            self.settings.same_site
        );
    }

    fn remove(&self, request: &Parts, response: &mut HeaderMap) -> Option<AuthorizationRequest> {
        let existing = self.load(request);
        self.delete_cookie(request, response);
        existing
    }
}
