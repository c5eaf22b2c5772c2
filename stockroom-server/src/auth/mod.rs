//! Stateless persistence of in-flight OAuth2 authorization requests.
//!
//! The request issued at login initiation is carried by the browser in a
//! short-lived cookie, so whichever instance receives the provider callback
//! can validate and consume it without shared session storage.

pub mod codec;
mod cookie;
mod request;
mod store;

pub use {
    cookie::{
        is_secure_or_forwarded_https, query_param, request_cookie_values, SecureTransport,
        SetCookie,
    },
    request::{AuthorizationRequest, ResponseType, REGISTRATION_ID_ATTRIBUTE},
    store::{AuthorizationRequestRepository, CookieAuthorizationRequestStore, RETURN_PARAM},
};
