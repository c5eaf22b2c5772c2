use axum::http::{
    header::{COOKIE, SET_COOKIE},
    request::Parts,
    uri::Scheme,
    HeaderMap, HeaderValue,
};
use tracing::error;

use crate::util::SameSiteConfig;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Request extension marking a connection accepted over TLS by this process.
#[derive(Debug, Clone, Copy)]
pub struct SecureTransport;

/// A `Set-Cookie` header assembled by hand, so that `SameSite=None` and the
/// attribute order are exactly what is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    path: String,
    max_age: Option<u64>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSiteConfig>,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSiteConfig) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// `name=value; Path=..; Max-Age=..; Secure; HttpOnly; SameSite=..`, with
    /// unset attributes left out.
    pub fn header_value(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str(&format!("; SameSite={}", same_site));
        }
        out
    }

    /// Appends to `headers`, keeping any `Set-Cookie` already present.
    pub fn append_to(&self, headers: &mut HeaderMap) {
        match HeaderValue::from_str(&self.header_value()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => error!("Dropping unrepresentable {} cookie: {}", self.name, e),
        }
    }
}

/// Every value sent for `name`, across all `Cookie` headers, in order.
pub fn request_cookie_values<'a>(headers: &'a HeaderMap, name: &str) -> Vec<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim())
        })
        .collect()
}

pub fn is_secure_or_forwarded_https(request: &Parts) -> bool {
    if request.uri.scheme() == Some(&Scheme::HTTPS)
        || request.extensions.get::<SecureTransport>().is_some()
    {
        return true;
    }

    request
        .headers
        .get(FORWARDED_PROTO)
        .and_then(|proto| proto.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

pub fn query_param(request: &Parts, key: &str) -> Option<String> {
    let query = request.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find_map(|(k, v)| (k == key).then(|| v.into_owned()))
}
