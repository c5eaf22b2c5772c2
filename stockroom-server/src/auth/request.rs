use std::collections::HashSet;

use {
    serde_json::{Map, Value},
    strum::{Display, IntoStaticStr},
    typed_builder::TypedBuilder,
};

/// Attribute carrying the provider key the request was issued for.
pub const REGISTRATION_ID_ATTRIBUTE: &str = "registration_id";

/// Only the authorization code grant is issued by this service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ResponseType {
    #[default]
    #[strum(serialize = "code")]
    Code,
}

/// One pending authorization code request, from login initiation until the
/// provider calls back.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct AuthorizationRequest {
    #[builder(setter(into))]
    authorization_uri: String,
    #[builder(setter(into))]
    client_id: String,
    #[builder(setter(into))]
    redirect_uri: String,
    #[builder(default)]
    scopes: HashSet<String>,
    #[builder(setter(into))]
    state: String,
    #[builder(default)]
    response_type: ResponseType,
    #[builder(default)]
    additional_parameters: Map<String, Value>,
    #[builder(default)]
    attributes: Map<String, Value>,
    /// The complete URL the browser is redirected to.
    #[builder(default)]
    authorization_request_uri: Option<String>,
}

impl AuthorizationRequest {
    pub fn authorization_uri(&self) -> &str {
        &self.authorization_uri
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn scopes(&self) -> &HashSet<String> {
        &self.scopes
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    pub fn additional_parameters(&self) -> &Map<String, Value> {
        &self.additional_parameters
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn authorization_request_uri(&self) -> Option<&str> {
        self.authorization_request_uri.as_deref()
    }

    pub fn registration_id(&self) -> Option<&str> {
        self.attributes
            .get(REGISTRATION_ID_ATTRIBUTE)
            .and_then(Value::as_str)
    }

    /// Where the browser should be sent to start the flow.
    pub fn redirect_target(&self) -> &str {
        self.authorization_request_uri()
            .unwrap_or(self.authorization_uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_defaults_to_code_flow_and_empty_maps() {
        let request = AuthorizationRequest::builder()
            .authorization_uri("https://accounts.example.com/o/oauth2/v2/auth")
            .client_id("client")
            .redirect_uri("https://api.example.com/login/oauth2/code/google")
            .state("abc123")
            .build();

        assert_eq!(request.response_type(), ResponseType::Code);
        assert_eq!(request.response_type().to_string(), "code");
        assert!(request.scopes().is_empty());
        assert!(request.additional_parameters().is_empty());
        assert_eq!(request.registration_id(), None);
        assert_eq!(
            request.redirect_target(),
            "https://accounts.example.com/o/oauth2/v2/auth"
        );
    }

    #[test]
    fn registration_id_is_read_from_attributes() {
        let mut attributes = Map::new();
        attributes.insert(REGISTRATION_ID_ATTRIBUTE.to_string(), json!("google"));

        let request = AuthorizationRequest::builder()
            .authorization_uri("https://accounts.example.com/auth")
            .client_id("client")
            .redirect_uri("https://api.example.com/cb")
            .state("s")
            .attributes(attributes)
            .authorization_request_uri(Some("https://accounts.example.com/auth?state=s".into()))
            .build();

        assert_eq!(request.registration_id(), Some("google"));
        assert_eq!(
            request.redirect_target(),
            "https://accounts.example.com/auth?state=s"
        );
    }
}
