//! JSON projection of [`AuthorizationRequest`] and its Base64url cookie form.
//!
//! Field names are fixed for wire compatibility with cookies issued by other
//! instances of the service.

use std::collections::HashSet;

use {
    base64::{
        alphabet,
        engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
        Engine as _,
    },
    serde::Serialize,
    serde_json::{Map, Value},
    tracing::error,
};

use super::{AuthorizationRequest, ResponseType};

const EMPTY_JSON_OBJECT: &str = "{}";

/// Padded on write, padding optional on read.
const COOKIE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("cookie value is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("cookie payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("authorization request is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("authorization request must be a JSON object")]
    NotAnObject,
    #[error("field `{0}` is missing or blank")]
    MissingField(&'static str),
    #[error("field `{0}` has an unexpected type")]
    InvalidField(&'static str),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    authorization_uri: &'a str,
    client_id: &'a str,
    redirect_uri: &'a str,
    scopes: Vec<&'a str>,
    state: &'a str,
    response_type: &'a str,
    additional_parameters: &'a Map<String, Value>,
    attributes: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_request_uri: Option<&'a str>,
}

impl<'a> From<&'a AuthorizationRequest> for WireRequest<'a> {
    fn from(request: &'a AuthorizationRequest) -> Self {
        let mut scopes: Vec<&str> = request.scopes().iter().map(String::as_str).collect();
        scopes.sort_unstable();

        WireRequest {
            authorization_uri: request.authorization_uri(),
            client_id: request.client_id(),
            redirect_uri: request.redirect_uri(),
            scopes,
            state: request.state(),
            response_type: request.response_type().into(),
            additional_parameters: request.additional_parameters(),
            attributes: request.attributes(),
            authorization_request_uri: request.authorization_request_uri(),
        }
    }
}

/// Serializes to the wire JSON shape. A serialization failure yields `{}`,
/// which later fails to decode and so reads back as "no request".
pub fn encode(request: &AuthorizationRequest) -> String {
    serde_json::to_string(&WireRequest::from(request)).unwrap_or_else(|e| {
        error!("Failed to serialize authorization request: {}", e);
        EMPTY_JSON_OBJECT.to_string()
    })
}

/// Rebuilds a request from wire JSON. The stored `responseType` is ignored:
/// every request is rebuilt as an authorization code request.
pub fn decode(json: &str) -> Result<AuthorizationRequest, CodecError> {
    let Value::Object(fields) = serde_json::from_str::<Value>(json)? else {
        return Err(CodecError::NotAnObject);
    };

    let authorization_uri = required_text(&fields, "authorizationUri")?;
    let client_id = required_text(&fields, "clientId")?;
    let redirect_uri = required_string(&fields, "redirectUri")?;
    let state = required_text(&fields, "state")?;

    let authorization_request_uri = match fields.get("authorizationRequestUri") {
        Some(Value::String(uri)) if !uri.trim().is_empty() => Some(uri.clone()),
        _ => None,
    };

    Ok(AuthorizationRequest::builder()
        .authorization_uri(authorization_uri)
        .client_id(client_id)
        .redirect_uri(redirect_uri)
        .scopes(scopes(&fields))
        .state(state)
        .response_type(ResponseType::Code)
        .additional_parameters(object(&fields, "additionalParameters")?)
        .attributes(object(&fields, "attributes")?)
        .authorization_request_uri(authorization_request_uri)
        .build())
}

pub fn encode_cookie_value(request: &AuthorizationRequest) -> String {
    COOKIE_ENGINE.encode(encode(request))
}

pub fn decode_cookie_value(value: &str) -> Result<AuthorizationRequest, CodecError> {
    let bytes = COOKIE_ENGINE.decode(value.trim())?;
    decode(&String::from_utf8(bytes)?)
}

fn required_string(fields: &Map<String, Value>, name: &'static str) -> Result<String, CodecError> {
    match fields.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Err(CodecError::MissingField(name)),
        Some(_) => Err(CodecError::InvalidField(name)),
    }
}

fn required_text(fields: &Map<String, Value>, name: &'static str) -> Result<String, CodecError> {
    let value = required_string(fields, name)?;
    if value.trim().is_empty() {
        return Err(CodecError::MissingField(name));
    }
    Ok(value)
}

// Any array of scalars is accepted; anything else reads as no scopes.
fn scopes(fields: &Map<String, Value>) -> HashSet<String> {
    match fields.get("scopes") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        _ => HashSet::new(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn object(
    fields: &Map<String, Value>,
    name: &'static str,
) -> Result<Map<String, Value>, CodecError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(CodecError::InvalidField(name)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample(scopes: &[&str]) -> AuthorizationRequest {
        let mut additional_parameters = Map::new();
        additional_parameters.insert("nonce".into(), json!("n-0S6_WzA2Mj"));
        additional_parameters.insert("max_age".into(), json!(300));
        let mut attributes = Map::new();
        attributes.insert("registration_id".into(), json!("google"));

        AuthorizationRequest::builder()
            .authorization_uri("https://accounts.google.com/o/oauth2/v2/auth")
            .client_id("inventory-client")
            .redirect_uri("https://api.example.com/login/oauth2/code/google")
            .scopes(scopes.iter().map(|s| s.to_string()).collect())
            .state("abc123")
            .additional_parameters(additional_parameters)
            .attributes(attributes)
            .authorization_request_uri(Some(
                "https://accounts.google.com/o/oauth2/v2/auth?state=abc123".into(),
            ))
            .build()
    }

    #[test]
    fn encodes_fixed_field_names() {
        let encoded: Value = serde_json::from_str(&encode(&sample(&["openid", "email"]))).unwrap();

        assert_eq!(
            encoded["authorizationUri"],
            "https://accounts.google.com/o/oauth2/v2/auth"
        );
        assert_eq!(encoded["clientId"], "inventory-client");
        assert_eq!(
            encoded["redirectUri"],
            "https://api.example.com/login/oauth2/code/google"
        );
        assert_eq!(encoded["scopes"], json!(["email", "openid"]));
        assert_eq!(encoded["state"], "abc123");
        assert_eq!(encoded["responseType"], "code");
        assert_eq!(encoded["additionalParameters"]["max_age"], 300);
        assert_eq!(encoded["attributes"]["registration_id"], "google");
        assert_eq!(
            encoded["authorizationRequestUri"],
            "https://accounts.google.com/o/oauth2/v2/auth?state=abc123"
        );
    }

    #[test]
    fn omits_absent_authorization_request_uri() {
        let request = AuthorizationRequest::builder()
            .authorization_uri("https://a.example/auth")
            .client_id("c")
            .redirect_uri("https://b.example/cb")
            .state("s")
            .build();

        let encoded: Value = serde_json::from_str(&encode(&request)).unwrap();
        assert!(encoded.get("authorizationRequestUri").is_none());
        assert_eq!(encoded["scopes"], json!([]));
    }

    #[test]
    fn round_trip_preserves_request() {
        for scopes in [&[][..], &["openid"][..], &["openid", "email", "profile"][..]] {
            let request = sample(scopes);
            let decoded = decode(&encode(&request)).unwrap();
            assert_eq!(decoded, request);
        }
    }

    #[test]
    fn cookie_value_round_trip_is_url_safe() {
        let request = sample(&["openid", "email"]);
        let value = encode_cookie_value(&request);

        assert!(value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '=')));
        assert_eq!(decode_cookie_value(&value).unwrap(), request);
    }

    #[test]
    fn decodes_unpadded_cookie_value() {
        let request = sample(&["openid"]);
        let unpadded = encode_cookie_value(&request).trim_end_matches('=').to_string();

        assert_eq!(decode_cookie_value(&unpadded).unwrap(), request);
    }

    #[test]
    fn always_rebuilds_as_code_flow() {
        let json = r#"{
            "authorizationUri": "https://a.example/auth",
            "clientId": "c",
            "redirectUri": "https://b.example/cb",
            "state": "s",
            "responseType": "token"
        }"#;

        assert_eq!(decode(json).unwrap().response_type(), ResponseType::Code);
    }

    #[test]
    fn stringifies_scalar_scopes_and_skips_the_rest() {
        let json = r#"{
            "authorizationUri": "https://a.example/auth",
            "clientId": "c",
            "redirectUri": "https://b.example/cb",
            "state": "s",
            "scopes": ["openid", 42, true, null, {"nested": 1}, "openid"]
        }"#;

        let scopes = decode(json).unwrap().scopes().clone();
        let expected: HashSet<String> = ["openid", "42", "true"].iter().map(|s| s.to_string()).collect();
        assert_eq!(scopes, expected);
    }

    #[test]
    fn non_array_scopes_read_as_empty() {
        let json = r#"{
            "authorizationUri": "https://a.example/auth",
            "clientId": "c",
            "redirectUri": "https://b.example/cb",
            "state": "s",
            "scopes": "openid email"
        }"#;

        assert!(decode(json).unwrap().scopes().is_empty());
    }

    #[test]
    fn missing_maps_default_to_empty() {
        let json = r#"{
            "authorizationUri": "https://a.example/auth",
            "clientId": "c",
            "redirectUri": "https://b.example/cb",
            "state": "s",
            "additionalParameters": null
        }"#;

        let decoded = decode(json).unwrap();
        assert!(decoded.additional_parameters().is_empty());
        assert!(decoded.attributes().is_empty());
        assert_eq!(decoded.authorization_request_uri(), None);
    }

    #[test]
    fn rejects_structurally_invalid_payloads() {
        assert!(matches!(decode("{}"), Err(CodecError::MissingField("authorizationUri"))));
        assert!(matches!(decode("[]"), Err(CodecError::NotAnObject)));
        assert!(matches!(decode("not json"), Err(CodecError::Json(_))));
        assert!(matches!(
            decode(r#"{"authorizationUri": 7, "clientId": "c", "redirectUri": "r", "state": "s"}"#),
            Err(CodecError::InvalidField("authorizationUri"))
        ));
        assert!(matches!(
            decode(r#"{"authorizationUri": "a", "clientId": "c", "redirectUri": "r", "state": "  "}"#),
            Err(CodecError::MissingField("state"))
        ));
        assert!(matches!(
            decode(r#"{"authorizationUri": "a", "clientId": "c", "redirectUri": "r", "state": "s", "attributes": []}"#),
            Err(CodecError::InvalidField("attributes"))
        ));
    }

    #[test]
    fn corrupted_cookie_values_are_errors_not_panics() {
        let invalid_utf8 = COOKIE_ENGINE.encode([0xff, 0xfe, 0xfd]);
        for value in [
            "not-base64!!",
            "",
            "%%%",
            "e30",
            "bm90IGpzb24",
            invalid_utf8.as_str(),
        ] {
            assert!(decode_cookie_value(value).is_err(), "accepted {:?}", value);
        }
    }
}
