use std::{collections::HashMap, net::IpAddr, path::Path};

use {
    derivative::Derivative,
    serde::{Deserialize, Deserializer, Serialize},
    serde_json::{Map, Value},
    strum::Display,
};

use crate::AppError;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub same_site_policy: SameSiteConfig,
    pub secure: bool,
    pub expiry_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            same_site_policy: SameSiteConfig::None,
            secure: true,
            expiry_days: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggerConfig {
    pub verbosity: Verbosity,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            verbosity: Verbosity::Info,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Verbosity {
    Trace,
    Info,
    Debug,
    Warn,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Website {
    pub bind_ssl_config: SslConfig,
    pub bind_address: IpAddr,
    pub bind_ports: Ports,
    pub public_hostname: String,
    pub public_ports: Ports,
    pub public_ssl_enabled: bool,
}

impl Website {
    /// Scheme, host and (non-default) port browsers use to reach the service.
    pub fn public_origin(&self) -> String {
        let (scheme, port, default_port) = if self.public_ssl_enabled {
            ("https", self.public_ports.https, 443)
        } else {
            ("http", self.public_ports.http, 80)
        };

        if port == default_port {
            format!("{}://{}", scheme, self.public_hostname)
        } else {
            format!("{}://{}:{}", scheme, self.public_hostname, port)
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_origin(), path.trim_start_matches('/'))
    }
}

impl Default for Website {
    fn default() -> Self {
        Website {
            public_hostname: "localhost".into(),
            public_ports: Ports::default(),
            public_ssl_enabled: false,
            bind_address: IpAddr::from([127, 0, 0, 1]),
            bind_ssl_config: SslConfig::default(),
            bind_ports: Ports::default(),
        }
    }
}

/// `SameSite` attribute written on cookies.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
pub enum SameSiteConfig {
    Strict,
    Lax,
    None,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SslConfig {
    pub enabled: bool,
    pub cert_path: String,
    pub key_path: String,
}

impl Default for SslConfig {
    fn default() -> Self {
        SslConfig {
            enabled: false,
            cert_path: "config/cert.pem".to_string(),
            key_path: "config/key.pem".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Ports {
    pub http: u16,
    pub https: u16,
}

impl Default for Ports {
    fn default() -> Self {
        Ports {
            http: 80,
            https: 443,
        }
    }
}

/// Where the browser lands after the OAuth2 callback.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FrontendConfig {
    pub base_url: String,
    pub landing_path: String,
    pub failure_path: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        FrontendConfig {
            base_url: "http://localhost:5173".to_string(),
            landing_path: "/auth".to_string(),
            failure_path: "/login".to_string(),
        }
    }
}

/// Names, lifetimes and the return-origin allow-list of the cookies written
/// while an authorization request is in flight.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AuthCookieConfig {
    pub request_cookie_name: String,
    pub request_max_age_secs: u64,
    pub return_cookie_name: String,
    pub return_max_age_secs: u64,
    pub same_site: SameSiteConfig,
    /// Compared by exact, case-sensitive string equality.
    pub allowed_return_origins: Vec<String>,
}

impl AuthCookieConfig {
    pub fn is_allowed_return_origin(&self, candidate: &str) -> bool {
        self.allowed_return_origins
            .iter()
            .any(|origin| origin == candidate)
    }
}

impl Default for AuthCookieConfig {
    fn default() -> Self {
        AuthCookieConfig {
            request_cookie_name: "OAUTH2_AUTH_REQUEST".to_string(),
            request_max_age_secs: 180,
            return_cookie_name: "SSP_RETURN".to_string(),
            return_max_age_secs: 300,
            same_site: SameSiteConfig::None,
            allowed_return_origins: vec![
                "http://localhost:5173".to_string(),
                "https://localhost:5173".to_string(),
                "https://inventory-service.koyeb.app".to_string(),
            ],
        }
    }
}

/// Account provisioning on login.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UsersConfig {
    /// Emails granted the admin role. Accepts a list or a comma-separated
    /// string. Matching ignores case.
    #[serde(deserialize_with = "email_list")]
    pub admin_emails: Vec<String>,
}

impl UsersConfig {
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails
            .iter()
            .any(|admin| admin.to_lowercase() == email)
    }
}

fn email_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Emails {
        Joined(String),
        List(Vec<String>),
    }

    let raw = match Emails::deserialize(deserializer)? {
        Emails::Joined(joined) => vec![joined],
        Emails::List(list) => list,
    };

    Ok(raw
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Derivative)]
#[derivative(Debug)]
pub struct ClientConfig {
    pub client_id: String,
    #[derivative(Debug = "ignore")]
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub userinfo_uri: String,
    /// Empty means `{public server url}/login/oauth2/code/{provider}`.
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string(), "profile".to_string(), "email".to_string()]
}

#[derive(Default, Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    #[serde(default = "default_run_mode")]
    pub run_mode: String,
    pub logger: LoggerConfig,
    pub website: Website,
    pub session: SessionConfig,
    pub frontend: FrontendConfig,
    pub auth_cookies: AuthCookieConfig,
    pub users: UsersConfig,
    pub database: DatabaseConfig,
    pub oauth_clients: HashMap<String, ClientConfig>,
}

fn default_run_mode() -> String {
    "dev".to_string()
}

impl Config {
    pub fn load(config_dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let run_mode = stockroom_config::run_mode();
        let mut config: Config = stockroom_config::load(config_dir, &run_mode)?;
        config.run_mode = run_mode;
        Ok(config)
    }

    pub fn redirect_uri(&self, provider: &str) -> Result<String, AppError> {
        let client = self
            .oauth_clients
            .get(provider)
            .ok_or_else(|| AppError::ClientConfigNotFound(provider.to_string()))?;

        if client.redirect_uri.trim().is_empty() {
            Ok(self
                .website
                .public_url(&format!("/login/oauth2/code/{}", provider)))
        } else {
            Ok(client.redirect_uri.clone())
        }
    }
}
