use std::collections::HashMap;

use {
    axum::async_trait,
    axum_login::{AuthnBackend, UserId},
    oauth2::{
        basic::BasicClient, reqwest::async_http_client, AuthUrl, AuthorizationCode, ClientId,
        ClientSecret, CsrfToken, RedirectUrl, Scope, TokenResponse, TokenUrl,
    },
    reqwest::header::USER_AGENT,
    serde::Deserialize,
    serde_json::{Map, Value},
    sqlx::SqlitePool,
    tracing::{debug, info, warn},
    url::ParseError,
};

use crate::{
    auth::{AuthorizationRequest, REGISTRATION_ID_ATTRIBUTE},
    model::{Role, User},
    util::{ClientConfig, Config, UsersConfig},
    AppError,
};

use super::Credentials;

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Clone)]
struct Provider {
    client: BasicClient,
    client_id: String,
    auth_uri: String,
    redirect_uri: String,
    userinfo_uri: String,
    scopes: Vec<String>,
}

impl Provider {
    fn from_config(name: &str, client: &ClientConfig, redirect_uri: String) -> Result<Self, AppError> {
        let auth_url = AuthUrl::new(client.auth_uri.clone())
            .map_err(invalid_url(name, "authorization", &client.auth_uri))?;
        let token_url = TokenUrl::new(client.token_uri.clone())
            .map_err(invalid_url(name, "token", &client.token_uri))?;
        let redirect_url = RedirectUrl::new(redirect_uri.clone())
            .map_err(invalid_url(name, "redirect", &redirect_uri))?;

        let oauth_client = BasicClient::new(
            ClientId::new(client.client_id.clone()),
            Some(ClientSecret::new(client.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            client: oauth_client,
            client_id: client.client_id.clone(),
            auth_uri: client.auth_uri.clone(),
            redirect_uri,
            userinfo_uri: client.userinfo_uri.clone(),
            scopes: client.scopes.clone(),
        })
    }
}

fn invalid_url(
    client_name: &str,
    kind: &'static str,
    url: &str,
) -> impl FnOnce(ParseError) -> AppError {
    let client_name = client_name.to_string();
    let url = url.to_string();
    move |inner| AppError::InvalidClientUrl {
        client_name,
        kind,
        url,
        inner,
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Backend {
    db: SqlitePool,
    users: UsersConfig,
    providers: HashMap<String, Provider>,
}

impl Backend {
    pub fn new(db: SqlitePool, config: &Config) -> Result<Self, AppError> {
        let mut providers = HashMap::new();
        for (name, client) in &config.oauth_clients {
            let provider = Provider::from_config(name, client, config.redirect_uri(name)?)?;
            debug!("Registered OAuth2 provider {} ({})", name, provider.redirect_uri);
            providers.insert(name.clone(), provider);
        }

        Ok(Self {
            db,
            users: config.users.clone(),
            providers,
        })
    }

    /// Creates or refreshes the local account for a provider profile. The
    /// email is required; a blank name falls back to it. The role follows
    /// the admin list as it is now.
    async fn provision(
        &self,
        provider: &str,
        user_info: UserInfo,
        access_token: &str,
    ) -> Result<User, AppError> {
        let Some(email) = user_info.email.filter(|e| !e.trim().is_empty()) else {
            return Err(AppError::OAuth2Generic(format!(
                "Email not provided by {}.",
                provider
            )));
        };
        let name = user_info
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());
        let role = if self.users.is_admin(&email) {
            Role::Admin
        } else {
            Role::User
        };

        Ok(User::upsert(&self.db, &email, &name, role, access_token).await?)
    }

    /// Builds a fresh authorization code request for `provider` with a new
    /// random state.
    pub fn authorization_request(&self, provider: &str) -> Result<AuthorizationRequest, AppError> {
        let Some(registration) = self.providers.get(provider) else {
            return Err(AppError::ClientConfigNotFound(provider.to_string()));
        };

        let (url, csrf_token) = registration
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(registration.scopes.iter().cloned().map(Scope::new))
            .url();

        let mut attributes = Map::new();
        attributes.insert(
            REGISTRATION_ID_ATTRIBUTE.to_string(),
            Value::String(provider.to_string()),
        );

        Ok(AuthorizationRequest::builder()
            .authorization_uri(registration.auth_uri.as_str())
            .client_id(registration.client_id.as_str())
            .redirect_uri(registration.redirect_uri.as_str())
            .scopes(registration.scopes.iter().cloned().collect())
            .state(csrf_token.secret().as_str())
            .attributes(attributes)
            .authorization_request_uri(Some(url.to_string()))
            .build())
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = User;
    type Credentials = Credentials;
    type Error = AppError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        // Ensure the CSRF state has not been tampered with.
        if creds.old_state.secret() != creds.new_state.secret() {
            warn!("State mismatch on {} callback", creds.provider);
            return Ok(None);
        };

        let provider = self
            .providers
            .get(&creds.provider)
            .ok_or_else(|| AppError::ClientConfigNotFound(creds.provider.clone()))?;

        let token_res = provider
            .client
            .exchange_code(AuthorizationCode::new(creds.code))
            .request_async(async_http_client)
            .await?;

        let user_info = reqwest::Client::new()
            .get(&provider.userinfo_uri)
            .header(USER_AGENT, "stockroom")
            .bearer_auth(token_res.access_token().secret())
            .send()
            .await?
            .error_for_status()?
            .json::<UserInfo>()
            .await?;

        // Persist user in our database so we can use `get_user`.
        let user = self
            .provision(&creds.provider, user_info, token_res.access_token().secret())
            .await?;
        info!("User {} ({}) signed in via {}", user.email, user.role, creds.provider);

        Ok(Some(user))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok(User::find_by_email(&self.db, user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    fn google_client() -> ClientConfig {
        ClientConfig {
            client_id: "inventory-client".into(),
            client_secret: "secret".into(),
            auth_uri: "https://accounts.example.com/o/oauth2/v2/auth".into(),
            token_uri: "https://oauth2.example.com/token".into(),
            userinfo_uri: "https://openidconnect.example.com/v1/userinfo".into(),
            redirect_uri: String::new(),
            scopes: vec!["openid".into(), "profile".into(), "email".into()],
            extra: Map::new(),
        }
    }

    async fn migrated_backend(config: &Config) -> Backend {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&db).await.unwrap();
        Backend::new(db, config).unwrap()
    }

    fn profile(email: Option<&str>, name: Option<&str>) -> UserInfo {
        UserInfo {
            email: email.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    async fn backend(config: &Config) -> Result<Backend, AppError> {
        let db = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Backend::new(db, config)
    }

    #[tokio::test]
    async fn authorization_request_targets_configured_provider() {
        let mut config = Config::default();
        config.oauth_clients.insert("google".into(), google_client());
        let backend = backend(&config).await.unwrap();

        let request = backend.authorization_request("google").unwrap();

        assert_eq!(request.client_id(), "inventory-client");
        assert_eq!(request.registration_id(), Some("google"));
        assert_eq!(
            request.redirect_uri(),
            "http://localhost/login/oauth2/code/google"
        );
        assert!(request.scopes().contains("email"));
        assert!(!request.state().is_empty());

        let target = url::Url::parse(request.redirect_target()).unwrap();
        assert!(request
            .redirect_target()
            .starts_with("https://accounts.example.com/o/oauth2/v2/auth?"));
        let state = target
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned());
        assert_eq!(state.as_deref(), Some(request.state()));
    }

    #[tokio::test]
    async fn each_request_gets_a_new_state() {
        let mut config = Config::default();
        config.oauth_clients.insert("google".into(), google_client());
        let backend = backend(&config).await.unwrap();

        let first = backend.authorization_request("google").unwrap();
        let second = backend.authorization_request("google").unwrap();
        assert_ne!(first.state(), second.state());
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let backend = backend(&Config::default()).await.unwrap();
        assert!(matches!(
            backend.authorization_request("github"),
            Err(AppError::ClientConfigNotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_provider_url_is_rejected() {
        let mut config = Config::default();
        let mut client = google_client();
        client.token_uri = "not a url".into();
        config.oauth_clients.insert("google".into(), client);

        assert!(matches!(
            backend(&config).await,
            Err(AppError::InvalidClientUrl { kind: "token", .. })
        ));
    }

    #[tokio::test]
    async fn state_mismatch_authenticates_nobody() {
        let mut config = Config::default();
        config.oauth_clients.insert("google".into(), google_client());
        let backend = backend(&config).await.unwrap();

        let user = backend
            .authenticate(Credentials {
                code: "code".into(),
                old_state: CsrfToken::new("expected".into()),
                new_state: CsrfToken::new("forged".into()),
                provider: "google".into(),
            })
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn provision_grants_admin_from_list_and_heals_role() {
        let mut config = Config::default();
        config.users.admin_emails = vec!["Ada@Example.com".into()];
        let backend = migrated_backend(&config).await;

        let admin = backend
            .provision("google", profile(Some("ada@example.com"), Some("Ada")), "t1")
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let mut demoted = backend.clone();
        demoted.users = UsersConfig::default();
        let user = demoted
            .provision("google", profile(Some("ada@example.com"), Some("Ada")), "t2")
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.created_at, admin.created_at);
    }

    #[tokio::test]
    async fn provision_falls_back_to_email_for_blank_name() {
        let backend = migrated_backend(&Config::default()).await;

        let missing = backend
            .provision("google", profile(Some("bob@example.com"), None), "t1")
            .await
            .unwrap();
        assert_eq!(missing.name, "bob@example.com");

        let blank = backend
            .provision("google", profile(Some("eve@example.com"), Some("  ")), "t1")
            .await
            .unwrap();
        assert_eq!(blank.name, "eve@example.com");
        assert_eq!(blank.role, Role::User);
    }

    #[tokio::test]
    async fn provision_requires_email() {
        let backend = migrated_backend(&Config::default()).await;

        for email in [None, Some(""), Some("  ")] {
            assert!(matches!(
                backend.provision("google", profile(email, Some("Ada")), "t1").await,
                Err(AppError::OAuth2Generic(_))
            ));
        }
    }
}
