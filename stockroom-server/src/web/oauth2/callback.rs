use axum::routing::get;

use crate::model::AxumRouter;

pub fn router() -> AxumRouter {
    AxumRouter::new().route("/login/oauth2/code/:provider", get(self::get::callback))
}

mod get {
    use std::sync::Arc;

    use {
        axum::{
            extract::{Path, Request, State},
            http::HeaderMap,
            response::IntoResponse,
        },
        oauth2::CsrfToken,
        tracing::{debug, error, warn},
    };

    use crate::{
        auth::AuthorizationRequest,
        model::AppContext,
        web::oauth2::{
            found,
            handler::{failure_target, success_target, LoginFailure},
            AuthSession, AuthzResp, Credentials,
        },
    };

    pub async fn callback(
        mut auth_session: AuthSession,
        State(app_ctx): State<Arc<AppContext>>,
        Path(provider): Path<String>,
        request: Request,
    ) -> impl IntoResponse {
        debug!("OAuth2 callback for provider: {}", provider);
        let (parts, _) = request.into_parts();
        let mut headers = HeaderMap::new();

        let outcome = match authorization_response(AuthzResp::from_request(&parts)) {
            Ok(resp) => {
                let stored = app_ctx
                    .authorization_requests
                    .remove(&parts, &mut headers);
                complete_login(&mut auth_session, &provider, stored, resp).await
            }
            Err(failure) => Err(failure),
        };

        let target = match outcome {
            Ok(()) => success_target(&app_ctx.config, &parts.headers),
            Err(failure) => {
                warn!("OAuth2 login via {} failed: {}", provider, failure.code());
                failure_target(&app_ctx.config, &failure)
            }
        };

        (headers, found(&target))
    }

    /// A callback carries a state and either a code or a provider error.
    fn authorization_response(resp: AuthzResp) -> Result<AuthzResp, LoginFailure> {
        let has_state = resp.state.as_deref().is_some_and(|s| !s.is_empty());
        let has_outcome = resp.code.as_deref().is_some_and(|c| !c.is_empty())
            || resp.error.as_deref().is_some_and(|e| !e.is_empty());

        if has_state && has_outcome {
            Ok(resp)
        } else {
            Err(LoginFailure::InvalidRequest)
        }
    }

    async fn complete_login(
        auth_session: &mut AuthSession,
        provider: &str,
        stored: Option<AuthorizationRequest>,
        resp: AuthzResp,
    ) -> Result<(), LoginFailure> {
        let stored = stored.ok_or(LoginFailure::RequestNotFound)?;

        if stored.registration_id() != Some(provider) {
            return Err(LoginFailure::RegistrationMismatch);
        }

        if let Some(error) = resp.error.filter(|e| !e.is_empty()) {
            if let Some(description) = resp.error_description {
                debug!("Provider {} returned {}: {}", provider, error, description);
            }
            return Err(LoginFailure::Provider(error));
        }

        let creds = Credentials {
            code: resp.code.unwrap_or_default(),
            old_state: CsrfToken::new(stored.state().to_string()),
            new_state: CsrfToken::new(resp.state.unwrap_or_default()),
            provider: provider.to_string(),
        };

        let user = match auth_session.authenticate(creds).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(LoginFailure::InvalidState),
            Err(e) => {
                error!("Authentication via {} failed: {:?}", provider, e);
                return Err(LoginFailure::AuthenticationFailed);
            }
        };

        auth_session.login(&user).await.map_err(|e| {
            error!("Error logging in the user: {:?}", e);
            LoginFailure::LoginFailed
        })
    }
}
