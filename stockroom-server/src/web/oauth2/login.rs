use axum::routing::get;

use crate::model::AxumRouter;

pub fn router() -> AxumRouter {
    AxumRouter::new().route("/oauth2/authorization/:provider", get(self::get::login))
}

mod get {
    use std::sync::Arc;

    use {
        axum::{
            extract::{Path, Request, State},
            http::HeaderMap,
            response::IntoResponse,
        },
        tracing::debug,
    };

    use crate::{
        model::AppContext,
        web::oauth2::{found, AuthSession},
        AppError,
    };

    pub async fn login(
        auth_session: AuthSession,
        State(app_ctx): State<Arc<AppContext>>,
        Path(provider): Path<String>,
        request: Request,
    ) -> Result<impl IntoResponse, AppError> {
        let authorization_request = auth_session.backend.authorization_request(&provider)?;
        let (parts, _) = request.into_parts();

        let mut headers = HeaderMap::new();
        app_ctx
            .authorization_requests
            .save(Some(&authorization_request), &parts, &mut headers);

        debug!("Redirecting to {} for authorization", provider);
        Ok((headers, found(authorization_request.redirect_target())))
    }
}
