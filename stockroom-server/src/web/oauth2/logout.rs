use axum::routing::get;

use crate::model::AxumRouter;

pub fn router() -> AxumRouter {
    AxumRouter::new().route("/logout", get(self::get::logout))
}

mod get {
    use {
        axum::{
            http::StatusCode,
            response::{IntoResponse, Response},
        },
        tracing::error,
    };

    use crate::web::oauth2::{found, AuthSession};

    pub async fn logout(mut auth_session: AuthSession) -> Response {
        match auth_session.logout().await {
            Ok(_) => found("/"),
            Err(e) => {
                error!("Error logging out: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
