use axum::routing::get;

use crate::model::AxumRouter;

pub fn router() -> AxumRouter {
    AxumRouter::new().route("/api/me", get(self::get::me))
}

mod get {
    use axum::Json;

    use crate::{model::User, web::oauth2::AuthSession, AppError};

    pub async fn me(auth_session: AuthSession) -> Result<Json<User>, AppError> {
        auth_session
            .user
            .map(Json)
            .ok_or_else(|| AppError::Unauthorized("No authentication provided".to_string()))
    }
}
