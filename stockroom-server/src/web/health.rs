use axum::routing::get;

use crate::model::AxumRouter;

pub fn router() -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(self::get::health))
        .route("/health/db", get(self::get::database))
}

mod get {
    use std::sync::Arc;

    use {
        axum::{extract::State, Json},
        serde_json::{json, Value},
    };

    use crate::{model::AppContext, AppError};

    pub async fn health() -> Json<Value> {
        Json(json!({ "status": "ok" }))
    }

    pub async fn database(State(app_ctx): State<Arc<AppContext>>) -> Result<Json<Value>, AppError> {
        sqlx::query("select 1").execute(&app_ctx.db).await?;
        Ok(Json(json!({ "status": "ok", "database": "up" })))
    }
}
