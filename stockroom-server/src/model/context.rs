use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::debug;

use crate::{
    auth::{AuthorizationRequestRepository, CookieAuthorizationRequestStore},
    util::Config,
    AppError,
};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub db: SqlitePool,
    pub authorization_requests: Arc<dyn AuthorizationRequestRepository>,
}

impl Debug for AppContext {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Connects the user database and applies pending migrations.
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let db = SqlitePoolOptions::new()
            .max_connections(config.database.max_connections)
            // An in-memory database lives only as long as its connection.
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(&config.database.url)
            .await
            .map_err(|inner| AppError::DatabaseConnectionError {
                conn_str: config.database.url.clone(),
                inner,
            })?;

        sqlx::migrate!().run(&db).await?;
        debug!("Database ready at {}", config.database.url);

        let authorization_requests =
            Arc::new(CookieAuthorizationRequestStore::new(config.auth_cookies.clone()));

        Ok(Self {
            config: Arc::new(config),
            db,
            authorization_requests,
        })
    }
}
