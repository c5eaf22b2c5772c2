use std::sync::Arc;

use tracing::debug;

use crate::{
    model::{AppContext, AxumRouter},
    util::Config,
    web::{create_session_layer, App},
    AppError,
};

use super::server::Server;

/// Wires configuration, database and routes together ahead of binding any
/// socket.
pub struct ServerBuilder {
    app_ctx: Arc<AppContext>,
    router: AxumRouter,
}

impl ServerBuilder {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        debug!("Preparing server for run mode '{}'", config.run_mode);

        let session_layer = create_session_layer(&config.session);
        let app_ctx = Arc::new(AppContext::new(config).await?);
        let router = App::new(app_ctx.clone(), session_layer).create_auth_router()?;

        Ok(Self { app_ctx, router })
    }

    pub fn build(self) -> Server {
        Server {
            config: self.app_ctx.config.clone(),
            router: self.router.with_state(self.app_ctx),
        }
    }
}
