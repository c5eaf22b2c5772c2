use std::sync::Arc;

use {
    axum_login::AuthManagerLayerBuilder,
    tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer},
};

use crate::{
    model::{AppContext, AxumRouter},
    util::{SameSiteConfig, SessionConfig},
    web::{api, health, oauth2},
    AppError,
};

use super::Backend;

pub fn create_session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    let same_site = match config.same_site_policy {
        SameSiteConfig::Strict => SameSite::Strict,
        SameSiteConfig::Lax => SameSite::Lax,
        SameSiteConfig::None => SameSite::None,
    };

    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure)
        .with_same_site(same_site)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            config.expiry_days,
        )))
}

pub struct App {
    app_ctx: Arc<AppContext>,
    session_layer: SessionManagerLayer<MemoryStore>,
}

impl App {
    pub fn new(app_ctx: Arc<AppContext>, session_layer: SessionManagerLayer<MemoryStore>) -> Self {
        Self {
            app_ctx,
            session_layer,
        }
    }

    pub fn create_auth_router(self) -> Result<AxumRouter, AppError> {
        // Auth service.
        //
        // This combines the session layer with our backend to establish the auth
        // service which will provide the auth session as a request extension.
        let backend = Backend::new(self.app_ctx.db.clone(), &self.app_ctx.config)?;
        let auth_layer = AuthManagerLayerBuilder::new(backend, self.session_layer).build();

        Ok(api::router()
            .merge(oauth2::create_login_router())
            .merge(oauth2::create_callback_router())
            .merge(oauth2::create_logout_router())
            .merge(health::router())
            .layer(auth_layer))
    }
}
