use std::{net::SocketAddr, sync::Arc};

use {axum::Router, tracing::debug};

use crate::{
    util::{
        http::{bind, create_tls_acceptor, serve_http, serve_https},
        Config,
    },
    AppError,
};

pub struct Server {
    pub router: Router,
    pub config: Arc<Config>,
}

impl Server {
    /// Binds the listener and returns once it is accepting connections in
    /// the background. TLS material is read and the port bound before
    /// anything is spawned, so either failure is returned here.
    pub async fn start(self) -> Result<SocketAddr, AppError> {
        debug!("Starting server with configuration: {:?}", self.config);

        let website = &self.config.website;
        let local_addr = if website.bind_ssl_config.enabled {
            let tls_acceptor = create_tls_acceptor(&website.bind_ssl_config)?;
            let listener = bind((website.bind_address, website.bind_ports.https).into()).await?;
            let local_addr = listener.local_addr()?;

            tokio::spawn(serve_https(listener, self.router, tls_acceptor));
            local_addr
        } else {
            let listener = bind((website.bind_address, website.bind_ports.http).into()).await?;
            let local_addr = listener.local_addr()?;

            tokio::spawn(serve_http(listener, self.router));
            local_addr
        };

        debug!("Server listening on {}", local_addr);
        Ok(local_addr)
    }
}
