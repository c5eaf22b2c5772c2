use stockroom_server::{
    tracing::{error, info},
    AppError, Config, ServerBuilder, TracingLogger,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::load("./config")?;
    let _logger_guard = TracingLogger::from_config(&config)?;

    let server = ServerBuilder::new(config).await?.build();
    let addr = match server.start().await {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to start server: {}", e);
            return Err(e);
        }
    };
    info!("Listening on {}, press Ctrl+C to stop", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}
