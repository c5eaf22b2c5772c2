use {
    tracing::{info, subscriber::set_global_default, Level},
    tracing_appender::non_blocking::WorkerGuard,
    tracing_subscriber::fmt::format::FmtSpan,
};

use super::config::{Config, Verbosity};
use crate::AppError;

impl Verbosity {
    fn level(&self) -> Level {
        match self {
            Verbosity::Trace => Level::TRACE,
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Info => Level::INFO,
            Verbosity::Warn => Level::WARN,
            Verbosity::Error => Level::ERROR,
        }
    }
}

/// Installs the global subscriber. Log lines are written by a background
/// worker that stops when this value is dropped.
pub struct TracingLogger {
    _guard: WorkerGuard,
}

impl TracingLogger {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let level = config.logger.verbosity.level();
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

        let subscriber = tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_max_level(level)
            .with_span_events(FmtSpan::CLOSE)
            .finish();

        set_global_default(subscriber).map_err(|e| AppError::LoggerError(e.to_string()))?;
        info!("Logger initialized at {} for run mode '{}'", level, config.run_mode);

        Ok(TracingLogger { _guard: guard })
    }
}
