use {
    axum::{
        http::StatusCode,
        response::{IntoResponse, Json, Response},
    },
    oauth2::{basic::BasicRequestTokenError, reqwest::AsyncHttpClientError},
    serde_json::json,
    sqlx::migrate::MigrateError,
    tracing::error,
    url::ParseError,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid config: {0}")]
    ConfigError(#[from] stockroom_config::Error),
    #[error("Logger error: {0}")]
    LoggerError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Client configuration not found: {0}")]
    ClientConfigNotFound(String),
    #[error("Invalid {kind} URL for client {client_name} '{url}': {inner}")]
    InvalidClientUrl {
        client_name: String,
        kind: &'static str,
        url: String,
        inner: ParseError,
    },
    #[error("Database connection error with '{conn_str}': {inner}")]
    DatabaseConnectionError { conn_str: String, inner: sqlx::Error },
    #[error("Database migration error: {0}")]
    DatabaseMigrationError(#[from] MigrateError),
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("OAuth2 error: {0}")]
    OAuth2(#[from] BasicRequestTokenError<AsyncHttpClientError>),
    #[error("OAuth2 error: {0}")]
    OAuth2Generic(String),
    #[error("Invalid certificate file: {0}")]
    InvalidCertificate(String),
    #[error("Invalid private key in '{file_path}': {error}")]
    InvalidPrivateKey { file_path: String, error: String },
    #[error("TLS error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ClientConfigNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::OAuth2(_) | AppError::OAuth2Generic(_) | AppError::Reqwest(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
