#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read configuration: {0}")]
    Figment(#[from] Box<figment::Error>),
    #[error("Failed to transform configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration directory not found: {0}")]
    MissingDirectory(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Figment(Box::new(err))
    }
}
