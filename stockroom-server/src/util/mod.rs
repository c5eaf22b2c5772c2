mod config;
pub use config::{
    AuthCookieConfig, ClientConfig, Config, SameSiteConfig, SessionConfig, SslConfig,
    UsersConfig,
};

mod logger;
pub use logger::TracingLogger;

pub(crate) mod http;
