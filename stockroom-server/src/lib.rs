pub mod auth;
mod app;
mod error;
pub mod model;
mod util;
mod web;

pub use {
    app::{Server, ServerBuilder},
    error::AppError,
    tracing,
    util::{AuthCookieConfig, ClientConfig, Config, SameSiteConfig, TracingLogger},
};
