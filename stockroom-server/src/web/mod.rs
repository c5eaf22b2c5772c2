mod api;
mod app;
mod health;
mod oauth2;

pub(crate) use {
    self::oauth2::Backend,
    app::{create_session_layer, App},
};
