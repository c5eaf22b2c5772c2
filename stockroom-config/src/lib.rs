mod error;
mod loader;
mod token_expander;

pub use {
    error::Error,
    loader::{load, run_mode, figment_with_paths, ENV_PREFIX},
    token_expander::expand_tokens,
};
