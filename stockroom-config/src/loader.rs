use std::{env, path::Path};

use {
    figment::{
        providers::{Env, Format, Toml},
        Figment,
    },
    serde::{de::DeserializeOwned, Serialize},
    serde_json::Value,
    tracing::debug,
};

use crate::{token_expander::expand_tokens, Error};

/// Environment variables with this prefix override file settings. Nested keys
/// are separated by a double underscore, e.g. `STOCKROOM_WEBSITE__BIND_PORTS__HTTP`.
pub const ENV_PREFIX: &str = "STOCKROOM_";

pub fn run_mode() -> String {
    env::var("RUN_MODE").unwrap_or_else(|_| "dev".to_string())
}

/// Loads `default.toml`, then `local.toml` and `{run_mode}.toml` when present,
/// then environment overrides, and finally expands `${...}` tokens.
pub fn load<T>(config_dir: impl AsRef<Path>, run_mode: &str) -> Result<T, Error>
where
    T: DeserializeOwned + Serialize,
{
    let config_dir = config_dir.as_ref();
    if !config_dir.is_dir() {
        return Err(Error::MissingDirectory(config_dir.display().to_string()));
    }

    let config: T = figment_with_paths(config_dir, run_mode).extract()?;
    let config_value: Value = serde_json::to_value(&config)?;
    let replaced = expand_tokens(&config_value);
    serde_json::from_value(replaced).map_err(Into::into)
}

pub fn figment_with_paths(config_dir: &Path, run_mode: &str) -> Figment {
    let default_path = config_dir.join("default.toml");
    let local_path = config_dir.join("local.toml");
    let run_mode_path = config_dir.join(format!("{}.toml", run_mode));

    let mut figment = Figment::new().merge(Toml::file(&default_path));

    if local_path.exists() {
        debug!("Merging local config from {}", local_path.display());
        figment = figment.merge(Toml::file(local_path));
    }
    if run_mode_path.exists() {
        debug!("Merging run mode config from {}", run_mode_path.display());
        figment = figment.merge(Toml::file(run_mode_path));
    }

    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}
