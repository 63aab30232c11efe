pub mod annotate;
pub mod check;

use crate::core::config::{load_config, Config};
use std::path::Path;

/// Configuration from `path`, or the defaults when no file is given
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(Config::default()),
    }
}
