//! Configuration loading, validation, and hashing.
//!
//! ```no_run
//! use crawl_to_md::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("base url: {:?}", config.base_url);
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::Config;
pub use validation::validate;

use thiserror::Error;

/// Errors from loading, parsing, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid URL in configuration: {0}")]
    InvalidUrl(String),

    #[error("validation error: {0}")]
    Validation(String),
}
