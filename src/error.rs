//! error.rs - Startup and configuration errors
//!
//! Nothing on the scan path returns these; exchange failures are folded into
//! `exchanges::Unavailable` and never reach the caller as errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No usable exchanges configured (requested: {0})")]
    NoExchanges(String),
}

pub type Result<T> = std::result::Result<T, ScannerError>;
