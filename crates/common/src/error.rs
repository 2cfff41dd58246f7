//! Error types

use thiserror::Error;

/// Main error type for Hookrelay
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read secret file {path}: {source}")]
    SecretFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
