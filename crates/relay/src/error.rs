//! Relay error types

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected PING reply: {0}")]
    UnexpectedPong(String),
}
