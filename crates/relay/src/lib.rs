//! Best-effort relay of verified webhook payloads onto a pub/sub channel

pub mod error;
pub mod publisher;
pub mod redis_bus;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::RelayError;
pub use publisher::{PublishOutcome, Publisher, Relay};
pub use redis_bus::{connect, RedisPublisher};
