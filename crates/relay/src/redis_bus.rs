//! Redis pub/sub transport

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::Config;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::{Publisher, Relay, RelayError};

/// Publishes over a single multiplexed Redis connection.
///
/// The connection is cloned per publish; clones share the underlying socket.
#[derive(Clone)]
pub struct RedisPublisher {
    conn: MultiplexedConnection,
}

impl RedisPublisher {
    /// Open a connection and probe it with `PING`, all within `timeout`
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, RelayError> {
        tokio::time::timeout(timeout, Self::connect_and_ping(url))
            .await
            .map_err(|_| RelayError::Timeout(timeout))?
    }

    async fn connect_and_ping(url: &str) -> Result<Self, RelayError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_tokio_connection().await?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(RelayError::UnexpectedPong(pong));
        }

        Ok(Self { conn })
    }
}

#[async_trait]
impl Publisher for RedisPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), RelayError> {
        let mut conn = self.conn.clone();
        let receivers: i64 = conn.publish(channel, payload.to_vec()).await?;
        debug!("Redis delivered to {} subscribers on {}", receivers, channel);
        Ok(())
    }
}

/// Build the relay from configuration, probing Redis once.
///
/// If the probe fails the relay stays disabled for the life of the process.
pub async fn connect(config: &Config) -> Relay {
    let addr = config.redis_addr();

    match RedisPublisher::connect(&config.redis_url(), config.relay_connect_timeout).await {
        Ok(publisher) => {
            info!("Connected to Redis at {}", addr);
            info!("Will publish webhooks to channel: {}", config.redis_channel);
            Relay::new(
                Arc::new(publisher),
                config.redis_channel.clone(),
                config.relay_publish_timeout,
            )
        }
        Err(e) => {
            warn!("Could not connect to Redis at {}: {}", addr, e);
            warn!("Redis publishing will be disabled. Webhooks will still be accepted.");
            Relay::disabled()
        }
    }
}
