//! Publisher capability and the optional relay built on it

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::RelayError;

/// A message bus that can broadcast raw bytes on a named channel.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), RelayError>;
}

/// Result of a single relay attempt
#[derive(Debug)]
pub enum PublishOutcome {
    /// No relay target configured
    Skipped,
    Published,
    Failed(RelayError),
}

#[derive(Clone)]
struct Target {
    publisher: Arc<dyn Publisher>,
    channel: String,
    timeout: Duration,
}

/// Maybe-present relay target.
///
/// A disabled relay turns every publish into a no-op. An enabled one bounds each
/// publish by its timeout; failures are logged and reported back, never raised.
#[derive(Clone, Default)]
pub struct Relay {
    target: Option<Target>,
}

impl Relay {
    pub fn new(
        publisher: Arc<dyn Publisher>,
        channel: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            target: Some(Target {
                publisher,
                channel: channel.into(),
                timeout,
            }),
        }
    }

    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Publish `payload` once, at most within the configured timeout
    pub async fn publish(&self, payload: &[u8]) -> PublishOutcome {
        let Some(target) = &self.target else {
            debug!("Relay disabled, not publishing");
            return PublishOutcome::Skipped;
        };

        let result = tokio::time::timeout(
            target.timeout,
            target.publisher.publish(&target.channel, payload),
        )
        .await
        .unwrap_or(Err(RelayError::Timeout(target.timeout)));

        match result {
            Ok(()) => {
                info!("Published webhook to Redis channel: {}", target.channel);
                PublishOutcome::Published
            }
            Err(e) => {
                error!("Error publishing to Redis channel {}: {}", target.channel, e);
                PublishOutcome::Failed(e)
            }
        }
    }
}
