//! In-memory publishers for tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Publisher, RelayError};

/// Records every message it is asked to publish
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingPublisher {
    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), RelayError> {
        self.messages
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Fails every publish with a connection error
pub struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(&self, _channel: &str, _payload: &[u8]) -> Result<(), RelayError> {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        Err(RelayError::Redis(io.into()))
    }
}

/// Never completes a publish
pub struct StallingPublisher;

#[async_trait]
impl Publisher for StallingPublisher {
    async fn publish(&self, _channel: &str, _payload: &[u8]) -> Result<(), RelayError> {
        std::future::pending().await
    }
}
