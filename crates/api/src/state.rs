//! Application state

use common::Config;
use relay::Relay;

/// Shared application state, built once at startup
pub struct AppState {
    pub config: Config,
    pub relay: Relay,
}

impl AppState {
    pub fn new(config: Config, relay: Relay) -> Self {
        Self { config, relay }
    }
}
