//! Application configuration

use std::env;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::{Error, Result};

const DEFAULT_PORT: &str = "8080";

const DEFAULT_SECRET_FILE: &str = ".secret";

/// GitHub caps webhook payloads at 25 MiB
const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    /// Listening port, always carrying its leading `:`
    pub port: String,
    /// Shared webhook secret (None = verification disabled)
    pub webhook_secret: Option<Vec<u8>>,
    pub redis_host: String,
    pub redis_port: String,
    pub redis_channel: String,
    pub relay_publish_timeout: Duration,
    pub relay_connect_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: format!(":{}", DEFAULT_PORT),
            webhook_secret: None,
            redis_host: "localhost".to_string(),
            redis_port: "6379".to_string(),
            redis_channel: "github-webhook".to_string(),
            relay_publish_timeout: Duration::from_secs(5),
            relay_connect_timeout: Duration::from_secs(5),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Also reads the secret file named by `WEBHOOK_SECRET_FILE`. A missing
    /// secret only disables verification; a malformed `PORT` is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key/value source
    ///
    /// Empty values count as unset; unparsable numbers fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| get(key).filter(|v| !v.is_empty());
        let secs = |key: &str| {
            var(key)
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
        };

        let port = normalize_port(&var("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string()))?;
        let secret_file =
            var("WEBHOOK_SECRET_FILE").unwrap_or_else(|| DEFAULT_SECRET_FILE.to_string());
        let webhook_secret = load_secret(Path::new(&secret_file));

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            webhook_secret,
            redis_host: var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: var("REDIS_PORT").unwrap_or(defaults.redis_port),
            redis_channel: var("REDIS_CHANNEL").unwrap_or(defaults.redis_channel),
            relay_publish_timeout: secs("RELAY_PUBLISH_TIMEOUT_SECS")
                .unwrap_or(defaults.relay_publish_timeout),
            relay_connect_timeout: secs("RELAY_CONNECT_TIMEOUT_SECS")
                .unwrap_or(defaults.relay_connect_timeout),
            max_body_bytes: var("MAX_BODY_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_body_bytes),
        })
    }

    /// Address the HTTP server binds to, e.g. `0.0.0.0:8080`
    pub fn bind_addr(&self) -> String {
        format!("{}{}", self.host, self.port)
    }

    pub fn redis_addr(&self) -> String {
        format!("{}:{}", self.redis_host, self.redis_port)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}", self.redis_addr())
    }
}

/// Normalize a port to its `:<port>` form
pub fn normalize_port(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let digits = raw.strip_prefix(':').unwrap_or(raw);
    if digits.is_empty() {
        return Ok(format!(":{}", DEFAULT_PORT));
    }
    digits
        .parse::<u16>()
        .map_err(|e| Error::Config(format!("invalid PORT {:?}: {}", raw, e)))?;
    Ok(format!(":{}", digits))
}

/// Read the webhook secret as raw bytes, trimming surrounding ASCII whitespace
///
/// Returns `Ok(None)` when the file holds nothing but whitespace.
pub fn read_secret(path: &Path) -> Result<Option<Vec<u8>>> {
    let data = std::fs::read(path).map_err(|source| Error::SecretFile {
        path: path.display().to_string(),
        source,
    })?;
    let secret = data.trim_ascii();
    if secret.is_empty() {
        return Ok(None);
    }
    Ok(Some(secret.to_vec()))
}

/// Load the webhook secret, downgrading any failure to a warning
pub fn load_secret(path: &Path) -> Option<Vec<u8>> {
    match read_secret(path) {
        Ok(Some(secret)) => {
            info!("Webhook secret loaded. Signature verification enabled.");
            Some(secret)
        }
        Ok(None) => {
            warn!(
                "Secret file {} is empty. Webhook signature verification will be skipped.",
                path.display()
            );
            None
        }
        Err(e) => {
            warn!("{}. Webhook signature verification will be skipped.", e);
            warn!(
                "To enable verification, create the secret file with your GitHub webhook secret."
            );
            None
        }
    }
}
