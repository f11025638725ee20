//! Broker client configuration.

use crate::error::{BrokerError, BrokerResult};
use std::time::Duration;

/// Configuration for [`crate::HttpIdentityBroker`].
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Base URL of the broker admin API, e.g. `https://broker.internal`.
    pub base_url: String,
    /// Bearer token for the admin API.
    pub admin_token: String,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Whether to verify TLS certificates (disable only against local brokers).
    pub tls_verify: bool,
}

impl BrokerConfig {
    /// Config with default timeout (30s) and TLS verification on.
    #[must_use]
    pub fn new(base_url: impl Into<String>, admin_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            admin_token: admin_token.into(),
            request_timeout_secs: 30,
            tls_verify: true,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BrokerResult<()> {
        if self.base_url.is_empty() {
            return Err(BrokerError::InvalidConfig("base_url is empty".into()));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| BrokerError::InvalidConfig(format!("base_url: {e}")))?;
        if self.admin_token.is_empty() {
            return Err(BrokerError::InvalidConfig("admin_token is empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(BrokerError::InvalidConfig(
                "request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
