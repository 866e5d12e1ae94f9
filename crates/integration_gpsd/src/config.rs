//! gpsd client configuration

use serde::{Deserialize, Serialize};

/// Configuration for the gpsd connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsdConfig {
    /// gpsd host
    #[serde(default = "default_host")]
    pub host: String,

    /// gpsd port
    #[serde(default = "default_port")]
    pub port: u16,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Deadline for a one-shot position request in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// How long a cached fix stays valid for one-shot requests, in seconds
    #[serde(default = "default_cache_validity_secs")]
    pub cache_validity_secs: u64,

    /// Delay before the watch stream reconnects after a failure, in seconds
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    2947
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_poll_timeout_secs() -> u64 {
    15
}

const fn default_cache_validity_secs() -> u64 {
    45
}

const fn default_reconnect_delay_secs() -> u64 {
    5
}

impl Default for GpsdConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
            cache_validity_secs: default_cache_validity_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

impl GpsdConfig {
    /// Address string for the TCP connection
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create a configuration pointed at a test fixture
    #[must_use]
    pub fn for_testing(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            connect_timeout_secs: 2,
            poll_timeout_secs: 2,
            cache_validity_secs: 45,
            reconnect_delay_secs: 0,
        }
    }
}
