//! Configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::errors::{ClientError, Result};
use crate::lottery::session::SessionConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agency client configuration
    pub client: ClientConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Agency client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Agency identifier
    pub id: u32,
    /// Lottery server `host:port`
    #[serde(default = "default_server_address")]
    pub server_address: String,
    /// Maximum bets per batch
    #[serde(default = "default_max_batch_amount")]
    pub max_batch_amount: usize,
    /// Delay between requests in milliseconds
    #[serde(default = "default_loop_period")]
    pub loop_period_ms: u64,
    /// Per-request timeout in seconds (0 = wait forever)
    #[serde(default)]
    pub request_timeout_seconds: u64,
    /// Directory holding `agency-<id>.csv`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Minimal configuration for an agency, everything else defaulted
    pub fn new(id: u32) -> Self {
        Self {
            id,
            server_address: default_server_address(),
            max_batch_amount: default_max_batch_amount(),
            loop_period_ms: default_loop_period(),
            request_timeout_seconds: 0,
            data_dir: default_data_dir(),
        }
    }
}

fn default_server_address() -> String {
    "server:12345".to_string()
}

fn default_max_batch_amount() -> usize {
    100
}

fn default_loop_period() -> u64 {
    1000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.client.max_batch_amount == 0 {
            return Err(ClientError::Configuration(
                "client.max_batch_amount must be at least 1".to_string(),
            ));
        }
        if self.client.loop_period_ms == 0 {
            return Err(ClientError::Configuration(
                "client.loop_period_ms must be at least 1".to_string(),
            ));
        }
        if self.client.server_address.trim().is_empty() {
            return Err(ClientError::Configuration(
                "client.server_address is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Bet file of this agency
    pub fn bets_path(&self) -> PathBuf {
        self.client
            .data_dir
            .join(format!("agency-{}.csv", self.client.id))
    }

    /// Session parameters derived from this configuration
    pub fn session_config(&self) -> SessionConfig {
        let timeout = self.client.request_timeout_seconds;
        SessionConfig {
            agency_id: self.client.id,
            server_address: self.client.server_address.clone(),
            loop_period: Duration::from_millis(self.client.loop_period_ms),
            request_timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
        }
    }
}
