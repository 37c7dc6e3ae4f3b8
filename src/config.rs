//! Engine configuration

use crate::error::{TransferError, TransferResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pallet id of `pallet-asset-conversion` on asset hubs
pub const DEFAULT_ASSET_CONVERSION_PALLET_ID: &str = "py/ascon";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Default for callers that have no stored preference
    pub light_clients_enabled: bool,
    /// How long light-client discovery collects responders
    pub discovery_window_ms: u64,
    /// Per-endpoint socket connect timeout
    pub connect_timeout_ms: u64,
    /// Bound on waiting for the first block of a new connection
    pub ready_timeout_ms: u64,
    /// Eight-byte pallet id used to derive pool accounts
    pub asset_conversion_pallet_id: String,
    /// Accept `ws://` endpoints on remote hosts
    pub allow_insecure_endpoints: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            light_clients_enabled: false,
            discovery_window_ms: 250,
            connect_timeout_ms: 10_000,
            ready_timeout_ms: 60_000,
            asset_conversion_pallet_id: DEFAULT_ASSET_CONVERSION_PALLET_ID.to_string(),
            allow_insecure_endpoints: false,
        }
    }
}

impl TransferConfig {
    pub fn from_json(json: &str) -> TransferResult<Self> {
        let config: Self = crate::utils::parse_json(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TransferResult<()> {
        if self.connect_timeout_ms == 0 {
            return Err(TransferError::configuration("connect_timeout_ms must be positive"));
        }
        if self.ready_timeout_ms == 0 {
            return Err(TransferError::configuration("ready_timeout_ms must be positive"));
        }
        self.pallet_id()?;
        Ok(())
    }

    /// Pallet id as raw bytes
    pub fn pallet_id(&self) -> TransferResult<[u8; 8]> {
        self.asset_conversion_pallet_id
            .as_bytes()
            .try_into()
            .map_err(|_| {
                TransferError::configuration(format!(
                    "Pallet id '{}' must be exactly 8 bytes",
                    self.asset_conversion_pallet_id
                ))
            })
    }

    pub fn discovery_window(&self) -> Duration {
        Duration::from_millis(self.discovery_window_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}
