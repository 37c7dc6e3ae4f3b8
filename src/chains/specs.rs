//! Light-client chain specifications
//!
//! A chain is light-client capable only when a spec is registered for it.
//! Relays are additionally known to external providers by a well-known name.

use super::types::ChainId;
use crate::error::{TransferError, TransferResult};
use crate::log_debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const POLKADOT_SPEC_URL: &str =
    "https://raw.githubusercontent.com/polkadot-fellows/runtimes/main/chain-specs/polkadot.json";
pub const KUSAMA_SPEC_URL: &str =
    "https://raw.githubusercontent.com/polkadot-fellows/runtimes/main/chain-specs/kusama.json";
pub const WESTEND_SPEC_URL: &str =
    "https://raw.githubusercontent.com/polkadot-fellows/runtimes/main/chain-specs/westend.json";
pub const POLKADOT_ASSET_HUB_SPEC_URL: &str =
    "https://raw.githubusercontent.com/polkadot-fellows/runtimes/main/chain-specs/asset-hub-polkadot.json";
pub const KUSAMA_ASSET_HUB_SPEC_URL: &str =
    "https://raw.githubusercontent.com/polkadot-fellows/runtimes/main/chain-specs/asset-hub-kusama.json";

/// Where the raw spec JSON comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SpecSource {
    Inline(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpecEntry {
    /// Name under which external light-client providers know the chain
    #[serde(default)]
    pub well_known: Option<String>,
    pub source: SpecSource,
}

/// Raw chain spec ready to hand to a light client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    pub chain_id: ChainId,
    pub well_known: Option<String>,
    pub raw: Arc<str>,
}

/// Registered specs plus a cache of fetched URL sources
pub struct ChainSpecRegistry {
    entries: HashMap<ChainId, ChainSpecEntry>,
    fetched: Mutex<HashMap<ChainId, Arc<str>>>,
    http: reqwest::Client,
}

impl ChainSpecRegistry {
    pub fn new(entries: HashMap<ChainId, ChainSpecEntry>) -> Self {
        Self {
            entries,
            fetched: Mutex::new(HashMap::new()),
            http: reqwest::Client::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    /// Specs for the built-in relays and asset hubs
    pub fn builtin() -> Self {
        let url = |well_known: Option<&str>, url: &str| ChainSpecEntry {
            well_known: well_known.map(str::to_string),
            source: SpecSource::Url(url.to_string()),
        };

        let mut entries = HashMap::new();
        entries.insert("polkadot".to_string(), url(Some("polkadot"), POLKADOT_SPEC_URL));
        entries.insert("kusama".to_string(), url(Some("ksmcc3"), KUSAMA_SPEC_URL));
        entries.insert("westend".to_string(), url(Some("westend2"), WESTEND_SPEC_URL));
        entries.insert(
            "polkadot-asset-hub".to_string(),
            url(None, POLKADOT_ASSET_HUB_SPEC_URL),
        );
        entries.insert(
            "kusama-asset-hub".to_string(),
            url(None, KUSAMA_ASSET_HUB_SPEC_URL),
        );
        Self::new(entries)
    }

    pub fn insert(&mut self, chain_id: impl Into<ChainId>, entry: ChainSpecEntry) {
        self.entries.insert(chain_id.into(), entry);
    }

    pub fn has_spec(&self, chain_id: &str) -> bool {
        self.entries.contains_key(chain_id)
    }

    pub fn well_known(&self, chain_id: &str) -> Option<&str> {
        self.entries
            .get(chain_id)
            .and_then(|e| e.well_known.as_deref())
    }

    /// Resolve the raw spec, fetching and caching URL sources
    pub async fn load(&self, chain_id: &str) -> TransferResult<ChainSpec> {
        let entry = self.entries.get(chain_id).ok_or_else(|| {
            TransferError::configuration(format!("No light-client spec for {}", chain_id))
        })?;

        let raw = match &entry.source {
            SpecSource::Inline(raw) => Arc::from(raw.as_str()),
            SpecSource::Url(url) => {
                let mut fetched = self.fetched.lock().await;
                if let Some(raw) = fetched.get(chain_id) {
                    raw.clone()
                } else {
                    log_debug!("chains", "Fetching chain spec", chain = chain_id, url = url);
                    let body = self
                        .http
                        .get(url)
                        .timeout(Duration::from_secs(30))
                        .send()
                        .await
                        .map_err(|e| {
                            TransferError::connection(format!("Failed to fetch chain spec: {}", e))
                        })?
                        .error_for_status()
                        .map_err(|e| {
                            TransferError::connection(format!("Chain spec request failed: {}", e))
                        })?
                        .text()
                        .await
                        .map_err(|e| {
                            TransferError::connection(format!("Failed to read chain spec: {}", e))
                        })?;
                    let raw: Arc<str> = Arc::from(body.as_str());
                    fetched.insert(chain_id.to_string(), raw.clone());
                    raw
                }
            }
        };

        Ok(ChainSpec {
            chain_id: chain_id.to_string(),
            well_known: entry.well_known.clone(),
            raw,
        })
    }
}

impl Default for ChainSpecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
