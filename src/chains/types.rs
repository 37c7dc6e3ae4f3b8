//! Chain descriptors

use crate::error::{TransferError, TransferResult};
use crate::xcm::NetworkId;
use serde::{Deserialize, Serialize};

pub type ChainId = String;

/// Position of a chain in its relay network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Relay,
    System,
    Parachain,
}

/// Static description of one Substrate chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub id: ChainId,
    pub spec_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub chain_type: ChainType,
    /// Relay network this chain belongs to; `None` only for relays
    #[serde(default)]
    pub relay_id: Option<ChainId>,
    /// Para id used in `Parachain` junctions; `None` for relays
    #[serde(default)]
    pub numeric_id: Option<u32>,
    pub ws_endpoints: Vec<String>,
    #[serde(default = "default_ss58_prefix")]
    pub ss58_prefix: u16,
    /// Symbol of the token paid for fees on this chain
    pub native_token: String,
}

fn default_ss58_prefix() -> u16 {
    42
}

impl Chain {
    pub fn is_relay(&self) -> bool {
        self.chain_type == ChainType::Relay
    }

    pub fn is_system_chain(&self) -> bool {
        self.chain_type == ChainType::System
    }

    pub fn is_parachain(&self) -> bool {
        self.chain_type == ChainType::Parachain
    }

    /// Relay network id (the chain's own id for relays)
    pub fn network(&self) -> &str {
        self.relay_id.as_deref().unwrap_or(&self.id)
    }

    pub fn same_network(&self, other: &Chain) -> bool {
        self.network() == other.network()
    }

    /// Consensus identifier of this chain's network
    pub fn network_id(&self) -> TransferResult<NetworkId> {
        NetworkId::for_relay(self.network()).ok_or_else(|| {
            TransferError::configuration(format!(
                "Network '{}' of chain {} has no known consensus id",
                self.network(),
                self.id
            ))
        })
    }

    /// Para id, required for every non-relay chain
    pub fn para_id(&self) -> TransferResult<u32> {
        self.numeric_id.ok_or_else(|| {
            TransferError::configuration(format!("Chain {} has no numeric id", self.id))
        })
    }

    /// Check the relay/para invariants
    pub fn validate(&self) -> TransferResult<()> {
        if self.id.trim().is_empty() {
            return Err(TransferError::configuration("Chain id must not be empty"));
        }

        if self.ws_endpoints.is_empty() {
            return Err(TransferError::configuration(format!(
                "Chain {} has no WebSocket endpoints",
                self.id
            )));
        }

        match self.chain_type {
            ChainType::Relay => {
                if self.numeric_id.is_some() {
                    return Err(TransferError::configuration(format!(
                        "Relay chain {} must not have a numeric id",
                        self.id
                    )));
                }
                if self.relay_id.is_some() {
                    return Err(TransferError::configuration(format!(
                        "Relay chain {} must not reference a relay",
                        self.id
                    )));
                }
            }
            ChainType::System | ChainType::Parachain => {
                if self.relay_id.is_none() {
                    return Err(TransferError::configuration(format!(
                        "Chain {} must reference its relay chain",
                        self.id
                    )));
                }
                if self.numeric_id.is_none() {
                    return Err(TransferError::configuration(format!(
                        "Chain {} must have a numeric id",
                        self.id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Look up a chain by id in a candidate set
pub fn get_chain_by_id<'a>(chain_id: &str, chains: &'a [Chain]) -> TransferResult<&'a Chain> {
    chains
        .iter()
        .find(|c| c.id == chain_id)
        .ok_or_else(|| TransferError::chain_not_found(chain_id))
}
