//! Chain registry
//!
//! Immutable chain table loaded at start-up, either from the built-in
//! defaults or from a JSON document.

use super::types::{get_chain_by_id, Chain, ChainType};
use crate::error::{TransferError, TransferResult};
use crate::utils::validate_ws_endpoint;
use crate::{log_debug, log_warn};
use std::collections::HashSet;

fn relay(id: &str, spec_name: &str, name: &str, token: &str, ss58: u16, endpoints: &[&str]) -> Chain {
    Chain {
        id: id.to_string(),
        spec_name: spec_name.to_string(),
        name: name.to_string(),
        chain_type: ChainType::Relay,
        relay_id: None,
        numeric_id: None,
        ws_endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        ss58_prefix: ss58,
        native_token: token.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn para(
    id: &str,
    spec_name: &str,
    name: &str,
    chain_type: ChainType,
    relay_id: &str,
    para_id: u32,
    token: &str,
    ss58: u16,
    endpoints: &[&str],
) -> Chain {
    Chain {
        id: id.to_string(),
        spec_name: spec_name.to_string(),
        name: name.to_string(),
        chain_type,
        relay_id: Some(relay_id.to_string()),
        numeric_id: Some(para_id),
        ws_endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        ss58_prefix: ss58,
        native_token: token.to_string(),
    }
}

lazy_static::lazy_static! {
    /// Built-in chain table
    static ref BUILTIN_CHAINS: Vec<Chain> = {
        use ChainType::{Parachain, System};

        vec![
            // Relays
            relay("polkadot", "polkadot", "Polkadot", "DOT", 0, &[
                "wss://rpc.ibp.network/polkadot",
                "wss://polkadot-rpc.dwellir.com",
            ]),
            relay("kusama", "kusama", "Kusama", "KSM", 2, &[
                "wss://rpc.ibp.network/kusama",
                "wss://kusama-rpc.dwellir.com",
            ]),
            relay("westend", "westend", "Westend", "WND", 42, &[
                "wss://westend-rpc.polkadot.io",
                "wss://rpc.ibp.network/westend",
            ]),
            relay("paseo", "paseo", "Paseo", "PAS", 0, &[
                "wss://rpc.ibp.network/paseo",
                "wss://paseo.rpc.amforc.com",
            ]),
            // System chains
            para("polkadot-asset-hub", "statemint", "Polkadot Asset Hub", System, "polkadot", 1000, "DOT", 0, &[
                "wss://polkadot-asset-hub-rpc.polkadot.io",
                "wss://sys.ibp.network/asset-hub-polkadot",
            ]),
            para("kusama-asset-hub", "statemine", "Kusama Asset Hub", System, "kusama", 1000, "KSM", 2, &[
                "wss://kusama-asset-hub-rpc.polkadot.io",
                "wss://sys.ibp.network/asset-hub-kusama",
            ]),
            para("westend-asset-hub", "westmint", "Westend Asset Hub", System, "westend", 1000, "WND", 42, &[
                "wss://westend-asset-hub-rpc.polkadot.io",
            ]),
            para("paseo-asset-hub", "asset-hub-paseo", "Paseo Asset Hub", System, "paseo", 1000, "PAS", 0, &[
                "wss://sys.ibp.network/asset-hub-paseo",
            ]),
            para("polkadot-bridge-hub", "bridge-hub-polkadot", "Polkadot Bridge Hub", System, "polkadot", 1002, "DOT", 0, &[
                "wss://polkadot-bridge-hub-rpc.polkadot.io",
            ]),
            // Parachains
            para("hydration", "hydradx", "Hydration", Parachain, "polkadot", 2034, "HDX", 63, &[
                "wss://rpc.hydradx.cloud",
                "wss://hydration.ibp.network",
            ]),
            para("bifrost-polkadot", "bifrost_polkadot", "Bifrost", Parachain, "polkadot", 2030, "BNC", 6, &[
                "wss://hk.p.bifrost-rpc.liebi.com/ws",
            ]),
            para("astar", "astar", "Astar", Parachain, "polkadot", 2006, "ASTR", 5, &[
                "wss://rpc.astar.network",
            ]),
            para("karura", "karura", "Karura", Parachain, "kusama", 2000, "KAR", 8, &[
                "wss://karura-rpc-0.aca-api.network",
            ]),
        ]
    };
}

/// Validated, immutable set of chains
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<Chain>,
}

impl ChainRegistry {
    /// Build a registry, validating invariants and endpoints
    pub fn new(chains: Vec<Chain>, allow_insecure_endpoints: bool) -> TransferResult<Self> {
        let mut seen = HashSet::new();

        for chain in &chains {
            chain.validate()?;

            if !seen.insert(chain.id.clone()) {
                return Err(TransferError::configuration(format!(
                    "Duplicate chain id '{}'",
                    chain.id
                )));
            }

            for endpoint in &chain.ws_endpoints {
                let validation = validate_ws_endpoint(endpoint, allow_insecure_endpoints);
                if !validation.is_valid {
                    return Err(TransferError::configuration(format!(
                        "Invalid endpoint for {}",
                        chain.id
                    ))
                    .with_details(validation.errors.join("; ")));
                }
                for warning in &validation.warnings {
                    log_warn!("chains", "Endpoint warning", chain = chain.id, warning = warning);
                }
            }
        }

        for chain in chains.iter().filter(|c| !c.is_relay()) {
            let relay_id = chain.network();
            let relay_ok = chains.iter().any(|c| c.id == relay_id && c.is_relay());
            if !relay_ok {
                return Err(TransferError::configuration(format!(
                    "Chain {} references unknown relay '{}'",
                    chain.id, relay_id
                )));
            }
        }

        log_debug!("chains", "Chain registry loaded", count = chains.len());
        Ok(Self { chains })
    }

    /// Built-in defaults
    pub fn builtin() -> Self {
        Self {
            chains: BUILTIN_CHAINS.clone(),
        }
    }

    /// Load a JSON array of chains
    pub fn from_json(json: &str, allow_insecure_endpoints: bool) -> TransferResult<Self> {
        let chains: Vec<Chain> = crate::utils::parse_json(json)?;
        Self::new(chains, allow_insecure_endpoints)
    }

    pub fn get(&self, chain_id: &str) -> TransferResult<&Chain> {
        get_chain_by_id(chain_id, &self.chains)
    }

    pub fn all(&self) -> &[Chain] {
        &self.chains
    }

    /// Relay chain of the given chain (itself for relays)
    pub fn relay_of(&self, chain: &Chain) -> TransferResult<&Chain> {
        self.get(chain.network())
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
