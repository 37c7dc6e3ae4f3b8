//! Asset routes and extrinsic selectors
//!
//! A route names where a token's reserve lives, written from a sibling
//! parachain's point of view (`parents: 1`) on the token's home network.
//! It is re-anchored to the origin chain when building a transfer.

use crate::chains::{Chain, ChainId};
use crate::error::{TransferError, TransferResult};
use crate::xcm::{Asset, Junction, Location, NetworkId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const LIMITED_RESERVE_TRANSFER: &str = "limited_reserve_transfer_assets";
pub const LIMITED_TELEPORT: &str = "limited_teleport_assets";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetRoute {
    /// Native token of the relay chain
    RelayNative,
    /// Asset held in a pallet of a parachain (`Assets` on an asset hub)
    PalletAsset {
        para_id: u32,
        pallet_instance: u8,
        general_index: u128,
    },
    /// Native token of a parachain
    ParachainNative { para_id: u32 },
    /// Explicit location in sibling view
    Fixed { location: Location },
}

impl AssetRoute {
    /// Location in sibling view on the home network
    pub fn home_location(&self) -> Location {
        let junctions = match self {
            AssetRoute::RelayNative => vec![],
            AssetRoute::PalletAsset {
                para_id,
                pallet_instance,
                general_index,
            } => vec![
                Junction::Parachain(*para_id),
                Junction::PalletInstance(*pallet_instance),
                Junction::GeneralIndex(*general_index),
            ],
            AssetRoute::ParachainNative { para_id } => vec![Junction::Parachain(*para_id)],
            AssetRoute::Fixed { location } => return location.clone(),
        };

        Location::from_junctions(1, junctions).unwrap_or_else(Location::parent)
    }

    /// Location as seen from `origin`
    pub fn location_from(&self, home_network: &str, origin: &Chain) -> TransferResult<Location> {
        reanchor(&self.home_location(), home_network, origin)
    }

    /// Fungible asset of `plancks` as seen from `origin`
    pub fn asset(&self, plancks: u128, home_network: &str, origin: &Chain) -> TransferResult<Asset> {
        Ok(Asset::fungible(self.location_from(home_network, origin)?, plancks))
    }
}

/// Re-anchor a sibling-view location to `origin`
pub fn reanchor(home: &Location, home_network: &str, origin: &Chain) -> TransferResult<Location> {
    if origin.network() != home_network {
        if home.parents > 1 {
            let parents = if origin.is_relay() { home.parents - 1 } else { home.parents };
            return Ok(Location::new(parents, home.interior.clone()));
        }

        let network = NetworkId::for_relay(home_network).ok_or_else(|| {
            TransferError::configuration(format!("Unknown home network '{}'", home_network))
        })?;
        let mut junctions = vec![Junction::GlobalConsensus(network)];
        junctions.extend(home.interior.as_slice().iter().cloned());
        let parents = if origin.is_relay() { 1 } else { 2 };

        return Location::from_junctions(parents, junctions).ok_or_else(|| {
            TransferError::configuration("Re-anchored location exceeds eight junctions")
        });
    }

    if origin.is_relay() {
        return Ok(Location::new(home.parents.saturating_sub(1), home.interior.clone()));
    }

    match (home.parents, home.first_interior(), origin.numeric_id) {
        (1, Some(Junction::Parachain(id)), Some(own)) if *id == own => {
            let rest = home.interior.as_slice()[1..].to_vec();
            Location::from_junctions(0, rest)
                .ok_or_else(|| TransferError::internal("Junction count overflow"))
        }
        _ => Ok(home.clone()),
    }
}

/// Picks the XCM extrinsic for an (origin, destination) pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtrinsicSelector {
    /// Always `limited_reserve_transfer_assets`
    #[default]
    ReserveTransfer,
    /// Teleport between a relay and its system chains, reserve transfer otherwise
    TeleportWithinSystem,
    /// Always the named extrinsic
    Fixed { name: String },
    /// Per-origin overrides with a fallback selector
    ByOrigin {
        overrides: HashMap<ChainId, String>,
        fallback: Box<ExtrinsicSelector>,
    },
}

impl ExtrinsicSelector {
    pub fn select(&self, origin: &Chain, destination: &Chain) -> String {
        match self {
            ExtrinsicSelector::ReserveTransfer => LIMITED_RESERVE_TRANSFER.to_string(),
            ExtrinsicSelector::TeleportWithinSystem => {
                let trusted = |c: &Chain| c.is_relay() || c.is_system_chain();
                if origin.same_network(destination) && trusted(origin) && trusted(destination) {
                    LIMITED_TELEPORT.to_string()
                } else {
                    LIMITED_RESERVE_TRANSFER.to_string()
                }
            }
            ExtrinsicSelector::Fixed { name } => name.clone(),
            ExtrinsicSelector::ByOrigin { overrides, fallback } => overrides
                .get(&origin.id)
                .cloned()
                .unwrap_or_else(|| fallback.select(origin, destination)),
        }
    }
}
