//! Transfer direction classification

use crate::chains::{Chain, ChainType};
use crate::error::{TransferError, TransferResult};
use crate::xcm::destination_location;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a cross-chain transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    SystemToRelay,
    SystemToSystem,
    SystemToPara,
    SystemToBridge,
    RelayToSystem,
    RelayToPara,
    RelayToBridge,
    ParaToRelay,
    ParaToSystem,
    ParaToPara,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Destination class as seen from the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Relay,
    System,
    Para,
    Bridge,
}

/// Classify a transfer by origin type and destination type.
///
/// A destination whose location starts with `GlobalConsensus` is a bridge
/// target regardless of its own type.
pub fn establish_direction(origin: &Chain, destination: &Chain) -> TransferResult<Direction> {
    let target = if destination_location(origin, destination, None)?.targets_other_consensus() {
        Target::Bridge
    } else {
        match destination.chain_type {
            ChainType::Relay => Target::Relay,
            ChainType::System => Target::System,
            ChainType::Parachain => Target::Para,
        }
    };

    let direction = match (origin.chain_type, target) {
        (ChainType::System, Target::Relay) => Direction::SystemToRelay,
        (ChainType::System, Target::System) => Direction::SystemToSystem,
        (ChainType::System, Target::Para) => Direction::SystemToPara,
        (ChainType::System, Target::Bridge) => Direction::SystemToBridge,
        (ChainType::Relay, Target::System) => Direction::RelayToSystem,
        (ChainType::Relay, Target::Para) => Direction::RelayToPara,
        (ChainType::Relay, Target::Bridge) => Direction::RelayToBridge,
        (ChainType::Parachain, Target::Relay) => Direction::ParaToRelay,
        (ChainType::Parachain, Target::System) => Direction::ParaToSystem,
        (ChainType::Parachain, Target::Para) => Direction::ParaToPara,
        (ChainType::Relay, Target::Relay) | (ChainType::Parachain, Target::Bridge) => {
            return Err(TransferError::direction_undecidable(&origin.id, &destination.id));
        }
    };

    Ok(direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::ChainRegistry;
    use crate::error::ErrorCode;

    fn classify(origin: &str, destination: &str) -> TransferResult<Direction> {
        let chains = ChainRegistry::builtin();
        establish_direction(chains.get(origin).unwrap(), chains.get(destination).unwrap())
    }

    #[test]
    fn test_system_origin() {
        assert_eq!(classify("polkadot-asset-hub", "polkadot").unwrap(), Direction::SystemToRelay);
        assert_eq!(
            classify("polkadot-asset-hub", "polkadot-bridge-hub").unwrap(),
            Direction::SystemToSystem
        );
        assert_eq!(classify("polkadot-asset-hub", "hydration").unwrap(), Direction::SystemToPara);
        assert_eq!(
            classify("polkadot-asset-hub", "kusama-asset-hub").unwrap(),
            Direction::SystemToBridge
        );
    }

    #[test]
    fn test_relay_origin() {
        assert_eq!(classify("polkadot", "polkadot-asset-hub").unwrap(), Direction::RelayToSystem);
        assert_eq!(classify("polkadot", "hydration").unwrap(), Direction::RelayToPara);
        assert_eq!(classify("polkadot", "kusama-asset-hub").unwrap(), Direction::RelayToBridge);
    }

    #[test]
    fn test_para_origin() {
        assert_eq!(classify("hydration", "polkadot").unwrap(), Direction::ParaToRelay);
        assert_eq!(classify("hydration", "polkadot-asset-hub").unwrap(), Direction::ParaToSystem);
        assert_eq!(classify("hydration", "astar").unwrap(), Direction::ParaToPara);
    }

    #[test]
    fn test_undecidable_combinations() {
        let err = classify("polkadot", "polkadot").unwrap_err();
        assert_eq!(err.code, ErrorCode::DirectionUndecidable);

        let err = classify("hydration", "karura").unwrap_err();
        assert_eq!(err.code, ErrorCode::DirectionUndecidable);

        // relay to a foreign relay is a bridge transfer
        assert_eq!(classify("polkadot", "kusama").unwrap(), Direction::RelayToBridge);
    }
}
