//! Token and route tests

use super::*;
use crate::chains::ChainRegistry;
use crate::error::ErrorCode;
use crate::xcm::{Junction, Location, NetworkId};

fn usdt_junctions() -> Vec<Junction> {
    vec![
        Junction::Parachain(1000),
        Junction::PalletInstance(50),
        Junction::GeneralIndex(1984),
    ]
}

#[test]
fn test_pallet_asset_reanchoring() {
    let chains = ChainRegistry::builtin();
    let usdt = TokenRegistry::builtin().get("USDT").unwrap().clone();

    let from_hub = usdt.location_on(chains.get("polkadot-asset-hub").unwrap()).unwrap();
    assert_eq!(
        from_hub,
        Location::from_junctions(0, usdt_junctions()[1..].to_vec()).unwrap()
    );

    let from_relay = usdt.location_on(chains.get("polkadot").unwrap()).unwrap();
    assert_eq!(from_relay, Location::from_junctions(0, usdt_junctions()).unwrap());

    let from_sibling = usdt.location_on(chains.get("hydration").unwrap()).unwrap();
    assert_eq!(from_sibling, Location::from_junctions(1, usdt_junctions()).unwrap());
}

#[test]
fn test_relay_native_reanchoring() {
    let chains = ChainRegistry::builtin();
    let dot = TokenRegistry::builtin().get("DOT").unwrap().clone();

    assert_eq!(dot.location_on(chains.get("polkadot").unwrap()).unwrap(), Location::here());
    assert_eq!(
        dot.location_on(chains.get("polkadot-asset-hub").unwrap()).unwrap(),
        Location::parent()
    );

    let from_kusama_hub = dot.location_on(chains.get("kusama-asset-hub").unwrap()).unwrap();
    assert_eq!(
        from_kusama_hub,
        Location::from_junctions(2, vec![Junction::GlobalConsensus(NetworkId::Polkadot)]).unwrap()
    );
    assert!(from_kusama_hub.targets_other_consensus());

    let from_kusama = dot.location_on(chains.get("kusama").unwrap()).unwrap();
    assert_eq!(from_kusama.parents, 1);
}

#[test]
fn test_missing_route_is_configuration_error() {
    let chains = ChainRegistry::builtin();
    let mut custom = TokenRegistry::builtin().get("DOT").unwrap().clone();
    custom.route = None;

    let err = custom.location_on(chains.get("polkadot").unwrap()).unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingLocation);
    assert!(err.is_configuration());
}

#[test]
fn test_selector_teleport_within_system() {
    let chains = ChainRegistry::builtin();
    let dot = TokenRegistry::builtin().get("DOT").unwrap().clone();
    let relay = chains.get("polkadot").unwrap();
    let hub = chains.get("polkadot-asset-hub").unwrap();
    let bridge_hub = chains.get("polkadot-bridge-hub").unwrap();
    let hydration = chains.get("hydration").unwrap();

    assert_eq!(dot.selector.select(relay, hub), LIMITED_TELEPORT);
    assert_eq!(dot.selector.select(hub, relay), LIMITED_TELEPORT);
    assert_eq!(dot.selector.select(hub, bridge_hub), LIMITED_TELEPORT);
    assert_eq!(dot.selector.select(hub, hydration), LIMITED_RESERVE_TRANSFER);
    assert_eq!(dot.selector.select(hydration, relay), "XTokens.transfer_multiasset");
}

#[test]
fn test_asset_id_fallback() {
    let mut usdt = TokenRegistry::builtin().get("USDT").unwrap().clone();
    assert_eq!(usdt.asset_id("polkadot-asset-hub"), Some(&AssetId::Index(1984)));
    assert_eq!(usdt.asset_id("astar"), None);

    usdt.default_asset_id = Some(AssetId::Index(42));
    assert_eq!(usdt.asset_id("astar"), Some(&AssetId::Index(42)));
    assert_eq!(usdt.asset_id("hydration"), Some(&AssetId::Index(10)));
}

#[test]
fn test_registry_lookup_is_case_insensitive() {
    let tokens = TokenRegistry::builtin();
    assert_eq!(tokens.get("usdc").unwrap().symbol, "USDC");
    assert_eq!(tokens.get("BTC").unwrap_err().code, ErrorCode::InvalidInput);
}

#[test]
fn test_from_json() {
    let json = r#"[
        {
            "symbol": "ROC",
            "decimals": 12,
            "kind": "native",
            "network": "rococo",
            "route": { "type": "relay_native" },
            "selector": { "type": "teleport_within_system" }
        },
        {
            "symbol": "HDX",
            "decimals": 12,
            "kind": "foreign_asset",
            "network": "polkadot",
            "asset_id_by_chain": {
                "polkadot-asset-hub": {
                    "parents": 1,
                    "interior": { "type": "X1", "value": { "type": "Parachain", "value": 2034 } }
                }
            },
            "route": { "type": "parachain_native", "para_id": 2034 },
            "selector": {
                "type": "by_origin",
                "overrides": { "hydration": "XTokens.transfer" },
                "fallback": { "type": "reserve_transfer" }
            }
        }
    ]"#;

    let tokens = TokenRegistry::from_json(json).unwrap();
    assert_eq!(tokens.all().len(), 2);

    let hdx = tokens.get("HDX").unwrap();
    let id = hdx.asset_id("polkadot-asset-hub").unwrap();
    assert_eq!(id.assets_pallet(), "ForeignAssets");
    assert_eq!(
        id,
        &AssetId::Location(Location::from_junctions(1, vec![Junction::Parachain(2034)]).unwrap())
    );
}

#[test]
fn test_duplicate_symbols_rejected() {
    let dot = TokenRegistry::builtin().get("DOT").unwrap().clone();
    let err = TokenRegistry::new(vec![dot.clone(), dot]).unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigurationError);
}
