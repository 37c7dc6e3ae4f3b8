//! Chain registry tests

use super::*;
use crate::error::ErrorCode;
use crate::xcm::NetworkId;

#[test]
fn test_builtin_registry_is_valid() {
    let builtin = ChainRegistry::builtin();
    let rebuilt = ChainRegistry::new(builtin.all().to_vec(), false);
    assert!(rebuilt.is_ok());
}

#[test]
fn test_classification_predicates() {
    let registry = ChainRegistry::builtin();

    let polkadot = registry.get("polkadot").unwrap();
    assert!(polkadot.is_relay());
    assert!(!polkadot.is_system_chain());
    assert_eq!(polkadot.network(), "polkadot");

    let asset_hub = registry.get("polkadot-asset-hub").unwrap();
    assert!(asset_hub.is_system_chain());
    assert_eq!(asset_hub.numeric_id, Some(1000));
    assert_eq!(asset_hub.network(), "polkadot");

    let hydration = registry.get("hydration").unwrap();
    assert!(hydration.is_parachain());
    assert!(hydration.same_network(polkadot));
    assert!(!hydration.same_network(registry.get("kusama").unwrap()));
}

#[test]
fn test_get_chain_by_id_missing() {
    let registry = ChainRegistry::builtin();
    let err = registry.get("moonriver").unwrap_err();
    assert_eq!(err.code, ErrorCode::ChainNotFound);

    let err = get_chain_by_id("polkadot", &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::ChainNotFound);
}

#[test]
fn test_relay_with_numeric_id_rejected() {
    let mut polkadot = ChainRegistry::builtin().get("polkadot").unwrap().clone();
    polkadot.numeric_id = Some(0);
    let err = ChainRegistry::new(vec![polkadot], false).unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigurationError);
}

#[test]
fn test_parachain_without_relay_rejected() {
    let mut hydration = ChainRegistry::builtin().get("hydration").unwrap().clone();
    hydration.relay_id = None;
    assert!(hydration.validate().is_err());
}

#[test]
fn test_unknown_relay_reference_rejected() {
    let registry = ChainRegistry::builtin();
    let hydration = registry.get("hydration").unwrap().clone();
    let err = ChainRegistry::new(vec![hydration], false).unwrap_err();
    assert!(err.message.contains("unknown relay"));
}

#[test]
fn test_insecure_endpoint_rejected() {
    let mut westend = ChainRegistry::builtin().get("westend").unwrap().clone();
    westend.ws_endpoints = vec!["ws://westend.example.org".to_string()];

    assert!(ChainRegistry::new(vec![westend.clone()], false).is_err());
    assert!(ChainRegistry::new(vec![westend], true).is_ok());
}

#[test]
fn test_from_json() {
    let json = r#"[
        {
            "id": "rococo",
            "spec_name": "rococo",
            "name": "Rococo",
            "type": "relay",
            "ws_endpoints": ["wss://rococo-rpc.polkadot.io"],
            "native_token": "ROC"
        },
        {
            "id": "rococo-asset-hub",
            "spec_name": "rockmine",
            "name": "Rococo Asset Hub",
            "type": "system",
            "relay_id": "rococo",
            "numeric_id": 1000,
            "ws_endpoints": ["wss://rococo-asset-hub-rpc.polkadot.io"],
            "native_token": "ROC"
        }
    ]"#;

    let registry = ChainRegistry::from_json(json, false).unwrap();
    assert_eq!(registry.all().len(), 2);

    let hub = registry.get("rococo-asset-hub").unwrap();
    assert_eq!(hub.ss58_prefix, 42);
    assert_eq!(registry.relay_of(hub).unwrap().id, "rococo");
    assert_eq!(hub.network_id().unwrap(), NetworkId::Rococo);
}

#[test]
fn test_network_ids() {
    let registry = ChainRegistry::builtin();
    assert_eq!(
        registry.get("kusama-asset-hub").unwrap().network_id().unwrap(),
        NetworkId::Kusama
    );
    assert!(matches!(
        registry.get("paseo").unwrap().network_id().unwrap(),
        NetworkId::ByGenesis(_)
    ));
}

#[test]
fn test_spec_registry_lookup() {
    let specs = ChainSpecRegistry::builtin();
    assert!(specs.has_spec("polkadot"));
    assert!(specs.has_spec("polkadot-asset-hub"));
    assert!(!specs.has_spec("hydration"));
    assert_eq!(specs.well_known("kusama"), Some("ksmcc3"));
    assert_eq!(specs.well_known("polkadot-asset-hub"), None);
}

#[tokio::test]
async fn test_inline_spec_load() {
    let mut specs = ChainSpecRegistry::empty();
    specs.insert(
        "local",
        ChainSpecEntry {
            well_known: None,
            source: SpecSource::Inline("{\"name\":\"Local\"}".to_string()),
        },
    );

    let spec = specs.load("local").await.unwrap();
    assert_eq!(&*spec.raw, "{\"name\":\"Local\"}");

    let err = specs.load("missing").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigurationError);
}
