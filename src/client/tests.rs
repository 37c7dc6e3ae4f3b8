//! Connection cascade and cache tests

use super::*;
use crate::chains::{ChainRegistry, ChainSpecEntry, ChainSpecRegistry, SpecSource};
use crate::config::TransferConfig;
use crate::error::ErrorCode;
use crate::mocks::{
    HeadBehavior, MockApi, MockDiscovery, MockEngine, MockFactory, MockProvider, MockSocketTransport,
};
use std::sync::Arc;
use std::time::Duration;

fn inline_specs(entries: &[(&str, Option<&str>)]) -> Arc<ChainSpecRegistry> {
    let mut specs = ChainSpecRegistry::empty();
    for (chain_id, well_known) in entries {
        specs.insert(
            *chain_id,
            ChainSpecEntry {
                well_known: well_known.map(str::to_string),
                source: SpecSource::Inline(format!("{{\"id\":\"{}\"}}", chain_id)),
            },
        );
    }
    Arc::new(specs)
}

fn fast_config() -> TransferConfig {
    TransferConfig {
        ready_timeout_ms: 100,
        discovery_window_ms: 10,
        ..TransferConfig::default()
    }
}

fn manager(socket: Arc<MockSocketTransport>) -> ClientManager {
    ClientManager::new(fast_config(), Arc::new(ChainSpecRegistry::empty()), socket)
}

#[tokio::test]
async fn test_concurrent_callers_share_one_connect() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new().with_delay(Duration::from_millis(50)));
    let manager = manager(socket.clone());

    let calls = (0..8).map(|_| manager.get_client("polkadot", chains.all(), false));
    let handles = futures::future::join_all(calls).await;

    assert_eq!(socket.connect_calls(), 1);
    let first = handles[0].as_ref().unwrap();
    for handle in &handles {
        assert!(Arc::ptr_eq(first, handle.as_ref().unwrap()));
    }
    assert_eq!(first.transport, TransportKind::Socket);
    assert_eq!(manager.cached_connections(), 1);
}

#[tokio::test]
async fn test_failed_connect_is_retried() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new().failing(1));
    let manager = manager(socket.clone());

    let err = manager.get_client("polkadot", chains.all(), false).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConnectionError);
    assert_eq!(manager.cached_connections(), 0);

    assert!(manager.get_client("polkadot", chains.all(), false).await.is_ok());
    assert_eq!(socket.connect_calls(), 2);
}

#[tokio::test]
async fn test_unknown_chain() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new());
    let err = manager(socket.clone())
        .get_client("moonbeam", chains.all(), false)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ChainNotFound);
    assert_eq!(socket.connect_calls(), 0);
}

#[tokio::test]
async fn test_keys_separate_light_preference() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new());
    let manager = manager(socket.clone());

    // no spec registered, so both keys fall back to the socket
    manager.get_client("hydration", chains.all(), false).await.unwrap();
    manager.get_client("hydration", chains.all(), true).await.unwrap();

    assert_eq!(socket.connect_calls(), 2);
    assert_eq!(socket.endpoints_seen()[0], chains.get("hydration").unwrap().ws_endpoints);
}

#[tokio::test]
async fn test_light_disabled_ignores_specs() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new());
    let engine = Arc::new(MockEngine::new());
    let manager = ClientManager::new(fast_config(), inline_specs(&[("polkadot", Some("polkadot"))]), socket.clone())
        .with_engine(engine.clone());

    let handle = manager.get_client("polkadot", chains.all(), false).await.unwrap();
    assert_eq!(handle.transport, TransportKind::Socket);
    assert!(engine.added_chains().is_empty());
}

#[tokio::test]
async fn test_external_provider_preferred() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new());
    let provider = Arc::new(MockProvider::new("extension", &["polkadot"], false));
    let discovery = Arc::new(MockDiscovery::new(vec![provider.clone()]));
    let engine = Arc::new(MockEngine::new());

    let manager = ClientManager::new(fast_config(), inline_specs(&[("polkadot", Some("polkadot"))]), socket.clone())
        .with_discovery(discovery.clone())
        .with_engine(engine.clone());

    let handle = manager.get_client("polkadot", chains.all(), true).await.unwrap();
    assert_eq!(handle.transport, TransportKind::ExternalProvider("extension".to_string()));
    assert_eq!(provider.connect_calls(), 1);
    assert_eq!(discovery.rounds(), 1);
    assert_eq!(socket.connect_calls(), 0);
    assert!(engine.added_chains().is_empty());
}

#[tokio::test]
async fn test_embedded_engine_loads_relay_first() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new());
    // only knows a chain we never ask for and takes no raw specs
    let provider = Arc::new(MockProvider::new("extension", &["ksmcc3"], false));
    let engine = Arc::new(MockEngine::new());

    let manager = ClientManager::new(
        fast_config(),
        inline_specs(&[("polkadot", Some("polkadot")), ("polkadot-asset-hub", None)]),
        socket.clone(),
    )
    .with_discovery(Arc::new(MockDiscovery::new(vec![provider.clone()])))
    .with_engine(engine.clone());

    let hub = manager.get_client("polkadot-asset-hub", chains.all(), true).await.unwrap();
    assert_eq!(hub.transport, TransportKind::EmbeddedLightClient);
    assert_eq!(
        engine.added_chains(),
        vec![
            ("polkadot".to_string(), vec![]),
            ("polkadot-asset-hub".to_string(), vec!["polkadot".to_string()]),
        ]
    );

    // the relay instance is reused
    let relay = manager.get_client("polkadot", chains.all(), true).await.unwrap();
    assert_eq!(relay.transport, TransportKind::EmbeddedLightClient);
    assert_eq!(engine.added_chains().len(), 2);
    assert_eq!(provider.connect_calls(), 0);
    assert_eq!(socket.connect_calls(), 0);
}

#[tokio::test]
async fn test_raw_spec_provider_accepts_any_chain() {
    let chains = ChainRegistry::builtin();
    let provider = Arc::new(MockProvider::new("raw", &[], true));
    let manager = ClientManager::new(
        fast_config(),
        inline_specs(&[("polkadot", Some("polkadot")), ("polkadot-asset-hub", None)]),
        Arc::new(MockSocketTransport::new()),
    )
    .with_discovery(Arc::new(MockDiscovery::new(vec![provider.clone()])));

    let hub = manager.get_client("polkadot-asset-hub", chains.all(), true).await.unwrap();
    assert_eq!(hub.transport, TransportKind::ExternalProvider("raw".to_string()));
}

#[tokio::test]
async fn test_missing_engine_is_connection_error() {
    let chains = ChainRegistry::builtin();
    let manager = ClientManager::new(
        fast_config(),
        inline_specs(&[("polkadot", Some("polkadot"))]),
        Arc::new(MockSocketTransport::new()),
    );

    let err = manager.get_client("polkadot", chains.all(), true).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConnectionError);
}

#[tokio::test]
async fn test_missing_relay_spec_is_connection_error() {
    let chains = ChainRegistry::builtin();
    let manager = ClientManager::new(
        fast_config(),
        inline_specs(&[("polkadot-asset-hub", None)]),
        Arc::new(MockSocketTransport::new()),
    )
    .with_engine(Arc::new(MockEngine::new()));

    let err = manager
        .get_client("polkadot-asset-hub", chains.all(), true)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ConnectionError);
    assert!(err.details.is_some());
}

#[tokio::test]
async fn test_readiness_outcomes() {
    let chains = ChainRegistry::builtin();

    let ready = manager(Arc::new(MockSocketTransport::new()))
        .get_client("polkadot", chains.all(), false)
        .await
        .unwrap();
    assert!(ready.ready().await.is_ok());

    let silent = manager(Arc::new(MockSocketTransport::new().with_heads(HeadBehavior::Silent)))
        .get_client("polkadot", chains.all(), false)
        .await
        .unwrap();
    assert_eq!(silent.ready().await.unwrap_err().code, ErrorCode::Timeout);

    let closed = manager(Arc::new(MockSocketTransport::new().with_heads(HeadBehavior::Close)))
        .get_client("polkadot", chains.all(), false)
        .await
        .unwrap();
    assert_eq!(closed.ready().await.unwrap_err().code, ErrorCode::ConnectionError);
}

#[tokio::test]
async fn test_api_cache_binds_once() {
    let chains = ChainRegistry::builtin();
    let factory = Arc::new(MockFactory::new().with_api(MockApi::new("polkadot").with_pallet("Balances")));
    let socket = Arc::new(MockSocketTransport::new());
    let cache = ApiCache::new(Arc::new(manager(socket.clone())), factory.clone());

    let first = cache.get_api("polkadot", chains.all(), true, false).await.unwrap();
    let second = cache.get_api("polkadot", chains.all(), true, false).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.api.has_pallet("Balances"));
    assert_eq!(factory.bind_calls(), 1);
    assert_eq!(socket.connect_calls(), 1);
}

#[tokio::test]
async fn test_api_cache_ready_gate() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new().with_heads(HeadBehavior::Silent));
    let cache = ApiCache::new(Arc::new(manager(socket)), Arc::new(MockFactory::new()));

    let handle = cache.get_api("westend", chains.all(), false, false).await.unwrap();
    assert_eq!(handle.api.chain_id(), "westend");

    let err = cache.get_api("westend", chains.all(), true, false).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Timeout);
}

#[tokio::test]
async fn test_unready_connection_is_redialed() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new().with_heads(HeadBehavior::Close));
    let manager = manager(socket.clone());

    let first = manager.get_client("polkadot", chains.all(), false).await.unwrap();
    assert_eq!(first.ready().await.unwrap_err().code, ErrorCode::ConnectionError);
    assert!(first.failed());

    let second = manager.get_client("polkadot", chains.all(), false).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(socket.connect_calls(), 2);
}

#[tokio::test]
async fn test_failed_readiness_frees_key_in_background() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new().with_heads(HeadBehavior::Close));
    let manager = manager(socket.clone());

    manager.get_client("polkadot", chains.all(), false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(manager.cached_connections(), 0);
}

#[tokio::test]
async fn test_api_cache_rebinds_after_failed_readiness() {
    let chains = ChainRegistry::builtin();
    let socket = Arc::new(MockSocketTransport::new().with_heads(HeadBehavior::Close));
    let factory = Arc::new(MockFactory::new());
    let cache = ApiCache::new(Arc::new(manager(socket.clone())), factory.clone());

    let err = cache.get_api("kusama", chains.all(), true, false).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConnectionError);

    let err = cache.get_api("kusama", chains.all(), true, false).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConnectionError);
    assert_eq!(socket.connect_calls(), 2);
    assert_eq!(factory.bind_calls(), 2);
}
