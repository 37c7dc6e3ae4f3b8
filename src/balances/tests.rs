//! Balance resolver tests

use super::*;
use crate::chains::ChainRegistry;
use crate::error::ErrorCode;
use crate::mocks::MockApi;
use crate::tokens::TokenRegistry;
use std::time::Duration;

fn alice() -> AccountId {
    AccountId::parse("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY").unwrap()
}

fn token(symbol: &str) -> Token {
    TokenRegistry::builtin().get(symbol).unwrap().clone()
}

#[test]
fn test_resolve_balance_module() {
    assert_eq!(resolve_balance_module(&token("DOT"), "polkadot"), BalanceModule::System);
    assert_eq!(resolve_balance_module(&token("DOT"), "hydration"), BalanceModule::Tokens);
    assert_eq!(resolve_balance_module(&token("USDT"), "polkadot-asset-hub"), BalanceModule::Assets);
    assert_eq!(resolve_balance_module(&token("USDT"), "polkadot"), BalanceModule::System);
}

#[test]
fn test_query_layout() {
    let account = json!(alice().to_hex());

    let hub = BalanceQuery::new(&token("USDT"), "polkadot-asset-hub", &alice()).unwrap();
    assert_eq!((hub.pallet, hub.item), ("Assets", "Account"));
    assert_eq!(hub.keys, vec![json!(1984), account.clone()]);

    let orml = BalanceQuery::new(&token("USDT"), "hydration", &alice()).unwrap();
    assert_eq!((orml.pallet, orml.item), ("Tokens", "Accounts"));
    assert_eq!(orml.keys, vec![account.clone(), json!(10)]);

    let system = BalanceQuery::new(&token("DOT"), "polkadot", &alice()).unwrap();
    assert_eq!(system.keys, vec![account]);
}

#[test]
fn test_spendable_system() {
    let query = BalanceQuery::new(&token("DOT"), "polkadot", &alice()).unwrap();

    let value = json!({ "nonce": 3, "data": { "free": "7000", "reserved": 0, "frozen": 2000 } });
    assert_eq!(query.spendable(Some(&value)), 5000);

    let legacy = json!({ "data": { "free": 7000, "misc_frozen": 1000, "fee_frozen": 1500 } });
    assert_eq!(query.spendable(Some(&legacy)), 5500);

    let over_frozen = json!({ "data": { "free": 100, "frozen": 200 } });
    assert_eq!(query.spendable(Some(&over_frozen)), 0);

    assert_eq!(query.spendable(None), 0);
}

#[test]
fn test_spendable_assets_status() {
    let query = BalanceQuery::new(&token("USDT"), "polkadot-asset-hub", &alice()).unwrap();

    let liquid = json!({ "balance": 1500, "status": { "type": "Liquid" } });
    assert_eq!(query.spendable(Some(&liquid)), 1500);

    let frozen = json!({ "balance": 1500, "status": "Frozen" });
    assert_eq!(query.spendable(Some(&frozen)), 0);
}

#[tokio::test]
async fn test_get_token_balance() {
    let dot = token("DOT");
    let query = BalanceQuery::new(&dot, "polkadot", &alice()).unwrap();
    let api = MockApi::new("polkadot").with_value(
        query.pallet,
        query.item,
        query.keys.clone(),
        json!({ "data": { "free": 7000, "frozen": 2000 } }),
    );

    assert_eq!(get_token_balance(&api, &dot, &alice()).await.unwrap(), 5000);

    let empty = MockApi::new("polkadot");
    assert_eq!(get_token_balance(&empty, &dot, &alice()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_balance_without_asset_id() {
    let api = MockApi::new("westend-asset-hub");
    let mut usdt = token("USDT");
    usdt.balance_module_by_chain
        .insert("westend-asset-hub".to_string(), BalanceModule::Assets);

    let err = get_token_balance(&api, &usdt, &alice()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingAssetId);
}

#[tokio::test]
async fn test_existential_deposit_native() {
    let chains = ChainRegistry::builtin();
    let polkadot = chains.get("polkadot").unwrap();

    let api = MockApi::new("polkadot").with_constant("Balances", "ExistentialDeposit", json!("10000000000"));
    assert_eq!(
        get_existential_deposit(&api, polkadot, &token("DOT")).await.unwrap(),
        10_000_000_000
    );

    let bare = MockApi::new("polkadot");
    assert_eq!(get_existential_deposit(&bare, polkadot, &token("DOT")).await.unwrap(), 0);
}

#[tokio::test]
async fn test_existential_deposit_assets() {
    let chains = ChainRegistry::builtin();
    let hub = chains.get("polkadot-asset-hub").unwrap();
    let api = MockApi::new("polkadot-asset-hub").with_value(
        "Assets",
        "Asset",
        vec![json!(1984)],
        json!({ "owner": "0x00", "min_balance": 700, "is_sufficient": true }),
    );

    assert_eq!(get_existential_deposit(&api, hub, &token("USDT")).await.unwrap(), 700);

    let err = get_existential_deposit(&api, chains.get("westend-asset-hub").unwrap(), &token("USDT"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingAssetId);

    let mut custom = token("USDT");
    custom.kind = TokenKind::Custom;
    let err = get_existential_deposit(&api, hub, &custom).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedTokenKind);
}

#[tokio::test]
async fn test_existential_deposit_foreign_asset() {
    let chains = ChainRegistry::builtin();
    let hub = chains.get("polkadot-asset-hub").unwrap();
    let location = crate::xcm::Location::from_junctions(
        1,
        vec![crate::xcm::Junction::Parachain(2034), crate::xcm::Junction::GeneralIndex(0)],
    )
    .unwrap();

    let mut foreign = token("USDT");
    foreign.symbol = "HDX".to_string();
    foreign.kind = TokenKind::ForeignAsset;
    foreign
        .asset_id_by_chain
        .insert("polkadot-asset-hub".to_string(), crate::tokens::AssetId::Location(location.clone()));

    let api = MockApi::new("polkadot-asset-hub").with_value(
        "ForeignAssets",
        "Asset",
        vec![serde_json::to_value(&location).unwrap()],
        json!({ "min_balance": "1234", "is_sufficient": false }),
    );
    assert_eq!(get_existential_deposit(&api, hub, &foreign).await.unwrap(), 1234);

    // the plain Assets pallet is never consulted for a location id
    let wrong_pallet = MockApi::new("polkadot-asset-hub").with_value(
        "Assets",
        "Asset",
        vec![serde_json::to_value(&location).unwrap()],
        json!({ "min_balance": 99 }),
    );
    assert_eq!(get_existential_deposit(&wrong_pallet, hub, &foreign).await.unwrap(), 0);
}

#[tokio::test]
async fn test_existential_deposit_orml() {
    let chains = ChainRegistry::builtin();
    let hydration = chains.get("hydration").unwrap();

    let api = MockApi::new("hydration")
        .with_pallet("AssetRegistry")
        .with_value(
            "AssetRegistry",
            "Assets",
            vec![json!(10)],
            json!({ "name": "USDT", "existential_deposit": 10_000 }),
        );
    assert_eq!(get_existential_deposit(&api, hydration, &token("USDT")).await.unwrap(), 10_000);

    let without_registry = MockApi::new("hydration");
    assert_eq!(
        get_existential_deposit(&without_registry, hydration, &token("USDT")).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_subscribe_token_balance() {
    let dot = token("DOT");
    let query = BalanceQuery::new(&dot, "polkadot", &alice()).unwrap();
    let mock = Arc::new(MockApi::new("polkadot").with_value(
        query.pallet,
        query.item,
        query.keys.clone(),
        json!({ "data": { "free": 100, "frozen": 0 } }),
    ));
    let api: Arc<dyn TypedApi> = mock.clone();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let subscription = subscribe_token_balance(api, &dot, &alice(), move |spendable| {
        let _ = tx.send(spendable);
    })
    .await
    .unwrap();

    assert_eq!(rx.recv().await, Some(100));

    mock.set_value(
        query.pallet,
        query.item,
        &query.keys,
        Some(json!({ "data": { "free": 300, "frozen": 50 } })),
    );
    assert_eq!(rx.recv().await, Some(250));

    mock.set_value(query.pallet, query.item, &query.keys, None);
    assert_eq!(rx.recv().await, Some(0));

    assert!(subscription.is_active());
    subscription.unsubscribe();
    // the callback (and its sender) is dropped with the aborted task
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn test_subscription_stops_on_feed_error() {
    let dot = token("DOT");
    let query = BalanceQuery::new(&dot, "polkadot", &alice()).unwrap();
    let mock = Arc::new(MockApi::new("polkadot"));
    let api: Arc<dyn TypedApi> = mock.clone();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let subscription = subscribe_token_balance(api, &dot, &alice(), move |spendable| {
        let _ = tx.send(spendable);
    })
    .await
    .unwrap();
    assert_eq!(rx.recv().await, Some(0));

    mock.fail_watchers(query.pallet, query.item, &query.keys);
    assert_eq!(rx.recv().await, None);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!subscription.is_active());
}
