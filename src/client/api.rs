//! Typed chain client surface and the ready-gated API cache
//!
//! The typed client is generated from chain metadata elsewhere. Here it is
//! only an interface addressable by pallet and item name.

use super::manager::{cell_for, evict, ready_failed, ClientKey, ClientManager, ReadyFuture};
use super::transport::Connection;
use crate::chains::{get_chain_by_id, Chain, ChainId};
use crate::error::TransferResult;
use crate::utils::AccountId;
use crate::xcm::ExtrinsicCall;
use crate::log_debug;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Updates of a watched storage value; `None` when the item is empty
pub type ValueStream = BoxStream<'static, TransferResult<Option<Value>>>;

/// One entry of a storage map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub keys: Vec<Value>,
    pub value: Value,
}

/// Result of a dispatched extrinsic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTx {
    pub tx_hash: String,
    #[serde(default)]
    pub block_hash: Option<String>,
    pub ok: bool,
}

/// Signs on behalf of one account (wallet extension, keystore, ...)
#[async_trait]
pub trait Signer: Send + Sync {
    fn account_id(&self) -> AccountId;

    async fn sign(&self, payload: &[u8]) -> TransferResult<Vec<u8>>;
}

/// Metadata-driven typed client for one chain
#[async_trait]
pub trait TypedApi: Send + Sync {
    fn chain_id(&self) -> &str;

    /// Whether the runtime exposes `pallet`
    fn has_pallet(&self, pallet: &str) -> bool;

    async fn constant(&self, pallet: &str, name: &str) -> TransferResult<Option<Value>>;

    async fn get_value(&self, pallet: &str, item: &str, keys: &[Value]) -> TransferResult<Option<Value>>;

    async fn watch_value(&self, pallet: &str, item: &str, keys: &[Value]) -> TransferResult<ValueStream>;

    async fn get_entries(&self, pallet: &str, item: &str) -> TransferResult<Vec<StorageEntry>>;

    /// Partial fee in native plancks
    async fn estimate_fees(&self, call: &ExtrinsicCall, from: &AccountId) -> TransferResult<u128>;

    async fn sign_and_submit(&self, call: &ExtrinsicCall, signer: &dyn Signer) -> TransferResult<SubmittedTx>;
}

/// Binds a typed client to a live connection
#[async_trait]
pub trait TypedClientFactory: Send + Sync {
    async fn bind(&self, chain: &Chain, connection: Arc<dyn Connection>) -> TransferResult<Arc<dyn TypedApi>>;
}

/// Typed client plus the readiness of its connection
#[derive(Clone)]
pub struct ApiHandle {
    pub chain_id: ChainId,
    pub api: Arc<dyn TypedApi>,
    ready: ReadyFuture,
}

impl ApiHandle {
    pub fn new(chain_id: &str, api: Arc<dyn TypedApi>, ready: ReadyFuture) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            api,
            ready,
        }
    }

    pub async fn ready(&self) -> TransferResult<()> {
        self.ready.clone().await
    }

    /// True once readiness has resolved to an error
    pub fn failed(&self) -> bool {
        ready_failed(&self.ready)
    }
}

impl std::fmt::Debug for ApiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHandle").field("chain_id", &self.chain_id).finish()
    }
}

/// One typed API per connection key
pub struct ApiCache {
    clients: Arc<ClientManager>,
    factory: Arc<dyn TypedClientFactory>,
    apis: Mutex<HashMap<ClientKey, Arc<OnceCell<Arc<ApiHandle>>>>>,
}

impl ApiCache {
    pub fn new(clients: Arc<ClientManager>, factory: Arc<dyn TypedClientFactory>) -> Self {
        Self {
            clients,
            factory,
            apis: Mutex::new(HashMap::new()),
        }
    }

    pub fn clients(&self) -> &Arc<ClientManager> {
        &self.clients
    }

    /// Typed API for `chain_id`; with `wait_ready` the call returns only
    /// after the first block was observed
    pub async fn get_api(
        &self,
        chain_id: &str,
        chains: &[Chain],
        wait_ready: bool,
        light_clients_enabled: bool,
    ) -> TransferResult<Arc<ApiHandle>> {
        let chain = get_chain_by_id(chain_id, chains)?;
        let key = ClientKey::new(chain_id, light_clients_enabled);
        let mut cell = cell_for(&self.apis, key.clone())?;
        if cell.get().is_some_and(|handle| handle.failed()) {
            evict(&self.apis, &key, &cell)?;
            cell = cell_for(&self.apis, key)?;
        }

        let handle = cell
            .get_or_try_init(|| async {
                let client = self
                    .clients
                    .get_client(chain_id, chains, light_clients_enabled)
                    .await?;
                let api = self.factory.bind(chain, client.connection()).await?;
                log_debug!("client", "Typed API bound", chain = chain_id, transport = client.transport);
                Ok::<_, crate::error::TransferError>(Arc::new(ApiHandle::new(
                    chain_id,
                    api,
                    client.ready_future(),
                )))
            })
            .await?
            .clone();

        if wait_ready {
            handle.ready().await?;
        }
        Ok(handle)
    }
}
