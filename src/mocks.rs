//! In-memory collaborators for tests and offline demos
//!
//! Every external seam of the engine (typed client, socket transport,
//! light-client discovery and engine, signer) has a mock here that records
//! how it was called.

use crate::chains::{Chain, ChainId, ChainSpec};
use crate::client::{
    Connection, DiscoveredProvider, ExternalLightClient, LightChain, LightClientEngine,
    NotificationStream, ProviderDiscovery, ProviderInfo, Signer, SocketTransport, StorageEntry,
    SubmittedTx, TypedApi, TypedClientFactory, ValueStream,
};
use crate::error::{TransferError, TransferResult};
use crate::utils::AccountId;
use crate::xcm::ExtrinsicCall;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Watchers = HashMap<String, Vec<mpsc::UnboundedSender<TransferResult<Option<Value>>>>>;

fn storage_key(pallet: &str, item: &str, keys: &[Value]) -> String {
    format!("{}.{}:{}", pallet, item, Value::Array(keys.to_vec()))
}

/// Typed client backed by in-memory storage
pub struct MockApi {
    chain_id: String,
    pallets: HashSet<String>,
    constants: HashMap<String, Value>,
    storage: Mutex<HashMap<String, Value>>,
    entries: HashMap<String, Vec<StorageEntry>>,
    watchers: Mutex<Watchers>,
    fee: u128,
    estimated: Mutex<Vec<ExtrinsicCall>>,
    submitted: Mutex<Vec<ExtrinsicCall>>,
    reads: AtomicUsize,
}

impl MockApi {
    pub fn new(chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            pallets: HashSet::new(),
            constants: HashMap::new(),
            storage: Mutex::new(HashMap::new()),
            entries: HashMap::new(),
            watchers: Mutex::new(HashMap::new()),
            fee: 0,
            estimated: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn with_pallet(mut self, pallet: &str) -> Self {
        self.pallets.insert(pallet.to_string());
        self
    }

    pub fn with_constant(mut self, pallet: &str, name: &str, value: Value) -> Self {
        self.pallets.insert(pallet.to_string());
        self.constants.insert(format!("{}.{}", pallet, name), value);
        self
    }

    pub fn with_value(self, pallet: &str, item: &str, keys: Vec<Value>, value: Value) -> Self {
        self.set_value(pallet, item, &keys, Some(value));
        self
    }

    pub fn with_entries(mut self, pallet: &str, item: &str, entries: Vec<StorageEntry>) -> Self {
        self.pallets.insert(pallet.to_string());
        self.entries.insert(format!("{}.{}", pallet, item), entries);
        self
    }

    pub fn with_fee(mut self, fee: u128) -> Self {
        self.fee = fee;
        self
    }

    /// Write a storage value and notify watchers
    pub fn set_value(&self, pallet: &str, item: &str, keys: &[Value], value: Option<Value>) {
        let key = storage_key(pallet, item, keys);
        if let Ok(mut storage) = self.storage.lock() {
            match &value {
                Some(v) => storage.insert(key.clone(), v.clone()),
                None => storage.remove(&key),
            };
        }
        if let Ok(mut watchers) = self.watchers.lock() {
            if let Some(senders) = watchers.get_mut(&key) {
                senders.retain(|tx| tx.unbounded_send(Ok(value.clone())).is_ok());
            }
        }
    }

    /// Fail every open watch on this item
    pub fn fail_watchers(&self, pallet: &str, item: &str, keys: &[Value]) {
        let key = storage_key(pallet, item, keys);
        if let Ok(mut watchers) = self.watchers.lock() {
            for tx in watchers.remove(&key).unwrap_or_default() {
                let _ = tx.unbounded_send(Err(TransferError::query_failed("watch failed")));
            }
        }
    }

    pub fn estimated_calls(&self) -> Vec<ExtrinsicCall> {
        self.estimated.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn submitted_calls(&self) -> Vec<ExtrinsicCall> {
        self.submitted.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn storage_reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TypedApi for MockApi {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn has_pallet(&self, pallet: &str) -> bool {
        self.pallets.contains(pallet)
    }

    async fn constant(&self, pallet: &str, name: &str) -> TransferResult<Option<Value>> {
        Ok(self.constants.get(&format!("{}.{}", pallet, name)).cloned())
    }

    async fn get_value(&self, pallet: &str, item: &str, keys: &[Value]) -> TransferResult<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let storage = self
            .storage
            .lock()
            .map_err(|_| TransferError::internal("mock storage poisoned"))?;
        Ok(storage.get(&storage_key(pallet, item, keys)).cloned())
    }

    async fn watch_value(&self, pallet: &str, item: &str, keys: &[Value]) -> TransferResult<ValueStream> {
        let key = storage_key(pallet, item, keys);
        let (tx, rx) = mpsc::unbounded();

        let current = self.get_value(pallet, item, keys).await?;
        let _ = tx.unbounded_send(Ok(current));

        self.watchers
            .lock()
            .map_err(|_| TransferError::internal("mock watchers poisoned"))?
            .entry(key)
            .or_default()
            .push(tx);

        Ok(rx.boxed())
    }

    async fn get_entries(&self, pallet: &str, item: &str) -> TransferResult<Vec<StorageEntry>> {
        Ok(self
            .entries
            .get(&format!("{}.{}", pallet, item))
            .cloned()
            .unwrap_or_default())
    }

    async fn estimate_fees(&self, call: &ExtrinsicCall, _from: &AccountId) -> TransferResult<u128> {
        if let Ok(mut estimated) = self.estimated.lock() {
            estimated.push(call.clone());
        }
        Ok(self.fee)
    }

    async fn sign_and_submit(&self, call: &ExtrinsicCall, signer: &dyn Signer) -> TransferResult<SubmittedTx> {
        let signature = signer.sign(call.name().as_bytes()).await?;
        let mut submitted = self
            .submitted
            .lock()
            .map_err(|_| TransferError::internal("mock submissions poisoned"))?;
        submitted.push(call.clone());
        Ok(SubmittedTx {
            tx_hash: format!("0x{}", hex::encode(&signature[..signature.len().min(32)])),
            block_hash: None,
            ok: true,
        })
    }
}

/// How a mock connection answers the new-heads subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadBehavior {
    /// Emit one header immediately
    Emit,
    /// Never emit
    Silent,
    /// End the stream without a header
    Close,
}

/// JSON-RPC connection answering from a fixed table
pub struct MockConnection {
    pub label: String,
    heads: HeadBehavior,
    responses: HashMap<String, Value>,
    requests: AtomicUsize,
}

impl MockConnection {
    pub fn new(label: &str, heads: HeadBehavior) -> Self {
        Self {
            label: label.to_string(),
            heads,
            responses: HashMap::new(),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn with_response(mut self, method: &str, result: Value) -> Self {
        self.responses.insert(method.to_string(), result);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn request(&self, method: &str, _params: Value) -> TransferResult<Value> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(method)
            .cloned()
            .ok_or_else(|| TransferError::query_failed(format!("Method {} not mocked", method)))
    }

    async fn subscribe(&self, _method: &str, _params: Value, _unsubscribe: &str) -> TransferResult<NotificationStream> {
        let stream = match self.heads {
            HeadBehavior::Emit => {
                futures::stream::iter(vec![Ok(json!({ "number": "0x1" }))]).chain(futures::stream::pending()).boxed()
            }
            HeadBehavior::Silent => futures::stream::pending().boxed(),
            HeadBehavior::Close => futures::stream::empty().boxed(),
        };
        Ok(stream)
    }
}

/// Socket transport counting dials
pub struct MockSocketTransport {
    connects: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
    heads: HeadBehavior,
    endpoints_seen: Mutex<Vec<Vec<String>>>,
}

impl MockSocketTransport {
    pub fn new() -> Self {
        Self {
            connects: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            delay: Duration::ZERO,
            heads: HeadBehavior::Emit,
            endpoints_seen: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `n` dials
    pub fn failing(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_heads(mut self, heads: HeadBehavior) -> Self {
        self.heads = heads;
        self
    }

    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn endpoints_seen(&self) -> Vec<Vec<String>> {
        self.endpoints_seen.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Default for MockSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketTransport for MockSocketTransport {
    async fn connect(&self, endpoints: &[String]) -> TransferResult<Arc<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.endpoints_seen.lock() {
            seen.push(endpoints.to_vec());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransferError::connection("mock dial failed"));
        }

        let label = endpoints.first().cloned().unwrap_or_default();
        Ok(Arc::new(MockConnection::new(&label, self.heads)))
    }
}

/// External light-client provider
pub struct MockProvider {
    pub name: String,
    well_known: Vec<String>,
    accepts_raw: bool,
    connects: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &str, well_known: &[&str], accepts_raw: bool) -> Self {
        Self {
            name: name.to_string(),
            well_known: well_known.iter().map(|s| s.to_string()).collect(),
            accepts_raw,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalLightClient for MockProvider {
    fn well_known_chains(&self) -> Vec<String> {
        self.well_known.clone()
    }

    fn accepts_raw_specs(&self) -> bool {
        self.accepts_raw
    }

    async fn connect(&self, spec: &ChainSpec, _relay: Option<&ChainSpec>) -> TransferResult<Arc<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockConnection::new(&spec.chain_id, HeadBehavior::Emit)))
    }
}

/// Discovery returning a fixed responder set
pub struct MockDiscovery {
    providers: Vec<Arc<MockProvider>>,
    rounds: AtomicUsize,
}

impl MockDiscovery {
    pub fn new(providers: Vec<Arc<MockProvider>>) -> Self {
        Self {
            providers,
            rounds: AtomicUsize::new(0),
        }
    }

    pub fn rounds(&self) -> usize {
        self.rounds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderDiscovery for MockDiscovery {
    async fn discover(&self, _window: Duration) -> Vec<DiscoveredProvider> {
        self.rounds.fetch_add(1, Ordering::SeqCst);
        self.providers
            .iter()
            .map(|p| DiscoveredProvider {
                kind: "mock".to_string(),
                info: ProviderInfo {
                    name: p.name.clone(),
                    version: None,
                },
                connector: p.clone() as Arc<dyn ExternalLightClient>,
            })
            .collect()
    }
}

/// Embedded light-client engine recording `add_chain` calls
pub struct MockEngine {
    next_handle: AtomicU64,
    added: Mutex<Vec<(ChainId, Vec<ChainId>)>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            added: Mutex::new(Vec::new()),
        }
    }

    /// `(chain, potential relays)` per `add_chain` call
    pub fn added_chains(&self) -> Vec<(ChainId, Vec<ChainId>)> {
        self.added.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LightClientEngine for MockEngine {
    async fn add_chain(&self, spec: &ChainSpec, potential_relay_chains: &[LightChain]) -> TransferResult<LightChain> {
        if let Ok(mut added) = self.added.lock() {
            added.push((
                spec.chain_id.clone(),
                potential_relay_chains.iter().map(|c| c.chain_id.clone()).collect(),
            ));
        }
        Ok(LightChain {
            chain_id: spec.chain_id.clone(),
            handle: self.next_handle.fetch_add(1, Ordering::SeqCst),
        })
    }

    fn to_provider(&self, chain: &LightChain) -> TransferResult<Arc<dyn Connection>> {
        Ok(Arc::new(MockConnection::new(&chain.chain_id, HeadBehavior::Emit)))
    }
}

/// Factory handing out pre-registered mock APIs
#[derive(Default)]
pub struct MockFactory {
    apis: HashMap<ChainId, Arc<MockApi>>,
    binds: AtomicUsize,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api(mut self, api: MockApi) -> Self {
        self.apis.insert(api.chain_id.clone(), Arc::new(api));
        self
    }

    pub fn api(&self, chain_id: &str) -> Option<Arc<MockApi>> {
        self.apis.get(chain_id).cloned()
    }

    pub fn bind_calls(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TypedClientFactory for MockFactory {
    async fn bind(&self, chain: &Chain, _connection: Arc<dyn Connection>) -> TransferResult<Arc<dyn TypedApi>> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        let api = self
            .apis
            .get(&chain.id)
            .cloned()
            .unwrap_or_else(|| Arc::new(MockApi::new(&chain.id)));
        Ok(api as Arc<dyn TypedApi>)
    }
}

/// Signer returning a deterministic signature
pub struct MockSigner {
    account: AccountId,
}

impl MockSigner {
    pub fn new(account: AccountId) -> Self {
        Self { account }
    }
}

#[async_trait]
impl Signer for MockSigner {
    fn account_id(&self) -> AccountId {
        self.account
    }

    async fn sign(&self, payload: &[u8]) -> TransferResult<Vec<u8>> {
        let mut signature = self.account.0.to_vec();
        signature.extend_from_slice(payload);
        Ok(signature)
    }
}
