//! Client connection manager
//!
//! Connections are created lazily per `(chain id, light clients enabled)`
//! and shared by every caller. Concurrent callers for one key wait on the
//! same in-flight connect. A failed connect, or a connection whose readiness
//! fails, leaves the key empty so a later call starts the cascade again.

use super::transport::{
    Connection, LightChain, LightClientEngine, ProviderDiscovery, SocketTransport, TransportKind,
};
use crate::chains::{get_chain_by_id, Chain, ChainId, ChainSpec, ChainSpecRegistry};
use crate::config::TransferConfig;
use crate::error::{ErrorCode, TransferError, TransferResult};
use crate::{log_debug, log_info, log_warn};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Resolves once the first block header has been observed
pub type ReadyFuture = Shared<BoxFuture<'static, TransferResult<()>>>;

/// Cache key shared by connections and typed APIs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub chain_id: ChainId,
    pub light_clients_enabled: bool,
}

impl ClientKey {
    pub fn new(chain_id: &str, light_clients_enabled: bool) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            light_clients_enabled,
        }
    }
}

/// Shared live connection to one chain
pub struct ConnectionHandle {
    pub chain_id: ChainId,
    pub transport: TransportKind,
    connection: Arc<dyn Connection>,
    ready: ReadyFuture,
}

impl ConnectionHandle {
    pub fn new(chain_id: &str, transport: TransportKind, connection: Arc<dyn Connection>, ready: ReadyFuture) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            transport,
            connection,
            ready,
        }
    }

    pub fn connection(&self) -> Arc<dyn Connection> {
        self.connection.clone()
    }

    pub fn ready_future(&self) -> ReadyFuture {
        self.ready.clone()
    }

    /// Wait for the first observed block
    pub async fn ready(&self) -> TransferResult<()> {
        self.ready.clone().await
    }

    /// True once readiness has resolved to an error
    pub fn failed(&self) -> bool {
        ready_failed(&self.ready)
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("chain_id", &self.chain_id)
            .field("transport", &self.transport)
            .finish()
    }
}

pub(crate) fn ready_failed(ready: &ReadyFuture) -> bool {
    matches!(ready.peek(), Some(Err(_)))
}

/// Subscribe to new heads and resolve on the first one, bounded by `timeout`
pub fn readiness(connection: Arc<dyn Connection>, chain_id: &str, timeout: Duration) -> ReadyFuture {
    let chain_id = chain_id.to_string();
    let fut = async move {
        let mut heads = connection
            .subscribe(
                "chain_subscribeNewHeads",
                serde_json::json!([]),
                "chain_unsubscribeNewHeads",
            )
            .await?;

        match tokio::time::timeout(timeout, heads.next()).await {
            Ok(Some(Ok(_header))) => {
                log_debug!("client", "Chain ready", chain = chain_id);
                Ok(())
            }
            Ok(Some(Err(e))) => Err(e),
            Ok(None) => Err(TransferError::connection(format!(
                "Head subscription of {} closed before the first block",
                chain_id
            ))),
            Err(_) => Err(TransferError::timeout(format!(
                "No block observed on {} within {} ms",
                chain_id,
                timeout.as_millis()
            ))),
        }
    };
    fut.boxed().shared()
}

type ConnectionCell = Arc<OnceCell<Arc<ConnectionHandle>>>;
type ConnectionMap = Arc<Mutex<HashMap<ClientKey, ConnectionCell>>>;
type LightChainCell = Arc<OnceCell<LightChain>>;

/// Builds and caches chain connections
pub struct ClientManager {
    config: TransferConfig,
    specs: Arc<ChainSpecRegistry>,
    socket: Arc<dyn SocketTransport>,
    discovery: Option<Arc<dyn ProviderDiscovery>>,
    engine: Option<Arc<dyn LightClientEngine>>,
    connections: ConnectionMap,
    light_chains: Mutex<HashMap<ChainId, LightChainCell>>,
}

impl ClientManager {
    pub fn new(
        config: TransferConfig,
        specs: Arc<ChainSpecRegistry>,
        socket: Arc<dyn SocketTransport>,
    ) -> Self {
        Self {
            config,
            specs,
            socket,
            discovery: None,
            engine: None,
            connections: Arc::new(Mutex::new(HashMap::new())),
            light_chains: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn ProviderDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn LightClientEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Shared connection for `chain_id`, created on first use
    pub async fn get_client(
        &self,
        chain_id: &str,
        chains: &[Chain],
        light_clients_enabled: bool,
    ) -> TransferResult<Arc<ConnectionHandle>> {
        let chain = get_chain_by_id(chain_id, chains)?;
        let key = ClientKey::new(chain_id, light_clients_enabled);

        let mut cell = cell_for(&self.connections, key.clone())?;
        if let Some(handle) = cell.get() {
            if !handle.failed() {
                log_debug!("client", "Connection cache hit", chain = chain_id);
                return Ok(handle.clone());
            }
            log_debug!("client", "Dropping connection that never became ready", chain = chain_id);
            evict(&self.connections, &key, &cell)?;
            cell = cell_for(&self.connections, key.clone())?;
        }

        let handle = cell
            .get_or_try_init(|| async {
                let (transport, connection) = self
                    .connect(chain, chains, light_clients_enabled)
                    .await
                    .map_err(|e| as_connection_error(chain_id, e))?;

                let ready = readiness(connection.clone(), chain_id, self.config.ready_timeout());
                // drive readiness without waiting for a consumer; a failure frees the key
                let connections = self.connections.clone();
                let owner = cell.clone();
                let watched = ready.clone();
                let watched_chain = chain_id.to_string();
                tokio::spawn(async move {
                    if let Err(e) = watched.await {
                        log_warn!("client", "Chain never became ready", chain = watched_chain, error = e);
                        let _ = evict(&connections, &key, &owner);
                    }
                });

                Ok::<_, TransferError>(Arc::new(ConnectionHandle::new(
                    chain_id, transport, connection, ready,
                )))
            })
            .await
            .map_err(|e| {
                log_warn!("client", "Connection failed", chain = chain_id, error = e);
                e
            })?;

        Ok(handle.clone())
    }

    async fn connect(
        &self,
        chain: &Chain,
        chains: &[Chain],
        light_clients_enabled: bool,
    ) -> TransferResult<(TransportKind, Arc<dyn Connection>)> {
        if !light_clients_enabled || !self.specs.has_spec(&chain.id) {
            log_info!(
                "client",
                "Connecting over WebSocket",
                chain = chain.id,
                endpoints = chain.ws_endpoints.len(),
            );
            let connection = self.socket.connect(&chain.ws_endpoints).await?;
            return Ok((TransportKind::Socket, connection));
        }

        let spec = self.specs.load(&chain.id).await?;
        let relay_spec = if chain.is_relay() {
            None
        } else {
            let relay = get_chain_by_id(chain.network(), chains)?;
            Some(self.specs.load(&relay.id).await?)
        };

        if let Some(discovery) = &self.discovery {
            let providers = discovery.discover(self.config.discovery_window()).await;
            log_debug!("client", "Light-client discovery finished", responders = providers.len());

            if let Some(provider) = providers.iter().find(|p| p.connector.supports(&spec)) {
                log_info!(
                    "client",
                    "Delegating to external light client",
                    chain = chain.id,
                    provider = provider.info.name,
                );
                let connection = provider.connector.connect(&spec, relay_spec.as_ref()).await?;
                return Ok((TransportKind::ExternalProvider(provider.info.name.clone()), connection));
            }
        }

        let engine = self.engine.as_ref().ok_or_else(|| {
            TransferError::connection("No embedded light-client engine configured")
        })?;

        log_info!("client", "Starting embedded light client", chain = chain.id);
        let light_chain = match &relay_spec {
            None => self.light_chain(engine.as_ref(), &spec, &[]).await?,
            Some(relay_spec) => {
                let relay = self.light_chain(engine.as_ref(), relay_spec, &[]).await?;
                self.light_chain(engine.as_ref(), &spec, &[relay]).await?
            }
        };

        Ok((TransportKind::EmbeddedLightClient, engine.to_provider(&light_chain)?))
    }

    /// Memoized `add_chain`, so a syncing instance is reused
    async fn light_chain(
        &self,
        engine: &dyn LightClientEngine,
        spec: &ChainSpec,
        potential_relays: &[LightChain],
    ) -> TransferResult<LightChain> {
        let cell = cell_for(&self.light_chains, spec.chain_id.clone())?;
        let chain = cell
            .get_or_try_init(|| engine.add_chain(spec, potential_relays))
            .await?;
        Ok(chain.clone())
    }

    /// Number of cached connections
    pub fn cached_connections(&self) -> usize {
        self.connections
            .lock()
            .map(|map| map.values().filter(|cell| cell.initialized()).count())
            .unwrap_or(0)
    }
}

/// Get or insert the cell for `key` under the map lock
pub(crate) fn cell_for<K, V>(map: &Mutex<HashMap<K, Arc<OnceCell<V>>>>, key: K) -> TransferResult<Arc<OnceCell<V>>>
where
    K: std::hash::Hash + Eq,
{
    let mut map = map
        .lock()
        .map_err(|_| TransferError::internal("Client cache lock poisoned"))?;
    Ok(map.entry(key).or_insert_with(|| Arc::new(OnceCell::new())).clone())
}

/// Remove `key` if it still maps to `cell`
pub(crate) fn evict<K, V>(map: &Mutex<HashMap<K, Arc<OnceCell<V>>>>, key: &K, cell: &Arc<OnceCell<V>>) -> TransferResult<()>
where
    K: std::hash::Hash + Eq,
{
    let mut map = map
        .lock()
        .map_err(|_| TransferError::internal("Client cache lock poisoned"))?;
    if map.get(key).is_some_and(|current| Arc::ptr_eq(current, cell)) {
        map.remove(key);
    }
    Ok(())
}

fn as_connection_error(chain_id: &str, e: TransferError) -> TransferError {
    if e.code == ErrorCode::ConnectionError {
        e
    } else {
        TransferError::connection(format!("Failed to connect to {}", chain_id)).with_details(e.to_string())
    }
}
