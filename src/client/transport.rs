//! Transport seams
//!
//! A [`Connection`] speaks JSON-RPC to one chain. It is produced by one of
//! three transports: a persistent socket, an externally discovered light
//! client provider, or the embedded light-client engine.

use crate::chains::{ChainId, ChainSpec};
use crate::error::TransferResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Push notifications of one JSON-RPC subscription
pub type NotificationStream = BoxStream<'static, TransferResult<serde_json::Value>>;

/// JSON-RPC connection to a single chain
#[async_trait]
pub trait Connection: Send + Sync {
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> TransferResult<serde_json::Value>;

    /// Open a subscription; dropping the stream unsubscribes
    async fn subscribe(
        &self,
        method: &str,
        params: serde_json::Value,
        unsubscribe_method: &str,
    ) -> TransferResult<NotificationStream>;
}

/// Dials a chain over its ordered endpoint list
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self, endpoints: &[String]) -> TransferResult<Arc<dyn Connection>>;
}

/// How a connection was established
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TransportKind {
    Socket,
    ExternalProvider(String),
    EmbeddedLightClient,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Socket => write!(f, "socket"),
            TransportKind::ExternalProvider(name) => write!(f, "provider:{}", name),
            TransportKind::EmbeddedLightClient => write!(f, "embedded"),
        }
    }
}

/// Self-description of an external light-client provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Light client running outside this process (for example a browser extension)
#[async_trait]
pub trait ExternalLightClient: Send + Sync {
    /// Well-known chain names this provider already tracks
    fn well_known_chains(&self) -> Vec<String>;

    /// Whether raw chain specs can be handed over
    fn accepts_raw_specs(&self) -> bool;

    async fn connect(
        &self,
        spec: &ChainSpec,
        relay: Option<&ChainSpec>,
    ) -> TransferResult<Arc<dyn Connection>>;

    fn supports(&self, spec: &ChainSpec) -> bool {
        let by_name = spec
            .well_known
            .as_ref()
            .map(|name| self.well_known_chains().iter().any(|c| c == name))
            .unwrap_or(false);
        by_name || self.accepts_raw_specs()
    }
}

/// One responder of a discovery round
#[derive(Clone)]
pub struct DiscoveredProvider {
    pub kind: String,
    pub info: ProviderInfo,
    pub connector: Arc<dyn ExternalLightClient>,
}

impl fmt::Debug for DiscoveredProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredProvider")
            .field("kind", &self.kind)
            .field("info", &self.info)
            .finish()
    }
}

/// Announces a request and collects providers answering within `window`
#[async_trait]
pub trait ProviderDiscovery: Send + Sync {
    async fn discover(&self, window: Duration) -> Vec<DiscoveredProvider>;
}

/// Chain instance running inside the embedded light-client engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightChain {
    pub chain_id: ChainId,
    pub handle: u64,
}

/// Embedded light-client engine
#[async_trait]
pub trait LightClientEngine: Send + Sync {
    async fn add_chain(
        &self,
        spec: &ChainSpec,
        potential_relay_chains: &[LightChain],
    ) -> TransferResult<LightChain>;

    fn to_provider(&self, chain: &LightChain) -> TransferResult<Arc<dyn Connection>>;
}
