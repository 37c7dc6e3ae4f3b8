//! Token descriptors

use super::route::{AssetRoute, ExtrinsicSelector};
use crate::chains::{Chain, ChainId};
use crate::error::{TransferError, TransferResult};
use crate::xcm::Location;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Native,
    Asset,
    ForeignAsset,
    Custom,
}

/// Storage module that holds a token's balances on a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceModule {
    Assets,
    System,
    Balances,
    Tokens,
    OrmlTokens,
}

/// Per-chain asset identifier: a numeric id or, for foreign assets, a location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetId {
    Index(u32),
    Location(Location),
}

impl AssetId {
    pub fn as_index(&self) -> Option<u32> {
        match self {
            AssetId::Index(id) => Some(*id),
            AssetId::Location(_) => None,
        }
    }

    /// Pallet that stores assets keyed by this kind of id
    pub fn assets_pallet(&self) -> &'static str {
        match self {
            AssetId::Index(_) => "Assets",
            AssetId::Location(_) => "ForeignAssets",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AssetId::Index(id) => serde_json::json!(id),
            AssetId::Location(loc) => serde_json::to_value(loc).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// A fungible token and how it is addressed on every chain it lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub decimals: u8,
    pub kind: TokenKind,
    #[serde(default)]
    pub is_sufficient: bool,
    /// Relay network whose consensus the token's reserve lives in
    #[serde(default)]
    pub network: Option<ChainId>,
    #[serde(default)]
    pub asset_id_by_chain: HashMap<ChainId, AssetId>,
    #[serde(default)]
    pub default_asset_id: Option<AssetId>,
    #[serde(default)]
    pub balance_module_by_chain: HashMap<ChainId, BalanceModule>,
    /// XCM route; required for cross-chain transfers
    #[serde(default)]
    pub route: Option<AssetRoute>,
    #[serde(default)]
    pub selector: ExtrinsicSelector,
}

impl Token {
    /// Asset id on a chain, falling back to the default id
    pub fn asset_id(&self, chain_id: &str) -> Option<&AssetId> {
        self.asset_id_by_chain
            .get(chain_id)
            .or(self.default_asset_id.as_ref())
    }

    pub fn is_native(&self) -> bool {
        self.kind == TokenKind::Native
    }

    /// Token is the fee-paying native token of `chain`
    pub fn is_native_on(&self, chain: &Chain) -> bool {
        chain.native_token == self.symbol
    }

    pub fn route(&self) -> TransferResult<&AssetRoute> {
        self.route
            .as_ref()
            .ok_or_else(|| TransferError::missing_location(&self.symbol))
    }

    /// Token location as seen from `chain`
    pub fn location_on(&self, chain: &Chain) -> TransferResult<Location> {
        let route = self.route()?;
        let network = self.network.as_deref().ok_or_else(|| {
            TransferError::configuration(format!("Token {} has a route but no network", self.symbol))
        })?;
        route.location_from(network, chain)
    }

    pub fn validate(&self) -> TransferResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(TransferError::configuration("Token symbol must not be empty"));
        }
        if self.route.is_some() && self.network.is_none() {
            return Err(TransferError::configuration(format!(
                "Token {} has a route but no network",
                self.symbol
            )));
        }
        Ok(())
    }
}
