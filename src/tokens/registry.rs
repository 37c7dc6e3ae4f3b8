//! Token registry with built-in defaults

use super::route::{AssetRoute, ExtrinsicSelector};
use super::types::{AssetId, BalanceModule, Token, TokenKind};
use crate::error::{TransferError, TransferResult};
use std::collections::{HashMap, HashSet};

fn relay_token(symbol: &str, decimals: u8, network: &str, selector: ExtrinsicSelector) -> Token {
    Token {
        symbol: symbol.to_string(),
        decimals,
        kind: TokenKind::Native,
        is_sufficient: true,
        network: Some(network.to_string()),
        asset_id_by_chain: HashMap::new(),
        default_asset_id: None,
        balance_module_by_chain: HashMap::new(),
        route: Some(AssetRoute::RelayNative),
        selector,
    }
}

fn hub_asset(symbol: &str, decimals: u8, general_index: u32) -> Token {
    Token {
        symbol: symbol.to_string(),
        decimals,
        kind: TokenKind::Asset,
        is_sufficient: true,
        network: Some("polkadot".to_string()),
        asset_id_by_chain: HashMap::from([(
            "polkadot-asset-hub".to_string(),
            AssetId::Index(general_index),
        )]),
        default_asset_id: None,
        balance_module_by_chain: HashMap::new(),
        route: Some(AssetRoute::PalletAsset {
            para_id: 1000,
            pallet_instance: 50,
            general_index: general_index as u128,
        }),
        selector: ExtrinsicSelector::ReserveTransfer,
    }
}

fn xtokens_from(origins: &[&str], fallback: ExtrinsicSelector) -> ExtrinsicSelector {
    ExtrinsicSelector::ByOrigin {
        overrides: origins
            .iter()
            .map(|o| (o.to_string(), "XTokens.transfer_multiasset".to_string()))
            .collect(),
        fallback: Box::new(fallback),
    }
}

lazy_static::lazy_static! {
    static ref BUILTIN_TOKENS: Vec<Token> = {
        let mut dot = relay_token(
            "DOT",
            10,
            "polkadot",
            xtokens_from(&["hydration", "bifrost-polkadot"], ExtrinsicSelector::TeleportWithinSystem),
        );
        dot.asset_id_by_chain.insert("hydration".to_string(), AssetId::Index(5));
        dot.balance_module_by_chain.insert("hydration".to_string(), BalanceModule::Tokens);

        let ksm = relay_token(
            "KSM",
            12,
            "kusama",
            xtokens_from(&["karura"], ExtrinsicSelector::TeleportWithinSystem),
        );
        let wnd = relay_token("WND", 12, "westend", ExtrinsicSelector::TeleportWithinSystem);
        let pas = relay_token("PAS", 10, "paseo", ExtrinsicSelector::TeleportWithinSystem);

        let mut usdt = hub_asset("USDT", 6, 1984);
        usdt.asset_id_by_chain.insert("hydration".to_string(), AssetId::Index(10));
        usdt.balance_module_by_chain.insert("hydration".to_string(), BalanceModule::Tokens);
        usdt.selector = xtokens_from(&["hydration"], ExtrinsicSelector::ReserveTransfer);

        let mut usdc = hub_asset("USDC", 6, 1337);
        usdc.asset_id_by_chain.insert("hydration".to_string(), AssetId::Index(22));
        usdc.balance_module_by_chain.insert("hydration".to_string(), BalanceModule::Tokens);
        usdc.selector = xtokens_from(&["hydration"], ExtrinsicSelector::ReserveTransfer);

        vec![dot, ksm, wnd, pas, usdt, usdc]
    };
}

/// Immutable token table
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<Token>) -> TransferResult<Self> {
        let mut seen = HashSet::new();
        for token in &tokens {
            token.validate()?;
            if !seen.insert(token.symbol.clone()) {
                return Err(TransferError::configuration(format!(
                    "Duplicate token symbol '{}'",
                    token.symbol
                )));
            }
        }
        Ok(Self { tokens })
    }

    pub fn builtin() -> Self {
        Self {
            tokens: BUILTIN_TOKENS.clone(),
        }
    }

    /// Load a JSON array of tokens
    pub fn from_json(json: &str) -> TransferResult<Self> {
        let tokens: Vec<Token> = crate::utils::parse_json(json)?;
        Self::new(tokens)
    }

    pub fn get(&self, symbol: &str) -> TransferResult<&Token> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| TransferError::invalid_input(format!("Unknown token '{}'", symbol)))
    }

    pub fn all(&self) -> &[Token] {
        &self.tokens
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
