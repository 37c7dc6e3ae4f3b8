//! Balance & Existential-Deposit Resolver
//!
//! Maps a (token, chain) pair to the storage module holding its balances and
//! reads the spendable amount. One-shot reads and subscriptions share the
//! same query and decoding so they cannot drift apart.

use crate::chains::Chain;
use crate::client::TypedApi;
use crate::error::{TransferError, TransferResult};
use crate::tokens::{AssetId, BalanceModule, Token, TokenKind};
use crate::utils::{enum_tag, get_json_u128_or_zero, AccountId};
use crate::{log_debug, log_warn};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;

#[cfg(test)]
mod tests;

/// Override first, then assets for non-native tokens with an id, else system
pub fn resolve_balance_module(token: &Token, chain_id: &str) -> BalanceModule {
    if let Some(module) = token.balance_module_by_chain.get(chain_id) {
        return *module;
    }
    if !token.is_native() && token.asset_id(chain_id).is_some() {
        BalanceModule::Assets
    } else {
        BalanceModule::System
    }
}

/// Storage location of one account's balance
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceQuery {
    pub module: BalanceModule,
    pub pallet: &'static str,
    pub item: &'static str,
    pub keys: Vec<Value>,
}

impl BalanceQuery {
    pub fn new(token: &Token, chain_id: &str, address: &AccountId) -> TransferResult<Self> {
        let module = resolve_balance_module(token, chain_id);
        let account = json!(address.to_hex());

        let asset_key = || {
            token
                .asset_id(chain_id)
                .ok_or_else(|| TransferError::missing_asset_id(&token.symbol, chain_id))
        };

        let query = match module {
            BalanceModule::Assets => {
                let id = asset_key()?;
                Self {
                    module,
                    pallet: id.assets_pallet(),
                    item: "Account",
                    keys: vec![id.to_json(), account],
                }
            }
            BalanceModule::System => Self {
                module,
                pallet: "System",
                item: "Account",
                keys: vec![account],
            },
            BalanceModule::Balances => Self {
                module,
                pallet: "Balances",
                item: "Account",
                keys: vec![account],
            },
            BalanceModule::Tokens | BalanceModule::OrmlTokens => Self {
                module,
                pallet: if module == BalanceModule::Tokens { "Tokens" } else { "OrmlTokens" },
                item: "Accounts",
                keys: vec![account, asset_key()?.to_json()],
            },
        };
        Ok(query)
    }

    /// Spendable amount from the raw storage value
    pub fn spendable(&self, value: Option<&Value>) -> u128 {
        let Some(value) = value else {
            return 0;
        };

        match self.module {
            BalanceModule::Assets => {
                let liquid = value.get("status").and_then(enum_tag) == Some("Liquid");
                if liquid {
                    get_json_u128_or_zero(value, "balance")
                } else {
                    0
                }
            }
            BalanceModule::System => value.get("data").map(free_minus_frozen).unwrap_or(0),
            BalanceModule::Balances | BalanceModule::Tokens | BalanceModule::OrmlTokens => {
                free_minus_frozen(value)
            }
        }
    }
}

/// `free - frozen`, reading legacy `misc_frozen`/`fee_frozen` when present
fn free_minus_frozen(data: &Value) -> u128 {
    let free = get_json_u128_or_zero(data, "free");
    let frozen = match data.get("frozen") {
        Some(_) => get_json_u128_or_zero(data, "frozen"),
        None => get_json_u128_or_zero(data, "misc_frozen").max(get_json_u128_or_zero(data, "fee_frozen")),
    };
    free.saturating_sub(frozen)
}

/// Spendable balance of `address` for `token` on the API's chain
pub async fn get_token_balance(api: &dyn TypedApi, token: &Token, address: &AccountId) -> TransferResult<u128> {
    let query = BalanceQuery::new(token, api.chain_id(), address)?;
    let value = api.get_value(query.pallet, query.item, &query.keys).await?;
    let spendable = query.spendable(value.as_ref());
    log_debug!(
        "balances",
        "Balance read",
        chain = api.chain_id(),
        token = token.symbol,
        module = query.pallet,
        spendable = spendable,
    );
    Ok(spendable)
}

/// Live balance feed; stops on `unsubscribe` or when dropped
#[derive(Debug)]
pub struct BalanceSubscription {
    task: JoinHandle<()>,
}

impl BalanceSubscription {
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for BalanceSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Push every spendable-balance update to `on_change`
pub async fn subscribe_token_balance<F>(
    api: Arc<dyn TypedApi>,
    token: &Token,
    address: &AccountId,
    mut on_change: F,
) -> TransferResult<BalanceSubscription>
where
    F: FnMut(u128) + Send + 'static,
{
    let query = BalanceQuery::new(token, api.chain_id(), address)?;
    let mut updates = api.watch_value(query.pallet, query.item, &query.keys).await?;
    let chain_id = api.chain_id().to_string();
    let symbol = token.symbol.clone();

    let task = tokio::spawn(async move {
        while let Some(update) = updates.next().await {
            match update {
                Ok(value) => on_change(query.spendable(value.as_ref())),
                Err(e) => {
                    log_warn!("balances", "Balance feed failed", chain = chain_id, token = symbol, error = e);
                    break;
                }
            }
        }
    });

    Ok(BalanceSubscription { task })
}

/// Minimum balance keeping an account alive for `token` on `chain`
pub async fn get_existential_deposit(api: &dyn TypedApi, chain: &Chain, token: &Token) -> TransferResult<u128> {
    if token.is_native_on(chain) {
        let constant = api.constant("Balances", "ExistentialDeposit").await?;
        return Ok(constant.as_ref().and_then(crate::utils::as_u128).unwrap_or(0));
    }

    if token.kind == TokenKind::Custom {
        return Err(TransferError::unsupported_token_kind(&token.symbol, token.kind));
    }

    let id = token
        .asset_id(&chain.id)
        .ok_or_else(|| TransferError::missing_asset_id(&token.symbol, &chain.id))?;

    match resolve_balance_module(token, &chain.id) {
        BalanceModule::Tokens | BalanceModule::OrmlTokens => registry_existential_deposit(api, id).await,
        _ => {
            let pallet = id.assets_pallet();
            let details = api.get_value(pallet, "Asset", &[id.to_json()]).await?;
            Ok(details
                .as_ref()
                .map(|d| get_json_u128_or_zero(d, "min_balance"))
                .unwrap_or(0))
        }
    }
}

/// ORML chains keep the deposit in their asset registry
async fn registry_existential_deposit(api: &dyn TypedApi, id: &AssetId) -> TransferResult<u128> {
    if !api.has_pallet("AssetRegistry") {
        return Ok(0);
    }
    let details = api.get_value("AssetRegistry", "Assets", &[id.to_json()]).await?;
    Ok(details
        .as_ref()
        .map(|d| get_json_u128_or_zero(d, "existential_deposit"))
        .unwrap_or(0))
}
