//! Spot-price conversion through asset-conversion pools
//!
//! Every pool pairs two assets and is owned by an account derived from the
//! pair. Prices come from the owner's reserves. No swap fee or slippage is
//! modeled, so results are suitable for fee display and validation only.

use crate::balances::get_token_balance;
use crate::chains::Chain;
use crate::client::{StorageEntry, TypedApi};
use crate::error::TransferResult;
use crate::tokens::Token;
use crate::utils::{mul_div, AccountId};
use crate::xcm::Location;
use crate::log_debug;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use parity_scale_codec::Encode;
use serde_json::Value;

/// Inputs of a conversion quote
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    pub plancks: u128,
    pub token_in: &'a Token,
    pub token_out: &'a Token,
    /// Native token of the chain holding the pools
    pub native_token: &'a Token,
}

/// A pool pair and the account holding its reserves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityPool {
    pub asset1: Location,
    pub asset2: Location,
    pub owner: AccountId,
}

impl LiquidityPool {
    pub fn new(asset1: Location, asset2: Location, pallet_id: &[u8; 8]) -> Self {
        let owner = pool_account(pallet_id, &asset1, &asset2);
        Self { asset1, asset2, owner }
    }

    /// Whether the pool pairs `a` and `b`, in either order
    pub fn pairs(&self, a: &Location, b: &Location) -> bool {
        (&self.asset1 == a && &self.asset2 == b) || (&self.asset1 == b && &self.asset2 == a)
    }
}

/// `blake2_256(SCALE((pallet_id, (asset1, asset2))))`
pub fn pool_account(pallet_id: &[u8; 8], asset1: &Location, asset2: &Location) -> AccountId {
    let encoded = (pallet_id, (asset1, asset2)).encode();
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(&encoded);

    let mut account = [0u8; 32];
    account.copy_from_slice(&hasher.finalize());
    AccountId(account)
}

/// Enumerate the chain's pools; entries that do not decode are skipped
pub async fn list_pools(api: &dyn TypedApi, pallet_id: &[u8; 8]) -> TransferResult<Vec<LiquidityPool>> {
    if !api.has_pallet("AssetConversion") {
        return Ok(Vec::new());
    }

    let entries = api.get_entries("AssetConversion", "Pools").await?;
    let pools: Vec<LiquidityPool> = entries
        .iter()
        .filter_map(pool_pair)
        .map(|(a, b)| LiquidityPool::new(a, b, pallet_id))
        .collect();

    log_debug!("fees", "Pools enumerated", chain = api.chain_id(), pools = pools.len());
    Ok(pools)
}

/// Pool key is either one tuple key `[[a, b]]` or two keys `[a, b]`
fn pool_pair(entry: &StorageEntry) -> Option<(Location, Location)> {
    let pair: &[Value] = match entry.keys.as_slice() {
        [Value::Array(tuple)] => tuple.as_slice(),
        keys => keys,
    };
    match pair {
        [a, b] => Some((
            serde_json::from_value(a.clone()).ok()?,
            serde_json::from_value(b.clone()).ok()?,
        )),
        _ => None,
    }
}

/// Reserves `[native, other]` of the pool pairing `token` with native,
/// `[1, 1]` when `token` is native, `None` when no pool exists
async fn native_pair_reserves(
    api: &dyn TypedApi,
    pools: &[LiquidityPool],
    native_token: &Token,
    native_location: &Location,
    token: &Token,
    token_location: &Location,
) -> TransferResult<Option<(u128, u128)>> {
    if token_location == native_location {
        return Ok(Some((1, 1)));
    }

    let Some(pool) = pools.iter().find(|p| p.pairs(native_location, token_location)) else {
        return Ok(None);
    };

    let native = get_token_balance(api, native_token, &pool.owner).await?;
    let other = get_token_balance(api, token, &pool.owner).await?;
    Ok(Some((native, other)))
}

/// Quote `plancks` of `token_in` in `token_out`, routing through native.
///
/// `Ok(None)` means no quote: a pool is missing or a reserve is empty.
pub async fn get_asset_convert_plancks(
    api: &dyn TypedApi,
    chain: &Chain,
    request: &ConversionRequest<'_>,
    pallet_id: &[u8; 8],
) -> TransferResult<Option<u128>> {
    let ConversionRequest {
        plancks,
        token_in,
        token_out,
        native_token,
    } = *request;

    let location_in = token_in.location_on(chain)?;
    let location_out = token_out.location_on(chain)?;
    if location_in == location_out {
        return Ok(Some(plancks));
    }

    let native_location = native_token.location_on(chain)?;
    let pools = list_pools(api, pallet_id).await?;

    let reserves_in =
        native_pair_reserves(api, &pools, native_token, &native_location, token_in, &location_in).await?;
    let reserves_out =
        native_pair_reserves(api, &pools, native_token, &native_location, token_out, &location_out).await?;

    let (Some((native_in, other_in)), Some((native_out, other_out))) = (reserves_in, reserves_out) else {
        log_debug!("fees", "No pool for conversion", token_in = token_in.symbol, token_out = token_out.symbol);
        return Ok(None);
    };
    if [native_in, other_in, native_out, other_out].contains(&0) {
        log_debug!("fees", "Empty pool reserve", token_in = token_in.symbol, token_out = token_out.symbol);
        return Ok(None);
    }

    let converted = if location_in == native_location {
        mul_div(plancks, other_out, native_out)
    } else {
        mul_div(plancks, native_in, other_in).and_then(|native| mul_div(native, other_out, native_out))
    };
    Ok(converted)
}

/// Location to pay fees with, `None` for the chain's native token
pub fn get_fee_asset_location(token: &Token, chain: &Chain) -> TransferResult<Option<Location>> {
    if token.is_native_on(chain) {
        return Ok(None);
    }
    token.location_on(chain).map(Some)
}
