//! Generation-tagged fee quotes
//!
//! Quotes are not cancellable once started. Each request takes a new
//! generation and callers drop results whose generation is no longer current.

use super::conversion::{get_asset_convert_plancks, get_fee_asset_location, ConversionRequest};
use crate::chains::Chain;
use crate::client::TypedApi;
use crate::error::TransferResult;
use crate::tokens::Token;
use crate::utils::AccountId;
use crate::xcm::{ExtrinsicCall, Location};
use crate::log_debug;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fee of one call, in native plancks and in the chosen fee token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeQuote {
    pub generation: u64,
    pub native_fee: u128,
    /// `None` when the fee token has no quote
    pub fee_in_token: Option<u128>,
    /// `None` when fees are paid natively
    pub fee_asset: Option<Location>,
}

#[derive(Debug, Default)]
pub struct FeeQuoter {
    generation: AtomicU64,
}

impl FeeQuoter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier one
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, quote: &FeeQuote) -> bool {
        quote.generation == self.current_generation()
    }

    /// Estimate `call` for `from` and convert the fee into `fee_token`
    #[allow(clippy::too_many_arguments)]
    pub async fn quote(
        &self,
        api: &dyn TypedApi,
        chain: &Chain,
        call: &ExtrinsicCall,
        from: &AccountId,
        fee_token: &Token,
        native_token: &Token,
        pallet_id: &[u8; 8],
    ) -> TransferResult<FeeQuote> {
        let generation = self.next_generation();
        let native_fee = api.estimate_fees(call, from).await?;
        let fee_asset = get_fee_asset_location(fee_token, chain)?;

        let fee_in_token = match fee_asset {
            None => Some(native_fee),
            Some(_) => {
                let request = ConversionRequest {
                    plancks: native_fee,
                    token_in: native_token,
                    token_out: fee_token,
                    native_token,
                };
                get_asset_convert_plancks(api, chain, &request, pallet_id).await?
            }
        };

        log_debug!(
            "fees",
            "Fee quoted",
            chain = chain.id,
            call = call,
            native_fee = native_fee,
            fee_token = fee_token.symbol,
            generation = generation,
        );

        Ok(FeeQuote {
            generation,
            native_fee,
            fee_in_token,
            fee_asset,
        })
    }
}
