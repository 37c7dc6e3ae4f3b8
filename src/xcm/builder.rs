//! XCM argument builder and extrinsic dispatcher

use super::assets::{MultiAddress, VersionedAsset, VersionedAssets, WeightLimit};
use super::location::{Junction, Location, VersionedLocation};
use crate::balances::resolve_balance_module;
use crate::chains::Chain;
use crate::client::TypedApi;
use crate::direction::Direction;
use crate::error::{TransferError, TransferResult};
use crate::tokens::{AssetId, BalanceModule, Token};
use crate::utils::AccountId;
use crate::log_info;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// `parents` of a destination location seen from `origin`
pub fn xcm_parents(origin: &Chain, destination: &Chain) -> u8 {
    let from_para = u8::from(!origin.is_relay());
    let cross_network = u8::from(!origin.same_network(destination));
    from_para + cross_network
}

/// Destination location, optionally carrying the beneficiary account
pub fn destination_location(
    origin: &Chain,
    destination: &Chain,
    beneficiary: Option<&AccountId>,
) -> TransferResult<Location> {
    let mut junctions = Vec::with_capacity(3);

    if !origin.same_network(destination) {
        junctions.push(Junction::GlobalConsensus(destination.network_id()?));
    }
    if !destination.is_relay() {
        junctions.push(Junction::Parachain(destination.para_id()?));
    }
    if let Some(account) = beneficiary {
        junctions.push(account_junction(account));
    }

    Location::from_junctions(xcm_parents(origin, destination), junctions)
        .ok_or_else(|| TransferError::internal("Destination exceeds eight junctions"))
}

/// `parents: 0, X1(AccountId32)`
pub fn beneficiary_location(recipient: &AccountId) -> Location {
    Location::from_junctions(0, vec![account_junction(recipient)]).unwrap_or_default()
}

fn account_junction(account: &AccountId) -> Junction {
    Junction::AccountId32 {
        network: None,
        id: account.0,
    }
}

/// Supported XCM transfer extrinsics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XcmExtrinsic {
    LimitedReserveTransferAssets,
    ReserveTransferAssets,
    LimitedTeleportAssets,
    TeleportAssets,
    TransferAssets,
    XTokensTransferMultiasset,
    XTokensTransfer,
}

impl XcmExtrinsic {
    pub fn call_name(&self) -> &'static str {
        match self {
            XcmExtrinsic::LimitedReserveTransferAssets => "limited_reserve_transfer_assets",
            XcmExtrinsic::ReserveTransferAssets => "reserve_transfer_assets",
            XcmExtrinsic::LimitedTeleportAssets => "limited_teleport_assets",
            XcmExtrinsic::TeleportAssets => "teleport_assets",
            XcmExtrinsic::TransferAssets => "transfer_assets",
            XcmExtrinsic::XTokensTransferMultiasset => "transfer_multiasset",
            XcmExtrinsic::XTokensTransfer => "transfer",
        }
    }

    pub fn is_xtokens(&self) -> bool {
        matches!(
            self,
            XcmExtrinsic::XTokensTransferMultiasset | XcmExtrinsic::XTokensTransfer
        )
    }

    /// Pallet dispatching this extrinsic from `origin`
    pub fn pallet(&self, origin: &Chain) -> &'static str {
        if self.is_xtokens() {
            "XTokens"
        } else if origin.is_relay() {
            "XcmPallet"
        } else {
            "PolkadotXcm"
        }
    }
}

impl FromStr for XcmExtrinsic {
    type Err = TransferError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let bare = name
            .strip_prefix("XcmPallet.")
            .or_else(|| name.strip_prefix("PolkadotXcm."))
            .unwrap_or(name);

        match bare {
            "limited_reserve_transfer_assets" => Ok(XcmExtrinsic::LimitedReserveTransferAssets),
            "reserve_transfer_assets" => Ok(XcmExtrinsic::ReserveTransferAssets),
            "limited_teleport_assets" => Ok(XcmExtrinsic::LimitedTeleportAssets),
            "teleport_assets" => Ok(XcmExtrinsic::TeleportAssets),
            "transfer_asset" | "transfer_assets" => Ok(XcmExtrinsic::TransferAssets),
            "XTokens.transfer_multiasset" => Ok(XcmExtrinsic::XTokensTransferMultiasset),
            "XTokens.transfer" => Ok(XcmExtrinsic::XTokensTransfer),
            _ => Err(TransferError::unsupported_extrinsic(name)),
        }
    }
}

/// Call arguments, serialized as the typed client expects them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallArgs {
    XcmPallet {
        dest: VersionedLocation,
        assets: VersionedAssets,
        beneficiary: VersionedLocation,
        fee_asset_item: u32,
        weight_limit: WeightLimit,
    },
    XTokensMultiasset {
        asset: VersionedAsset,
        dest: VersionedLocation,
        dest_weight_limit: WeightLimit,
    },
    XTokensTransfer {
        currency_id: u32,
        amount: u128,
        dest: VersionedLocation,
        dest_weight_limit: WeightLimit,
    },
    BalancesTransfer {
        dest: MultiAddress,
        value: u128,
    },
    AssetsTransfer {
        id: AssetId,
        target: MultiAddress,
        amount: u128,
    },
    TokensTransfer {
        dest: MultiAddress,
        currency_id: u32,
        amount: u128,
    },
}

/// A fully assembled call, ready for fee estimation or submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtrinsicCall {
    pub pallet: String,
    pub call: String,
    pub args: CallArgs,
}

impl ExtrinsicCall {
    fn new(pallet: &str, call: &str, args: CallArgs) -> Self {
        Self {
            pallet: pallet.to_string(),
            call: call.to_string(),
            args,
        }
    }

    pub fn name(&self) -> String {
        format!("{}.{}", self.pallet, self.call)
    }
}

impl fmt::Display for ExtrinsicCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pallet, self.call)
    }
}

/// Inputs of an XCM transfer
#[derive(Debug, Clone, Copy)]
pub struct XcmTransferParams<'a> {
    pub direction: Direction,
    pub origin: &'a Chain,
    pub destination: &'a Chain,
    pub token: &'a Token,
    pub recipient: &'a AccountId,
    pub plancks: u128,
}

/// Build the cross-chain transfer call for an already classified direction
pub fn xcm_transfer_extrinsic(params: &XcmTransferParams<'_>) -> TransferResult<ExtrinsicCall> {
    let XcmTransferParams {
        direction,
        origin,
        destination,
        token,
        recipient,
        plancks,
    } = *params;

    let route = token.route()?;
    let home_network = token.network.as_deref().ok_or_else(|| {
        TransferError::configuration(format!("Token {} has a route but no network", token.symbol))
    })?;
    let asset = route.asset(plancks, home_network, origin)?;

    let selected = token.selector.select(origin, destination);
    let extrinsic: XcmExtrinsic = selected
        .parse()
        .map_err(|e: TransferError| e.with_details(format!("token {}", token.symbol)))?;
    let pallet = extrinsic.pallet(origin);

    let args = match extrinsic {
        XcmExtrinsic::XTokensTransferMultiasset => CallArgs::XTokensMultiasset {
            asset: asset.into(),
            dest: destination_location(origin, destination, Some(recipient))?.versioned(),
            dest_weight_limit: WeightLimit::Unlimited,
        },
        XcmExtrinsic::XTokensTransfer => {
            let currency_id = token
                .asset_id(&origin.id)
                .and_then(AssetId::as_index)
                .ok_or_else(|| TransferError::missing_asset_id(&token.symbol, &origin.id))?;
            CallArgs::XTokensTransfer {
                currency_id,
                amount: plancks,
                dest: destination_location(origin, destination, Some(recipient))?.versioned(),
                dest_weight_limit: WeightLimit::Unlimited,
            }
        }
        _ => CallArgs::XcmPallet {
            dest: destination_location(origin, destination, None)?.versioned(),
            assets: asset.into(),
            beneficiary: beneficiary_location(recipient).versioned(),
            fee_asset_item: 0,
            weight_limit: WeightLimit::Unlimited,
        },
    };

    let call = ExtrinsicCall::new(pallet, extrinsic.call_name(), args);
    log_info!(
        "xcm",
        "Selected extrinsic",
        call = call,
        direction = direction,
        token = token.symbol,
        recipient = recipient.to_hex(),
    );
    Ok(call)
}

/// Build a same-chain transfer call
pub fn transfer_extrinsic(
    api: &dyn TypedApi,
    chain: &Chain,
    token: &Token,
    recipient: &AccountId,
    plancks: u128,
) -> TransferResult<ExtrinsicCall> {
    let target = MultiAddress::from(recipient);

    if token.is_native_on(chain) {
        return Ok(ExtrinsicCall::new(
            "Balances",
            "transfer_keep_alive",
            CallArgs::BalancesTransfer {
                dest: target,
                value: plancks,
            },
        ));
    }

    let module = resolve_balance_module(token, &chain.id);
    if let BalanceModule::Tokens | BalanceModule::OrmlTokens = module {
        let pallet = module_pallet(module);
        let currency_id = token
            .asset_id(&chain.id)
            .and_then(AssetId::as_index)
            .ok_or_else(|| TransferError::missing_asset_id(&token.symbol, &chain.id))?;
        return Ok(ExtrinsicCall::new(
            pallet,
            "transfer",
            CallArgs::TokensTransfer {
                dest: target,
                currency_id,
                amount: plancks,
            },
        ));
    }

    let asset_id = token.asset_id(&chain.id);
    let pallet = asset_id.map(AssetId::assets_pallet).unwrap_or("Assets");
    if !api.has_pallet(pallet) {
        return Err(TransferError::assets_module_missing(&chain.id, pallet));
    }
    let id = asset_id
        .cloned()
        .ok_or_else(|| TransferError::missing_asset_id(&token.symbol, &chain.id))?;

    Ok(ExtrinsicCall::new(
        pallet,
        "transfer",
        CallArgs::AssetsTransfer {
            id,
            target,
            amount: plancks,
        },
    ))
}

fn module_pallet(module: BalanceModule) -> &'static str {
    match module {
        BalanceModule::OrmlTokens => "OrmlTokens",
        _ => "Tokens",
    }
}
