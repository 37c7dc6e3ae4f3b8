//! Asset, weight and address argument types

use super::location::Location;
use crate::utils::AccountId;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "type", content = "value")]
pub enum Fungibility {
    Fungible(#[codec(compact)] u128),
}

/// A concrete amount of the asset found at `id`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Asset {
    pub id: Location,
    pub fun: Fungibility,
}

impl Asset {
    pub fn fungible(id: Location, amount: u128) -> Self {
        Self {
            id,
            fun: Fungibility::Fungible(amount),
        }
    }

    pub fn amount(&self) -> u128 {
        match self.fun {
            Fungibility::Fungible(amount) => amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum VersionedAssets {
    V4(Vec<Asset>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum VersionedAsset {
    V4(Asset),
}

impl From<Asset> for VersionedAssets {
    fn from(asset: Asset) -> Self {
        VersionedAssets::V4(vec![asset])
    }
}

impl From<Asset> for VersionedAsset {
    fn from(asset: Asset) -> Self {
        VersionedAsset::V4(asset)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum WeightLimit {
    Unlimited,
    Limited { ref_time: u64, proof_size: u64 },
}

/// Account argument of `Balances` and `Assets` calls
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MultiAddress {
    Id(#[serde(with = "crate::serde_bytes::hex32")] [u8; 32]),
}

impl From<&AccountId> for MultiAddress {
    fn from(account: &AccountId) -> Self {
        MultiAddress::Id(account.0)
    }
}
