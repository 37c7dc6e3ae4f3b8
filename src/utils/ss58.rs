//! SS58 account decoding
//!
//! Recipients arrive either as SS58 strings (any network prefix) or as
//! 0x-prefixed 32-byte hex. Both collapse to a raw [`AccountId`].

use crate::error::{TransferError, TransferResult};
use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw 32-byte account id as used by `AccountId32` junctions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// Parse an SS58 or 0x-hex account
    pub fn parse(input: &str) -> TransferResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TransferError::invalid_address("Empty address"));
        }

        if let Some(hex_part) = trimmed.strip_prefix("0x") {
            let bytes = hex::decode(hex_part)
                .map_err(|e| TransferError::invalid_address(format!("Invalid hex account: {}", e)))?;
            let raw: [u8; 32] = bytes.try_into().map_err(|_| {
                TransferError::invalid_address("Hex account must be exactly 32 bytes")
            })?;
            return Ok(Self(raw));
        }

        decode_ss58(trimmed).map(|(account, _)| account)
    }

    /// Encode with the given network prefix
    pub fn to_ss58(&self, prefix: u16) -> String {
        let mut data = Vec::with_capacity(36);

        if prefix < 64 {
            data.push(prefix as u8);
        } else {
            data.push((((prefix & 0x00fc) >> 2) | 0x0040) as u8);
            data.push(((prefix >> 8) | ((prefix & 0x0003) << 6)) as u8);
        }

        data.extend_from_slice(&self.0);

        let checksum = compute_ss58_checksum(&data);
        data.extend_from_slice(&checksum);

        bs58::encode(data).into_string()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for AccountId {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Decode an SS58 string into the account id and its network prefix
pub fn decode_ss58(s: &str) -> TransferResult<(AccountId, u16)> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| TransferError::invalid_address(format!("Invalid base58: {}", e)))?;

    if bytes.len() < 35 {
        return Err(TransferError::invalid_address("Address too short"));
    }

    let (prefix, prefix_len) = if bytes[0] < 64 {
        (bytes[0] as u16, 1)
    } else if bytes[0] < 128 {
        let lower = ((bytes[0] & 0x3f) as u16) << 2 | (bytes[1] >> 6) as u16;
        let upper = ((bytes[1] & 0x3f) as u16) << 8;
        (lower | upper, 2)
    } else {
        return Err(TransferError::invalid_address("Invalid SS58 prefix"));
    };

    let pk_end = prefix_len + 32;
    if bytes.len() != pk_end + 2 {
        return Err(TransferError::invalid_address("Invalid address length"));
    }

    let checksum = &bytes[pk_end..pk_end + 2];
    if checksum != compute_ss58_checksum(&bytes[..pk_end]) {
        return Err(TransferError::invalid_address("Invalid checksum"));
    }

    let mut raw = [0u8; 32];
    raw.copy_from_slice(&bytes[prefix_len..pk_end]);

    Ok((AccountId(raw), prefix))
}

/// First 2 bytes of Blake2b-512 over "SS58PRE" || data
fn compute_ss58_checksum(data: &[u8]) -> [u8; 2] {
    const SS58_PREFIX: &[u8] = b"SS58PRE";

    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(data);
    let hash = hasher.finalize();

    [hash[0], hash[1]]
}
