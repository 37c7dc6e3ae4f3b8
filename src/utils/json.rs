//! JSON value helpers
//!
//! Typed-client values come back as `serde_json::Value`. Balances and
//! reserves can exceed `u64`, so numeric fields are accepted as JSON
//! numbers, decimal strings or hex strings.

use crate::error::{TransferError, TransferResult};
use serde::de::DeserializeOwned;

/// Parse a JSON document into a type
pub fn parse_json<T: DeserializeOwned>(json_str: &str) -> TransferResult<T> {
    serde_json::from_str(json_str)
        .map_err(|e| TransferError::invalid_input(format!("JSON parse error: {}", e)))
}

/// Interpret a JSON value as u128 (number, decimal string or hex string)
pub fn as_u128(value: &serde_json::Value) -> Option<u128> {
    if let Some(n) = value.as_u64() {
        return Some(n as u128);
    }

    let s = value.as_str()?;
    if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex_part.is_empty() {
            return Some(0);
        }
        u128::from_str_radix(hex_part, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// Extract a u128 field from a JSON object
pub fn get_json_u128(value: &serde_json::Value, field: &str) -> Option<u128> {
    value.get(field).and_then(as_u128)
}

/// Extract a u128 field, defaulting to 0 when absent or null
pub fn get_json_u128_or_zero(value: &serde_json::Value, field: &str) -> u128 {
    get_json_u128(value, field).unwrap_or(0)
}

/// Extract a string field from a JSON object
pub fn get_json_string(value: &serde_json::Value, field: &str) -> Option<String> {
    value.get(field).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Read an enum tag written either as a bare string or as `{type: ...}`
pub fn enum_tag(value: &serde_json::Value) -> Option<&str> {
    value
        .as_str()
        .or_else(|| value.get("type").and_then(|t| t.as_str()))
}
