//! Serde helpers for byte arrays and large integers
//!
//! Byte payloads inside XCM locations are written as 0x-prefixed hex,
//! matching the binary representation typed Substrate clients emit.
//! `u128` values are accepted as numbers, decimal strings or hex strings.

use serde::{Deserialize, Deserializer, Serializer};
use std::fmt;

fn decode_hex<E: serde::de::Error>(s: &str) -> Result<Vec<u8>, E> {
    let cleaned = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(cleaned).map_err(E::custom)
}

/// Serialize/deserialize [u8; 32] as 0x-prefixed hex string
pub mod hex32 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = decode_hex::<D::Error>(&s)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

/// Serialize/deserialize [u8; 20] as 0x-prefixed hex string
pub mod hex20 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 20], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 20], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = decode_hex::<D::Error>(&s)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 20 bytes"))
    }
}

/// Serialize u128 as a JSON number when it fits u64, else a decimal string
pub mod u128_lenient {
    use super::*;
    use serde::de::{self, Visitor};

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match u64::try_from(*value) {
            Ok(small) => serializer.serialize_u64(small),
            Err(_) => serializer.serialize_str(&value.to_string()),
        }
    }

    struct LenientU128;

    impl<'de> Visitor<'de> for LenientU128 {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an unsigned integer, decimal string or 0x-hex string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(v as u128)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom("negative integer"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            match v.strip_prefix("0x") {
                Some(hex_part) => u128::from_str_radix(hex_part, 16).map_err(E::custom),
                None => v.parse().map_err(E::custom),
            }
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientU128)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper {
        #[serde(with = "super::hex32")]
        id: [u8; 32],
    }

    #[test]
    fn test_hex32_prefixed() {
        let w = Wrapper { id: [0xab; 32] };
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"0xabab"));

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);

        // bare hex is tolerated on input
        let bare = format!("{{\"id\":\"{}\"}}", hex::encode([0xab; 32]));
        let parsed: Wrapper = serde_json::from_str(&bare).unwrap();
        assert_eq!(parsed, w);
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Amount {
        #[serde(with = "super::u128_lenient")]
        value: u128,
    }

    #[test]
    fn test_u128_lenient() {
        let small = serde_json::to_value(Amount { value: 1984 }).unwrap();
        assert_eq!(small, serde_json::json!({ "value": 1984 }));

        let big = serde_json::to_value(Amount { value: u128::MAX }).unwrap();
        assert_eq!(big["value"], "340282366920938463463374607431768211455");
        assert_eq!(serde_json::from_value::<Amount>(big).unwrap().value, u128::MAX);

        let hex: Amount = serde_json::from_str(r#"{"value":"0x7c0"}"#).unwrap();
        assert_eq!(hex.value, 1984);
        assert!(serde_json::from_str::<Amount>(r#"{"value":-1}"#).is_err());
    }
}
