//! XCM V4 locations
//!
//! JSON uses the tagged `{type, value}` shape emitted by typed Substrate
//! clients. SCALE encoding follows the runtime layout so locations can be
//! hashed into pool accounts.

use parity_scale_codec::{Decode, Encode, Input, Output};
use serde::de::{self, DeserializeSeed, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Global consensus system a location belongs to
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "type", content = "value")]
pub enum NetworkId {
    ByGenesis(#[serde(with = "crate::serde_bytes::hex32")] [u8; 32]),
    ByFork {
        block_number: u64,
        #[serde(with = "crate::serde_bytes::hex32")]
        block_hash: [u8; 32],
    },
    Polkadot,
    Kusama,
    Westend,
    Rococo,
    Wococo,
    Ethereum {
        #[codec(compact)]
        chain_id: u64,
    },
    BitcoinCore,
    BitcoinCash,
    PolkadotBulletin,
}

/// Paseo relay genesis hash
pub const PASEO_GENESIS: [u8; 32] = [
    0x77, 0xaf, 0xd6, 0x19, 0x0f, 0x15, 0x54, 0xad, 0x45, 0xfd, 0x0d, 0x31, 0xae, 0xe6, 0x2a, 0xac,
    0xc3, 0x3c, 0x6d, 0xb0, 0xea, 0x80, 0x11, 0x29, 0xac, 0xb8, 0x13, 0xf9, 0x13, 0xe0, 0x76, 0x4f,
];

impl NetworkId {
    /// Map a relay chain id to its consensus identifier
    pub fn for_relay(relay_id: &str) -> Option<Self> {
        match relay_id {
            "polkadot" => Some(NetworkId::Polkadot),
            "kusama" => Some(NetworkId::Kusama),
            "westend" => Some(NetworkId::Westend),
            "rococo" => Some(NetworkId::Rococo),
            "paseo" => Some(NetworkId::ByGenesis(PASEO_GENESIS)),
            _ => None,
        }
    }
}

/// One segment of a location's interior path
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "type", content = "value")]
pub enum Junction {
    #[codec(index = 0)]
    Parachain(#[codec(compact)] u32),
    #[codec(index = 1)]
    AccountId32 {
        network: Option<NetworkId>,
        #[serde(with = "crate::serde_bytes::hex32")]
        id: [u8; 32],
    },
    #[codec(index = 2)]
    AccountIndex64 {
        network: Option<NetworkId>,
        #[codec(compact)]
        index: u64,
    },
    #[codec(index = 3)]
    AccountKey20 {
        network: Option<NetworkId>,
        #[serde(with = "crate::serde_bytes::hex20")]
        key: [u8; 20],
    },
    #[codec(index = 4)]
    PalletInstance(u8),
    #[codec(index = 5)]
    GeneralIndex(
        #[codec(compact)]
        #[serde(with = "crate::serde_bytes::u128_lenient")]
        u128,
    ),
    #[codec(index = 6)]
    GeneralKey {
        length: u8,
        #[serde(with = "crate::serde_bytes::hex32")]
        data: [u8; 32],
    },
    #[codec(index = 7)]
    OnlyChild,
    #[codec(index = 9)]
    GlobalConsensus(NetworkId),
}

/// Interior path of a location (`Here`, `X1` .. `X8`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Junctions(Vec<Junction>);

pub const MAX_JUNCTIONS: usize = 8;

impl Junctions {
    pub fn here() -> Self {
        Self(Vec::new())
    }

    /// Build from a list of junctions, at most eight
    pub fn from_vec(junctions: Vec<Junction>) -> Option<Self> {
        (junctions.len() <= MAX_JUNCTIONS).then_some(Self(junctions))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Junction> {
        self.0.first()
    }

    pub fn as_slice(&self) -> &[Junction] {
        &self.0
    }

    /// Append a junction; `false` when already at eight
    pub fn push(&mut self, junction: Junction) -> bool {
        if self.0.len() >= MAX_JUNCTIONS {
            return false;
        }
        self.0.push(junction);
        true
    }

    fn variant_name(&self) -> String {
        match self.0.len() {
            0 => "Here".to_string(),
            n => format!("X{}", n),
        }
    }
}

impl Encode for Junctions {
    fn size_hint(&self) -> usize {
        1 + self.0.iter().map(Encode::size_hint).sum::<usize>()
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        dest.push_byte(self.0.len() as u8);
        for junction in &self.0 {
            junction.encode_to(dest);
        }
    }
}

impl parity_scale_codec::EncodeLike for Junctions {}

impl Decode for Junctions {
    fn decode<I: Input>(input: &mut I) -> Result<Self, parity_scale_codec::Error> {
        let count = input.read_byte()? as usize;
        if count > MAX_JUNCTIONS {
            return Err("Junctions variant out of range".into());
        }
        let mut junctions = Vec::with_capacity(count);
        for _ in 0..count {
            junctions.push(Junction::decode(input)?);
        }
        Ok(Self(junctions))
    }
}

#[derive(Serialize)]
struct TaggedRef<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<T>,
}

impl Serialize for Junctions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let name = self.variant_name();
        match self.0.len() {
            0 => TaggedRef::<()> { kind: &name, value: None }.serialize(serializer),
            1 => TaggedRef {
                kind: &name,
                value: Some(&self.0[0]),
            }
            .serialize(serializer),
            _ => TaggedRef {
                kind: &name,
                value: Some(&self.0),
            }
            .serialize(serializer),
        }
    }
}

/// Read the `value` of a junctions tag once the tag is known
fn junctions_value<'de, D: Deserializer<'de>>(kind: &str, value: D) -> Result<Vec<Junction>, D::Error> {
    match kind {
        "Here" => {
            de::IgnoredAny::deserialize(value)?;
            Ok(Vec::new())
        }
        "X1" => Ok(vec![Junction::deserialize(value)?]),
        _ => Vec::<Junction>::deserialize(value),
    }
}

fn check_junctions<E: de::Error>(kind: &str, junctions: Vec<Junction>) -> Result<Junctions, E> {
    if junctions.len() > MAX_JUNCTIONS {
        return Err(E::custom("too many junctions"));
    }
    let parsed = Junctions(junctions);
    if parsed.variant_name() != kind {
        return Err(E::custom(format!(
            "junctions tag {} does not match {} entries",
            kind,
            parsed.len()
        )));
    }
    Ok(parsed)
}

struct JunctionsVisitor;

impl<'de> Visitor<'de> for JunctionsVisitor {
    type Value = Junctions;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a {type, value} junctions object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Junctions, A::Error> {
        let mut kind: Option<String> = None;
        let mut junctions: Option<Vec<Junction>> = None;
        // value seen before its tag
        let mut pending: Option<serde_json::Value> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "type" => kind = Some(map.next_value()?),
                "value" => match &kind {
                    Some(k) => {
                        junctions = Some(map.next_value_seed(JunctionsSeed(k))?);
                    }
                    None => pending = Some(map.next_value()?),
                },
                _ => {
                    map.next_value::<de::IgnoredAny>()?;
                }
            }
        }

        let kind = kind.ok_or_else(|| <A::Error as de::Error>::missing_field("type"))?;
        let junctions = match (junctions, pending) {
            (Some(js), _) => js,
            (None, Some(value)) => junctions_value(&kind, value).map_err(<A::Error as de::Error>::custom)?,
            (None, None) if kind == "Here" => Vec::new(),
            (None, None) => return Err(de::Error::missing_field("value")),
        };
        check_junctions(&kind, junctions)
    }
}

struct JunctionsSeed<'a>(&'a str);

impl<'de> DeserializeSeed<'de> for JunctionsSeed<'_> {
    type Value = Vec<Junction>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Vec<Junction>, D::Error> {
        junctions_value(self.0, deserializer)
    }
}

impl<'de> Deserialize<'de> for Junctions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(JunctionsVisitor)
    }
}

/// A point in the consensus topology relative to some origin
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct Location {
    pub parents: u8,
    pub interior: Junctions,
}

impl Location {
    pub fn new(parents: u8, interior: Junctions) -> Self {
        Self { parents, interior }
    }

    /// Build from a junction list; `None` when it exceeds eight entries
    pub fn from_junctions(parents: u8, junctions: Vec<Junction>) -> Option<Self> {
        Junctions::from_vec(junctions).map(|interior| Self { parents, interior })
    }

    pub fn here() -> Self {
        Self::default()
    }

    pub fn parent() -> Self {
        Self::new(1, Junctions::here())
    }

    pub fn first_interior(&self) -> Option<&Junction> {
        self.interior.first()
    }

    /// True when the outermost interior junction is `GlobalConsensus`
    pub fn targets_other_consensus(&self) -> bool {
        matches!(self.first_interior(), Some(Junction::GlobalConsensus(_)))
    }

    pub fn versioned(self) -> VersionedLocation {
        VersionedLocation::V4(self)
    }
}

/// Location wrapped in the XCM version envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "type", content = "value")]
pub enum VersionedLocation {
    #[codec(index = 4)]
    V4(Location),
}

impl VersionedLocation {
    pub fn location(&self) -> &Location {
        match self {
            VersionedLocation::V4(loc) => loc,
        }
    }
}
