use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error decoding a `0x`-prefixed hex value from the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("hex string without 0x prefix")]
    MissingPrefix,
    #[error("hex string has length {got}, want {want}")]
    InvalidLength { got: usize, want: usize },
    #[error("hex string of odd length or with invalid digits")]
    InvalidDigits,
    #[error("hex string \"0x\"")]
    EmptyNumber,
    #[error("hex number with leading zero digits")]
    LeadingZero,
    #[error("hex number > 64 bits")]
    Uint64Range,
    #[error("work package field {index}: {source}")]
    WorkField { index: usize, source: Box<HexError> },
}

fn strip_prefix(s: &str) -> Result<&str, HexError> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(HexError::MissingPrefix)
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let digits = strip_prefix(s)?;
    if digits.len() != N * 2 {
        return Err(HexError::InvalidLength {
            got: digits.len(),
            want: N * 2,
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out).map_err(|_| HexError::InvalidDigits)?;
    Ok(out)
}

/// 32-byte hash, rendered as `0x` followed by 64 hex digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const LEN: usize = 32;

    /// A random hash, suitable as a remote miner's self-chosen identifier.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Hash(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Hash {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Hash)
    }
}

/// 8-byte proof-of-work nonce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockNonce(pub [u8; 8]);

impl BlockNonce {
    pub fn from_u64(value: u64) -> Self {
        BlockNonce(value.to_be_bytes())
    }

    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl Display for BlockNonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for BlockNonce {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<8>(s).map(BlockNonce)
    }
}

/// Unsigned 64-bit quantity encoded as minimal `0x` hex (`0x0` for zero).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexU64(pub u64);

impl From<u64> for HexU64 {
    fn from(value: u64) -> Self {
        HexU64(value)
    }
}

impl From<HexU64> for u64 {
    fn from(value: HexU64) -> Self {
        value.0
    }
}

impl Display for HexU64 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for HexU64 {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_prefix(s)?;
        if digits.is_empty() {
            return Err(HexError::EmptyNumber);
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(HexError::LeadingZero);
        }
        if digits.len() > 16 {
            return Err(HexError::Uint64Range);
        }
        u64::from_str_radix(digits, 16)
            .map(HexU64)
            .map_err(|_| HexError::InvalidDigits)
    }
}

macro_rules! string_serde {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    )*};
}

string_serde!(Hash, BlockNonce, HexU64);

/// Everything a remote miner needs to attempt a seal.
///
/// On the wire this is a 9-element array of hex strings:
///   [0] pow-hash of the current header
///   [1] seed hash used for DAG selection
///   [2] boundary condition ("target"), 2^256/difficulty
///   [3] block number
///   [4] pow-hash of the parent header
///   [5] gas limit
///   [6] gas used
///   [7] transaction count
///   [8] uncle count
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkPackage {
    pub pow_hash: Hash,
    pub seed_hash: Hash,
    pub target: Hash,
    pub number: u64,
    pub parent_hash: Hash,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub tx_count: u64,
    pub uncle_count: u64,
}

impl WorkPackage {
    pub const FIELDS: usize = 9;

    pub fn to_wire(&self) -> [String; 9] {
        [
            self.pow_hash.to_string(),
            self.seed_hash.to_string(),
            self.target.to_string(),
            HexU64(self.number).to_string(),
            self.parent_hash.to_string(),
            HexU64(self.gas_limit).to_string(),
            HexU64(self.gas_used).to_string(),
            HexU64(self.tx_count).to_string(),
            HexU64(self.uncle_count).to_string(),
        ]
    }

    pub fn from_wire(fields: &[String; 9]) -> Result<Self, HexError> {
        fn hash(fields: &[String; 9], index: usize) -> Result<Hash, HexError> {
            fields[index].parse().map_err(|e| HexError::WorkField {
                index,
                source: Box::new(e),
            })
        }
        fn quantity(fields: &[String; 9], index: usize) -> Result<u64, HexError> {
            fields[index]
                .parse::<HexU64>()
                .map(u64::from)
                .map_err(|e| HexError::WorkField {
                    index,
                    source: Box::new(e),
                })
        }

        Ok(WorkPackage {
            pow_hash: hash(fields, 0)?,
            seed_hash: hash(fields, 1)?,
            target: hash(fields, 2)?,
            number: quantity(fields, 3)?,
            parent_hash: hash(fields, 4)?,
            gas_limit: quantity(fields, 5)?,
            gas_used: quantity(fields, 6)?,
            tx_count: quantity(fields, 7)?,
            uncle_count: quantity(fields, 8)?,
        })
    }
}

impl Serialize for WorkPackage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WorkPackage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = <[String; 9]>::deserialize(deserializer)?;
        WorkPackage::from_wire(&fields).map_err(de::Error::custom)
    }
}

/// A remote miner's answer to a work package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Solution {
    pub nonce: BlockNonce,
    pub pow_hash: Hash,
    pub mix_digest: Hash,
}

/// Self-reported hash rate of a single remote miner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashrateReport {
    pub id: Hash,
    pub rate: HexU64,
}
