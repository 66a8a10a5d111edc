//! Core domain types used by the ledger.
//!
//! This module defines strongly-typed hashes, public keys and signatures
//! shared across the chain implementation, together with the text wire
//! format configuration used to serialize blocks. The goal is to avoid
//! "naked" byte buffers and hex strings in public APIs and instead use
//! domain-specific newtypes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Block data structures, sealing and the text wire format.
pub mod block;
/// Signed peer opinions on block validity.
pub mod judgement;
/// Transaction variants and their signing contracts.
pub mod tx;

pub use block::{Block, BlockError, Header};
pub use judgement::Judgement;
pub use tx::{
    Permission, PermissionTransaction, Transaction, VaccinationTransaction, VaccineTransaction,
};

/// Length in bytes of all 256-bit hash types used in this module.
pub const HASH_LEN: usize = 32;

/// Errors produced while decoding wire data (blocks, transactions, keys).
#[derive(Debug, Error)]
pub enum ParseError {
    /// The block text has no header terminator.
    #[error("missing header terminator")]
    MissingTerminator,
    /// The header does not map onto the block field list.
    #[error("wrong header format: expected 5 to 7 fields, got {0}")]
    HeaderFieldCount(usize),
    /// A numeric header field could not be parsed.
    #[error("invalid integer in field `{field}`: {value}")]
    InvalidInteger { field: &'static str, value: String },
    /// A hex-encoded field could not be decoded.
    #[error("invalid hex in field `{field}`")]
    InvalidHex { field: &'static str },
    /// A hash field did not have [`HASH_LEN`] bytes.
    #[error("invalid hash length in field `{field}`: {len} bytes")]
    InvalidHashLength { field: &'static str, len: usize },
    /// A transaction or judgement record failed to decode.
    #[error("invalid record: {0}")]
    Record(#[from] serde_json::Error),
}

/// Strongly-typed 256-bit hash wrapper (BLAKE3-256).
///
/// Rendered as 64 lower-case hex characters on the wire and in file names.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// The all-zero hash, used as the genesis block's parent sentinel.
    pub const ZERO: Hash256 = Hash256([0u8; HASH_LEN]);

    /// Computes a new [`Hash256`] as the BLAKE3-256 hash of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let h = blake3::hash(data);
        Hash256(*h.as_bytes())
    }

    /// Returns the underlying 32-byte hash as a borrowed array.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns the lower-case hex rendering of this hash.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn parse_field(s: &str, field: &'static str) -> Result<Self, ParseError> {
        let bytes = hex::decode(s).map_err(|_| ParseError::InvalidHex { field })?;
        if bytes.len() != HASH_LEN {
            return Err(ParseError::InvalidHashLength {
                field,
                len: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Hash256(arr))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Strongly-typed block hash.
///
/// This is the content hash of a sealed [`Block`]. Wrapping the
/// underlying [`Hash256`] keeps block identifiers apart from other
/// hashes in public APIs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BlockHash(pub Hash256);

impl BlockHash {
    /// Parent sentinel of the genesis block.
    pub const GENESIS_PARENT: BlockHash = BlockHash(Hash256::ZERO);

    pub(crate) fn parse_field(s: &str, field: &'static str) -> Result<Self, ParseError> {
        Hash256::parse_field(s, field).map(BlockHash)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BlockHash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockHash::parse_field(s, "block_hash")
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ed25519 public key bytes, wrapped to avoid naked `Vec<u8>`.
///
/// Public keys identify every actor on the ledger: admission nodes,
/// doctors, patients and vaccine registrants. The type does not check
/// that the bytes form a valid curve point; verification does that.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PublicKey(pub Vec<u8>);

impl PublicKey {
    /// Returns the raw public key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the lower-case hex rendering used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Decodes a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        hex::decode(s)
            .map(PublicKey)
            .map_err(|_| ParseError::InvalidHex { field: "public_key" })
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        hex.chars().take(12).collect()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Detached Ed25519 signature bytes.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the lower-case hex rendering used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Decodes a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        hex::decode(s)
            .map(Signature)
            .map_err(|_| ParseError::InvalidHex { field: "signature" })
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Signature::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Separator and terminator characters of the text wire format.
///
/// Header fields are joined by `separator`; the header and every
/// transaction record end with `terminator`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WireFormat {
    pub separator: char,
    pub terminator: char,
}

impl Default for WireFormat {
    fn default() -> Self {
        Self {
            separator: ',',
            terminator: '\n',
        }
    }
}
