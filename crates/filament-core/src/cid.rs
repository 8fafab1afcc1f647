//! Content identifiers for messages.
//!
//! Messages are identified by a CIDv1 over their DAG-CBOR encoding with a
//! BLAKE2b-256 multihash. The string form is multibase base32 (`b...`), and
//! the JSON form is the IPLD link object `{"/": "<cid>"}`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::address::{from_base32, leb128_decode, leb128_encode, to_base32};
use crate::constants::{BLAKE2B_256_CODE, DAG_CBOR_CODEC};
use crate::error::MessageError;
use crate::hash::blake2b_256;

const CID_VERSION: u64 = 1;
const MULTIBASE_BASE32: char = 'b';

/// A CIDv1, kept in its binary form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    bytes: Vec<u8>,
}

impl Cid {
    /// CID of DAG-CBOR encoded data.
    pub fn from_cbor(data: &[u8]) -> Self {
        let digest = blake2b_256(data);
        let mut bytes = leb128_encode(CID_VERSION);
        bytes.extend_from_slice(&leb128_encode(DAG_CBOR_CODEC));
        bytes.extend_from_slice(&leb128_encode(BLAKE2B_256_CODE));
        bytes.extend_from_slice(&leb128_encode(digest.len() as u64));
        bytes.extend_from_slice(&digest);
        Self { bytes }
    }

    /// Parse binary CIDv1: version, codec, multihash code, digest length, digest.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        let invalid = |why: &str| MessageError::InvalidCid(why.to_string());
        let mut rest = bytes;
        let mut next = |what: &str| -> Result<u64, MessageError> {
            let (value, used) = leb128_decode(rest).ok_or_else(|| invalid(what))?;
            rest = &rest[used..];
            Ok(value)
        };
        if next("version")? != CID_VERSION {
            return Err(invalid("unsupported cid version"));
        }
        next("codec")?;
        next("multihash code")?;
        let digest_len = next("digest length")?;
        if rest.len() as u64 != digest_len {
            return Err(invalid("digest length mismatch"));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MULTIBASE_BASE32}{}", to_base32(&self.bytes))
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({self})")
    }
}

impl FromStr for Cid {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s
            .strip_prefix(MULTIBASE_BASE32)
            .ok_or_else(|| MessageError::InvalidCid(format!("unsupported multibase in '{s}'")))?;
        let bytes = from_base32(encoded).map_err(|e| MessageError::InvalidCid(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

#[derive(Serialize, Deserialize)]
struct CidLink {
    #[serde(rename = "/")]
    link: String,
}

impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CidLink {
            link: self.to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let link = CidLink::deserialize(deserializer)?;
        link.link.parse().map_err(serde::de::Error::custom)
    }
}
