//! Address encoding for Filecoin-style networks.
//!
//! An address is a protocol byte followed by a protocol-specific payload:
//!
//! | Protocol | Payload |
//! |---|---|
//! | 0 ID | unsigned LEB128 actor ID |
//! | 1 secp256k1 | BLAKE2b-160 of the uncompressed public key |
//! | 2 actor | BLAKE2b-160 of actor creation data |
//! | 3 BLS | 48-byte compressed G1 public key |
//! | 4 delegated | LEB128 namespace ++ sub-address |
//!
//! The string form is `<network prefix><protocol digit><body>`. For protocols
//! 1-3 the body is lowercase unpadded RFC-4648 base32 of `payload ++ checksum`,
//! where the checksum is a 4-byte BLAKE2b of `protocol byte ++ payload`. ID
//! addresses render the actor ID in decimal and carry no checksum. Delegated
//! addresses render as `<namespace>f<base32(sub-address ++ checksum)>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    BLS_PUBLIC_KEY_LEN, CHECKSUM_LEN, EAM_NAMESPACE, MAX_ACTOR_ID, MAX_ADDRESS_STRING_LEN,
    MAX_SUBADDRESS_LEN, PAYLOAD_HASH_LEN, SECP_PUBLIC_KEY_LEN,
};
use crate::error::AddressError;
use crate::hash::{blake2b_160, checksum};
use crate::network::Network;

/// RFC-4648 base32 alphabet, lowercase.
const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Address protocol, the first byte of the binary form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Protocol {
    Id = 0,
    Secp256k1 = 1,
    Actor = 2,
    Bls = 3,
    Delegated = 4,
}

impl Protocol {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    fn from_digit(c: char) -> Result<Self, AddressError> {
        match c {
            '0'..='9' => Protocol::try_from(c as u8 - b'0'),
            _ => Err(AddressError::InvalidProtocol(c.to_string())),
        }
    }
}

impl TryFrom<u8> for Protocol {
    type Error = AddressError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b {
            0 => Ok(Protocol::Id),
            1 => Ok(Protocol::Secp256k1),
            2 => Ok(Protocol::Actor),
            3 => Ok(Protocol::Bls),
            4 => Ok(Protocol::Delegated),
            _ => Err(AddressError::InvalidProtocol(b.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte())
    }
}

/// Payload of a protocol-4 address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelegatedAddress {
    namespace: u64,
    subaddress: Vec<u8>,
}

impl DelegatedAddress {
    /// Actor ID of the namespace manager (10 for the EAM).
    pub fn namespace(&self) -> u64 {
        self.namespace
    }

    pub fn subaddress(&self) -> &[u8] {
        &self.subaddress
    }
}

/// A network-independent address.
///
/// Render it with [`Address::encode`] or pair it with a [`Network`] in a
/// [`NetworkAddress`] to get a `Display`able value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Address {
    Id(u64),
    Secp256k1([u8; PAYLOAD_HASH_LEN]),
    Actor([u8; PAYLOAD_HASH_LEN]),
    Bls([u8; BLS_PUBLIC_KEY_LEN]),
    Delegated(DelegatedAddress),
}

impl Address {
    /// ID address for an actor ID.
    pub fn new_id(id: u64) -> Result<Self, AddressError> {
        if id > MAX_ACTOR_ID {
            return Err(AddressError::InvalidAddressFormat(format!(
                "actor id {id} out of range"
            )));
        }
        Ok(Address::Id(id))
    }

    /// Secp256k1 address from a 65-byte uncompressed SEC1 public key.
    pub fn new_secp256k1(public_key: &[u8]) -> Result<Self, AddressError> {
        if public_key.len() != SECP_PUBLIC_KEY_LEN {
            return Err(AddressError::InvalidPayloadLength {
                protocol: Protocol::Secp256k1.as_byte(),
                len: public_key.len(),
            });
        }
        Ok(Address::Secp256k1(blake2b_160(public_key)))
    }

    /// Actor address from actor creation data.
    pub fn new_actor(data: &[u8]) -> Self {
        Address::Actor(blake2b_160(data))
    }

    /// BLS address from a 48-byte compressed public key.
    pub fn new_bls(public_key: &[u8]) -> Result<Self, AddressError> {
        let key: [u8; BLS_PUBLIC_KEY_LEN] =
            public_key
                .try_into()
                .map_err(|_| AddressError::InvalidPayloadLength {
                    protocol: Protocol::Bls.as_byte(),
                    len: public_key.len(),
                })?;
        Ok(Address::Bls(key))
    }

    /// Delegated address. The EAM namespace requires a 20-byte sub-address.
    pub fn new_delegated(namespace: u64, subaddress: Vec<u8>) -> Result<Self, AddressError> {
        if namespace > MAX_ACTOR_ID {
            return Err(AddressError::InvalidAddressFormat(format!(
                "namespace {namespace} out of range"
            )));
        }
        let valid_len = if namespace == EAM_NAMESPACE {
            subaddress.len() == PAYLOAD_HASH_LEN
        } else {
            subaddress.len() <= MAX_SUBADDRESS_LEN
        };
        if !valid_len {
            return Err(AddressError::InvalidPayloadLength {
                protocol: Protocol::Delegated.as_byte(),
                len: subaddress.len(),
            });
        }
        Ok(Address::Delegated(DelegatedAddress {
            namespace,
            subaddress,
        }))
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Address::Id(_) => Protocol::Id,
            Address::Secp256k1(_) => Protocol::Secp256k1,
            Address::Actor(_) => Protocol::Actor,
            Address::Bls(_) => Protocol::Bls,
            Address::Delegated(_) => Protocol::Delegated,
        }
    }

    /// The actor ID, for ID addresses.
    pub fn id(&self) -> Option<u64> {
        match self {
            Address::Id(id) => Some(*id),
            _ => None,
        }
    }

    /// Protocol-specific payload (the binary form without the protocol byte).
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Address::Id(id) => leb128_encode(*id),
            Address::Secp256k1(hash) | Address::Actor(hash) => hash.to_vec(),
            Address::Bls(key) => key.to_vec(),
            Address::Delegated(d) => {
                let mut out = leb128_encode(d.namespace);
                out.extend_from_slice(&d.subaddress);
                out
            }
        }
    }

    /// Binary form: `protocol byte ++ payload`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut out = Vec::with_capacity(1 + payload.len());
        out.push(self.protocol().as_byte());
        out.extend_from_slice(&payload);
        out
    }

    /// Parse the binary form produced by [`Address::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let (&first, payload) = bytes
            .split_first()
            .ok_or_else(|| AddressError::InvalidAddressFormat("empty address bytes".into()))?;
        Self::from_payload(Protocol::try_from(first)?, payload)
    }

    /// The 4-byte checksum of this address.
    pub fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        checksum(&self.to_bytes())
    }

    /// Encode this address as a string under the given network prefix.
    pub fn encode(&self, network: Network) -> String {
        let mut out = String::with_capacity(MAX_ADDRESS_STRING_LEN);
        out.push(network.prefix_char());
        out.push_str(&self.protocol().to_string());
        match self {
            Address::Id(id) => out.push_str(&id.to_string()),
            Address::Delegated(d) => {
                out.push_str(&d.namespace.to_string());
                out.push('f');
                let mut data = d.subaddress.clone();
                data.extend_from_slice(&self.checksum());
                out.push_str(&to_base32(&data));
            }
            _ => {
                let mut data = self.payload();
                data.extend_from_slice(&self.checksum());
                out.push_str(&to_base32(&data));
            }
        }
        out
    }

    /// Decode an address string that must carry `network`'s prefix.
    pub fn decode(s: &str, network: Network) -> Result<Self, AddressError> {
        let found = parse_prefix(s)?;
        if found != network {
            return Err(AddressError::InvalidAddressFormat(format!(
                "expected {network} prefix '{}', found '{}'",
                network.prefix_char(),
                found.prefix_char()
            )));
        }
        Self::decode_body(&s[1..])
    }

    /// Decode an address string under whichever network its prefix names.
    pub fn decode_any(s: &str) -> Result<(Network, Self), AddressError> {
        let network = parse_prefix(s)?;
        Ok((network, Self::decode_body(&s[1..])?))
    }

    /// Decode everything after the network prefix.
    fn decode_body(body: &str) -> Result<Self, AddressError> {
        let mut chars = body.chars();
        let digit = chars
            .next()
            .ok_or_else(|| AddressError::InvalidAddressFormat("missing protocol".into()))?;
        let protocol = Protocol::from_digit(digit)?;
        let raw = chars.as_str();

        match protocol {
            Protocol::Id => Self::new_id(parse_decimal(raw, "actor id")?),
            Protocol::Delegated => {
                let (ns, encoded) = raw.split_once('f').ok_or_else(|| {
                    AddressError::InvalidAddressFormat("missing delegated separator".into())
                })?;
                let namespace = parse_decimal(ns, "namespace")?;
                let data = from_base32(encoded)?;
                let (sub, cks) = split_checksum(&data)?;
                let mut payload = leb128_encode(namespace);
                payload.extend_from_slice(sub);
                verify_checksum(protocol, &payload, cks)?;
                Self::new_delegated(namespace, sub.to_vec())
            }
            _ => {
                let data = from_base32(raw)?;
                let (payload, cks) = split_checksum(&data)?;
                verify_checksum(protocol, payload, cks)?;
                Self::from_payload(protocol, payload)
            }
        }
    }

    fn from_payload(protocol: Protocol, payload: &[u8]) -> Result<Self, AddressError> {
        let bad_len = || AddressError::InvalidPayloadLength {
            protocol: protocol.as_byte(),
            len: payload.len(),
        };
        match protocol {
            Protocol::Id => match leb128_decode(payload) {
                Some((id, used)) if used == payload.len() => Self::new_id(id),
                _ => Err(AddressError::InvalidAddressFormat(
                    "malformed actor id varint".into(),
                )),
            },
            Protocol::Secp256k1 => Ok(Address::Secp256k1(
                payload.try_into().map_err(|_| bad_len())?,
            )),
            Protocol::Actor => Ok(Address::Actor(payload.try_into().map_err(|_| bad_len())?)),
            Protocol::Bls => Ok(Address::Bls(payload.try_into().map_err(|_| bad_len())?)),
            Protocol::Delegated => {
                let (namespace, used) = leb128_decode(payload).ok_or_else(|| {
                    AddressError::InvalidAddressFormat("malformed namespace varint".into())
                })?;
                Self::new_delegated(namespace, payload[used..].to_vec())
            }
        }
    }
}

/// An [`Address`] together with the network prefix it is rendered under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NetworkAddress {
    network: Network,
    address: Address,
}

impl NetworkAddress {
    pub fn new(network: Network, address: Address) -> Self {
        Self { network, address }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn into_address(self) -> Address {
        self.address
    }

    pub fn protocol(&self) -> Protocol {
        self.address.protocol()
    }

    /// Parse a string that must belong to `network`.
    pub fn parse(s: &str, network: Network) -> Result<Self, AddressError> {
        Ok(Self::new(network, Address::decode(s, network)?))
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address.encode(self.network))
    }
}

impl FromStr for NetworkAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (network, address) = Address::decode_any(s)?;
        Ok(Self { network, address })
    }
}

impl Serialize for NetworkAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NetworkAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// --- String-form internals ---

fn parse_prefix(s: &str) -> Result<Network, AddressError> {
    if s.len() < 3 || s.len() > MAX_ADDRESS_STRING_LEN {
        return Err(AddressError::InvalidAddressFormat(format!(
            "invalid length {}",
            s.len()
        )));
    }
    if !s.is_ascii() {
        return Err(AddressError::InvalidAddressFormat(
            "non-ascii characters".into(),
        ));
    }
    Network::from_prefix_char(s.as_bytes()[0] as char)
}

/// Canonical decimal: digits only, no sign, no leading zeros.
fn parse_decimal(s: &str, what: &str) -> Result<u64, AddressError> {
    let canonical = !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && (s == "0" || !s.starts_with('0'));
    if !canonical {
        return Err(AddressError::InvalidAddressFormat(format!(
            "malformed {what} '{s}'"
        )));
    }
    s.parse::<u64>()
        .map_err(|_| AddressError::InvalidAddressFormat(format!("{what} '{s}' out of range")))
}

fn split_checksum(data: &[u8]) -> Result<(&[u8], &[u8]), AddressError> {
    if data.len() < CHECKSUM_LEN {
        return Err(AddressError::InvalidAddressFormat(
            "too short for a checksum".into(),
        ));
    }
    Ok(data.split_at(data.len() - CHECKSUM_LEN))
}

fn verify_checksum(protocol: Protocol, payload: &[u8], expected: &[u8]) -> Result<(), AddressError> {
    let mut ingest = Vec::with_capacity(1 + payload.len());
    ingest.push(protocol.as_byte());
    ingest.extend_from_slice(payload);
    if checksum(&ingest) != expected {
        return Err(AddressError::InvalidChecksum);
    }
    Ok(())
}

pub(crate) fn to_base32(data: &[u8]) -> String {
    // 8-bit input always converts.
    convert_bits(data, 8, 5, true)
        .unwrap_or_default()
        .into_iter()
        .map(|d| BASE32_ALPHABET[d as usize] as char)
        .collect()
}

pub(crate) fn from_base32(s: &str) -> Result<Vec<u8>, AddressError> {
    let mut groups = Vec::with_capacity(s.len());
    for c in s.chars() {
        let pos = BASE32_ALPHABET
            .iter()
            .position(|&ch| ch as char == c)
            .ok_or_else(|| AddressError::InvalidAddressFormat(format!("invalid character '{c}'")))?;
        groups.push(pos as u8);
    }
    convert_bits(&groups, 5, 8, false)
        .ok_or_else(|| AddressError::InvalidAddressFormat("non-canonical base32".into()))
}

/// Convert between bit widths (8-bit bytes to 5-bit base32 groups and back).
///
/// Without padding, leftover bits must be fewer than `from_bits` and all zero,
/// which rejects base32 strings that no byte string encodes to.
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut ret = Vec::with_capacity(data.len() * from_bits as usize / to_bits as usize + 1);
    let maxv = (1u32 << to_bits) - 1;
    for &value in data {
        let v = value as u32;
        if v >> from_bits != 0 {
            return None;
        }
        acc = (acc << from_bits) | v;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            ret.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            ret.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return None;
    }
    Some(ret)
}

// --- LEB128 ---

pub(crate) fn leb128_encode(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Decode a minimal unsigned LEB128 varint, returning the value and bytes used.
pub(crate) fn leb128_decode(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in bytes.iter().enumerate().take(10) {
        let low = (byte & 0x7f) as u64;
        if i == 9 && low > 1 {
            return None;
        }
        value |= low << (7 * i);
        if byte & 0x80 == 0 {
            // A trailing zero group means the encoding was not minimal.
            if i > 0 && byte == 0 {
                return None;
            }
            return Some((value, i + 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq20() -> [u8; 20] {
        let mut out = [0u8; 20];
        for (i, b) in out.iter_mut().enumerate() {
            *b = i as u8;
        }
        out
    }

    fn eam_sub() -> Vec<u8> {
        hex::decode("689c9b3232210aa9b84ef444d0ef35d11102ad1f").unwrap()
    }

    // --- Encoding vectors ---

    #[test]
    fn encode_id() {
        assert_eq!(Address::Id(1234).encode(Network::Mainnet), "f01234");
        assert_eq!(Address::Id(0).encode(Network::Testnet), "t00");
    }

    #[test]
    fn encode_secp256k1_vector() {
        let addr = Address::Secp256k1(seq20());
        assert_eq!(
            addr.encode(Network::Mainnet),
            "f1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pvy"
        );
        assert_eq!(
            addr.encode(Network::Testnet),
            "t1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pvy"
        );
    }

    #[test]
    fn encode_zero_secp256k1_vector() {
        assert_eq!(
            Address::Secp256k1([0u8; 20]).encode(Network::Mainnet),
            "f1aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaahaui6xa"
        );
    }

    #[test]
    fn encode_actor_vector() {
        assert_eq!(
            Address::Actor(seq20()).encode(Network::Testnet),
            "t2aaaqeayeaudaocajbifqydiob4ibceqtuzr55aq"
        );
    }

    #[test]
    fn encode_bls_vector() {
        let encoded = Address::Bls([0xab; 48]).encode(Network::Mainnet);
        assert_eq!(
            encoded,
            "f3vov2xk5lvov2xk5lvov2xk5lvov2xk5lvov2xk5lvov2xk5lvov2xk5lvov2xk5lvov2xk5lvov2wxsbptga"
        );
        assert_eq!(encoded.len(), 86);
    }

    #[test]
    fn encode_delegated_vectors() {
        let eam = Address::new_delegated(10, eam_sub()).unwrap();
        assert_eq!(
            eam.encode(Network::Testnet),
            "t410fncojwmrseefktoco6rcnb3zv2eiqfli7muhvqma"
        );
        let other = Address::new_delegated(32, vec![1, 2, 3]).unwrap();
        assert_eq!(other.encode(Network::Mainnet), "f432faebagooc3nqa");
        let empty = Address::new_delegated(32, vec![]).unwrap();
        assert_eq!(empty.encode(Network::Mainnet), "f432f44lgtuy");
    }

    #[test]
    fn secp256k1_testnet_shape() {
        let encoded = Address::Secp256k1([0x5a; 20]).encode(Network::Testnet);
        assert_eq!(encoded.len(), 41);
        assert!(encoded.starts_with("t1"));
        assert!(encoded[2..]
            .bytes()
            .all(|b| b.is_ascii_lowercase() || (b'2'..=b'7').contains(&b)));
    }

    // --- Decoding ---

    #[test]
    fn decode_roundtrip_all_protocols() {
        let addrs = [
            Address::Id(0),
            Address::Id(MAX_ACTOR_ID),
            Address::Secp256k1(seq20()),
            Address::Actor([0xff; 20]),
            Address::Bls([0x11; 48]),
            Address::new_delegated(10, eam_sub()).unwrap(),
            Address::new_delegated(999, vec![7; 54]).unwrap(),
            Address::new_delegated(0, vec![]).unwrap(),
        ];
        for net in [Network::Mainnet, Network::Testnet] {
            for addr in &addrs {
                let encoded = addr.encode(net);
                assert_eq!(&Address::decode(&encoded, net).unwrap(), addr, "{encoded}");
                assert_eq!(Address::decode_any(&encoded).unwrap(), (net, addr.clone()));
            }
        }
    }

    #[test]
    fn decode_wrong_network() {
        let encoded = Address::Secp256k1(seq20()).encode(Network::Testnet);
        assert!(matches!(
            Address::decode(&encoded, Network::Mainnet).unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
    }

    #[test]
    fn decode_unknown_prefix() {
        assert!(matches!(
            Address::decode_any("x1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pvy").unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
    }

    #[test]
    fn decode_bad_protocol() {
        assert_eq!(
            Address::decode_any("f5aaaqeayeaudaocajbifqydiob4ibceqt2oc2pvy").unwrap_err(),
            AddressError::InvalidProtocol("5".into())
        );
        assert!(matches!(
            Address::decode_any("fxaaaqeayeaudaocajbifqydiob4ibceqt2oc2pvy").unwrap_err(),
            AddressError::InvalidProtocol(_)
        ));
    }

    #[test]
    fn decode_bad_checksum() {
        // Last data character changed.
        assert_eq!(
            Address::decode_any("f1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pva").unwrap_err(),
            AddressError::InvalidChecksum
        );
        // Same body under another protocol digit.
        assert_eq!(
            Address::decode_any("f2aaaqeayeaudaocajbifqydiob4ibceqt2oc2pvy").unwrap_err(),
            AddressError::InvalidChecksum
        );
    }

    #[test]
    fn decode_checksum_checked_before_length() {
        // A 19-byte payload with a valid checksum is a length error.
        let mut data = vec![9u8; 19];
        let mut ingest = vec![1u8];
        ingest.extend_from_slice(&data);
        data.extend_from_slice(&checksum(&ingest));
        let s = format!("f1{}", to_base32(&data));
        assert_eq!(
            Address::decode_any(&s).unwrap_err(),
            AddressError::InvalidPayloadLength { protocol: 1, len: 19 }
        );
    }

    #[test]
    fn decode_bls_wrong_length() {
        let mut data = vec![3u8; 20];
        let mut ingest = vec![3u8];
        ingest.extend_from_slice(&data);
        data.extend_from_slice(&checksum(&ingest));
        let s = format!("t3{}", to_base32(&data));
        assert_eq!(
            Address::decode(&s, Network::Testnet).unwrap_err(),
            AddressError::InvalidPayloadLength { protocol: 3, len: 20 }
        );
    }

    #[test]
    fn decode_rejects_uppercase() {
        assert!(matches!(
            Address::decode_any("F1AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQT2OC2PVY").unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
        assert!(matches!(
            Address::decode_any("f1aaaqeayeaudaocajbifqydiob4ibceqT2oc2pvy").unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
    }

    #[test]
    fn decode_rejects_non_alphabet_chars() {
        for bad in [
            "f1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pv1",
            "f1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pv=",
            "f1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pvé",
        ] {
            assert!(matches!(
                Address::decode_any(bad).unwrap_err(),
                AddressError::InvalidAddressFormat(_)
            ));
        }
    }

    #[test]
    fn decode_rejects_non_canonical_padding_bits() {
        // 'z' sets trailing bits that no 24-byte string produces.
        assert!(matches!(
            Address::decode_any("f1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pvz").unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
    }

    #[test]
    fn decode_length_bounds() {
        assert!(matches!(
            Address::decode_any("").unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
        assert!(matches!(
            Address::decode_any("f0").unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
        let long = format!("f1{}", "a".repeat(MAX_ADDRESS_STRING_LEN));
        assert!(matches!(
            Address::decode_any(&long).unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
    }

    #[test]
    fn decode_id_edge_cases() {
        assert_eq!(Address::decode("f00", Network::Mainnet).unwrap(), Address::Id(0));
        for bad in ["f001", "f0-1", "f0+1", "f01a", "f09223372036854775808"] {
            assert!(
                matches!(
                    Address::decode_any(bad).unwrap_err(),
                    AddressError::InvalidAddressFormat(_)
                ),
                "{bad}"
            );
        }
        assert_eq!(
            Address::decode_any("f09223372036854775807").unwrap().1,
            Address::Id(i64::MAX as u64)
        );
    }

    #[test]
    fn decode_delegated_errors() {
        // Namespace checksum covers the namespace.
        assert_eq!(
            Address::decode_any("t411fncojwmrseefktoco6rcnb3zv2eiqfli7muhvqma").unwrap_err(),
            AddressError::InvalidChecksum
        );
        assert!(matches!(
            Address::decode_any("t4ffncojwmrseefktoco6rcnb3zv2eiqfli7muhvqma").unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
        assert!(matches!(
            Address::decode_any("t410").unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
    }

    #[test]
    fn decode_eam_requires_20_bytes() {
        let sub = vec![1u8; 19];
        let mut ingest = vec![4u8];
        ingest.extend_from_slice(&leb128_encode(10));
        ingest.extend_from_slice(&sub);
        let mut data = sub.clone();
        data.extend_from_slice(&checksum(&ingest));
        let s = format!("f410f{}", to_base32(&data));
        assert_eq!(
            Address::decode_any(&s).unwrap_err(),
            AddressError::InvalidPayloadLength { protocol: 4, len: 19 }
        );
    }

    // --- Constructors ---

    #[test]
    fn new_secp256k1_hashes_key() {
        let key = [4u8; 65];
        assert_eq!(
            Address::new_secp256k1(&key).unwrap(),
            Address::Secp256k1(blake2b_160(&key))
        );
        assert_eq!(
            Address::new_secp256k1(&[4u8; 33]).unwrap_err(),
            AddressError::InvalidPayloadLength { protocol: 1, len: 33 }
        );
    }

    #[test]
    fn new_bls_length() {
        assert!(Address::new_bls(&[1u8; 48]).is_ok());
        assert_eq!(
            Address::new_bls(&[1u8; 47]).unwrap_err(),
            AddressError::InvalidPayloadLength { protocol: 3, len: 47 }
        );
    }

    #[test]
    fn new_delegated_limits() {
        assert!(Address::new_delegated(10, vec![0; 21]).is_err());
        assert!(Address::new_delegated(11, vec![0; 54]).is_ok());
        assert!(Address::new_delegated(11, vec![0; 55]).is_err());
        assert!(Address::new_delegated(u64::MAX, vec![]).is_err());
    }

    #[test]
    fn new_id_range() {
        assert!(Address::new_id(MAX_ACTOR_ID).is_ok());
        assert!(Address::new_id(MAX_ACTOR_ID + 1).is_err());
    }

    // --- Binary form ---

    #[test]
    fn to_bytes_layout() {
        assert_eq!(Address::Id(1234).to_bytes(), vec![0x00, 0xd2, 0x09]);
        assert_eq!(Address::Id(1).to_bytes(), vec![0x00, 0x01]);
        let secp = Address::Secp256k1(seq20()).to_bytes();
        assert_eq!(secp[0], 1);
        assert_eq!(&secp[1..], &seq20());
        let deleg = Address::new_delegated(10, eam_sub()).unwrap().to_bytes();
        assert_eq!(&deleg[..2], &[4, 10]);
        assert_eq!(deleg.len(), 22);
    }

    #[test]
    fn from_bytes_roundtrip() {
        for addr in [
            Address::Id(1234),
            Address::Secp256k1(seq20()),
            Address::Actor(seq20()),
            Address::Bls([9; 48]),
            Address::new_delegated(10, eam_sub()).unwrap(),
        ] {
            assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr);
        }
    }

    #[test]
    fn from_bytes_errors() {
        assert!(matches!(
            Address::from_bytes(&[]).unwrap_err(),
            AddressError::InvalidAddressFormat(_)
        ));
        assert_eq!(
            Address::from_bytes(&[7, 1, 2]).unwrap_err(),
            AddressError::InvalidProtocol("7".into())
        );
        assert_eq!(
            Address::from_bytes(&[1, 1, 2]).unwrap_err(),
            AddressError::InvalidPayloadLength { protocol: 1, len: 2 }
        );
        // Non-minimal varint.
        assert!(Address::from_bytes(&[0, 0x81, 0x00]).is_err());
        // Trailing bytes after the id.
        assert!(Address::from_bytes(&[0, 0x01, 0x01]).is_err());
    }

    // --- LEB128 ---

    #[test]
    fn leb128_vectors() {
        assert_eq!(leb128_encode(0), vec![0]);
        assert_eq!(leb128_encode(127), vec![0x7f]);
        assert_eq!(leb128_encode(128), vec![0x80, 0x01]);
        assert_eq!(leb128_encode(1234), vec![0xd2, 0x09]);
        assert_eq!(leb128_encode(u64::MAX).len(), 10);
    }

    #[test]
    fn leb128_decode_roundtrip() {
        for v in [0u64, 1, 127, 128, 300, 1 << 35, u64::MAX] {
            let enc = leb128_encode(v);
            assert_eq!(leb128_decode(&enc), Some((v, enc.len())));
        }
    }

    #[test]
    fn leb128_decode_rejects_overflow_and_truncation() {
        assert_eq!(leb128_decode(&[0x80]), None);
        assert_eq!(leb128_decode(&[0xff; 10]), None);
        assert_eq!(leb128_decode(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02]), None);
    }

    // --- NetworkAddress ---

    #[test]
    fn network_address_display_and_parse() {
        let s = "t1aaaqeayeaudaocajbifqydiob4ibceqt2oc2pvy";
        let na: NetworkAddress = s.parse().unwrap();
        assert_eq!(na.network(), Network::Testnet);
        assert_eq!(na.protocol(), Protocol::Secp256k1);
        assert_eq!(na.to_string(), s);
        assert!(NetworkAddress::parse(s, Network::Mainnet).is_err());
    }

    #[test]
    fn network_address_serde_string() {
        let na = NetworkAddress::new(Network::Mainnet, Address::Id(42));
        let json = serde_json::to_string(&na).unwrap();
        assert_eq!(json, "\"f042\"");
        let back: NetworkAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, na);
        assert!(serde_json::from_str::<NetworkAddress>("\"f0x\"").is_err());
    }

    // --- Base32 internals ---

    #[test]
    fn base32_rfc4648_vectors() {
        assert_eq!(to_base32(b""), "");
        assert_eq!(to_base32(b"f"), "my");
        assert_eq!(to_base32(b"fo"), "mzxq");
        assert_eq!(to_base32(b"foobar"), "mzxw6ytboi");
        assert_eq!(from_base32("mzxw6ytboi").unwrap(), b"foobar");
    }

    #[test]
    fn base32_rejects_impossible_lengths() {
        // One leftover character (5 bits) cannot come from whole bytes.
        assert!(from_base32("a").is_err());
        assert!(from_base32("mzx").is_err());
    }
}
