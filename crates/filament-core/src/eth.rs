//! Conversions between Ethereum-style 20-byte addresses and delegated addresses.
//!
//! An Ethereum address maps to a protocol-4 address in the EAM namespace (10).
//! Mixed-case input must carry a valid EIP-55 checksum.

use sha3::{Digest, Keccak256};

use crate::address::{Address, NetworkAddress};
use crate::constants::{EAM_NAMESPACE, ETH_ADDRESS_LEN};
use crate::error::AddressError;
use crate::network::Network;

/// Leading byte of an ID address masked into the Ethereum address space.
const MASKED_ID_PREFIX: u8 = 0xff;

impl Address {
    /// Convert a hex Ethereum address (`0x` optional) to a delegated EAM address.
    pub fn from_eth_address(input: &str) -> Result<Self, AddressError> {
        let bytes = parse_eth_address(input)?;
        Address::new_delegated(EAM_NAMESPACE, bytes.to_vec())
    }

    /// The 20-byte Ethereum form of this address.
    ///
    /// EAM delegated addresses map to their sub-address. ID addresses map to
    /// the masked form `0xff ++ 11 zero bytes ++ big-endian id`.
    pub fn to_eth_bytes(&self) -> Result<[u8; ETH_ADDRESS_LEN], AddressError> {
        match self {
            Address::Delegated(d) if d.namespace() == EAM_NAMESPACE => d
                .subaddress()
                .try_into()
                .map_err(|_| AddressError::InvalidEthAddress("malformed EAM sub-address".into())),
            Address::Id(id) => {
                let mut out = [0u8; ETH_ADDRESS_LEN];
                out[0] = MASKED_ID_PREFIX;
                out[12..].copy_from_slice(&id.to_be_bytes());
                Ok(out)
            }
            other => Err(AddressError::InvalidEthAddress(format!(
                "protocol {} address has no eth form",
                other.protocol()
            ))),
        }
    }

    /// Lowercase `0x`-prefixed Ethereum form.
    pub fn to_eth_address(&self) -> Result<String, AddressError> {
        Ok(format!("0x{}", hex::encode(self.to_eth_bytes()?)))
    }

    /// EIP-55 checksummed Ethereum form.
    pub fn to_checksum_eth_address(&self) -> Result<String, AddressError> {
        Ok(to_checksum(&self.to_eth_bytes()?))
    }
}

impl NetworkAddress {
    /// Convert a hex Ethereum address to a delegated address on `network`.
    pub fn from_eth_address(network: Network, input: &str) -> Result<Self, AddressError> {
        Ok(NetworkAddress::new(network, Address::from_eth_address(input)?))
    }
}

/// Parse 40 hex digits with an optional `0x` prefix, enforcing EIP-55 on mixed case.
pub fn parse_eth_address(input: &str) -> Result<[u8; ETH_ADDRESS_LEN], AddressError> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.len() != ETH_ADDRESS_LEN * 2 {
        return Err(AddressError::InvalidEthAddress(format!(
            "expected 40 hex digits, got {}",
            digits.len()
        )));
    }
    let mut bytes = [0u8; ETH_ADDRESS_LEN];
    hex::decode_to_slice(digits, &mut bytes)
        .map_err(|e| AddressError::InvalidEthAddress(e.to_string()))?;

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&bytes)[2..] != *digits {
        return Err(AddressError::InvalidEthAddress(
            "EIP-55 checksum mismatch".into(),
        ));
    }
    Ok(bytes)
}

/// EIP-55 mixed-case rendering of a 20-byte address.
pub fn to_checksum(bytes: &[u8; ETH_ADDRESS_LEN]) -> String {
    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());
    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
