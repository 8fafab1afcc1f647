//! Network selection and address prefixes.
//!
//! Every address string starts with a single prefix character that names the
//! network it belongs to:
//! - Mainnet: `f...`
//! - Testnet (calibration, butterfly): `t...`
//!
//! There is no process-wide "current network". Callers resolve a [`Network`]
//! once with [`get_network_prefix`] and pass it to every encode/decode call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{MAINNET_COIN_TYPE, TESTNET_COIN_TYPE};
use crate::error::AddressError;

/// Network prefix used when rendering and parsing address strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Mainnet (prefix `f`).
    Mainnet,
    /// Any test network (prefix `t`).
    Testnet,
}

impl Network {
    /// Prefix character for this network.
    pub fn prefix_char(&self) -> char {
        match self {
            Network::Mainnet => 'f',
            Network::Testnet => 't',
        }
    }

    /// Look up a network from an address prefix character.
    pub fn from_prefix_char(c: char) -> Result<Self, AddressError> {
        match c {
            'f' => Ok(Network::Mainnet),
            't' => Ok(Network::Testnet),
            _ => Err(AddressError::InvalidAddressFormat(format!(
                "unknown network prefix '{c}'"
            ))),
        }
    }

    /// SLIP-44 coin type used in the second level of derivation paths.
    pub fn coin_type(&self) -> u32 {
        match self {
            Network::Mainnet => MAINNET_COIN_TYPE,
            Network::Testnet => TESTNET_COIN_TYPE,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Named networks a node can run on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkName {
    Mainnet,
    Calibration,
    Butterfly,
}

impl NetworkName {
    /// Address prefix used on this network.
    pub fn prefix(&self) -> Network {
        match self {
            NetworkName::Mainnet => Network::Mainnet,
            NetworkName::Calibration | NetworkName::Butterfly => Network::Testnet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkName::Mainnet => "mainnet",
            NetworkName::Calibration => "calibration",
            NetworkName::Butterfly => "butterfly",
        }
    }
}

impl FromStr for NetworkName {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkName::Mainnet),
            // "testnet" is accepted as a generic alias for the long-running testnet.
            "calibration" | "calibnet" | "testnet" => Ok(NetworkName::Calibration),
            "butterfly" => Ok(NetworkName::Butterfly),
            _ => Err(AddressError::InvalidNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True iff `input` names a recognized network.
pub fn validate_network(input: &str) -> bool {
    input.parse::<NetworkName>().is_ok()
}

/// Resolve the address prefix for a network identifier.
pub fn get_network_prefix(input: &str) -> Result<Network, AddressError> {
    Ok(input.parse::<NetworkName>()?.prefix())
}
