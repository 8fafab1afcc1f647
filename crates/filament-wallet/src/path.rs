//! BIP-44 style derivation paths: `m/44'/<coin>'/<account>[']/<change>[']/<index>[']`.
//!
//! Rules enforced while parsing:
//! - the path starts at the `m` root and segments are `/`-separated
//! - each index is a decimal number below 2^31
//! - a hardened index carries a single trailing `'`
//! - the purpose level is `44'` and the coin type is hardened
//! - at most five levels below the root

use std::fmt;
use std::str::FromStr;

use filament_core::constants::BIP44_PURPOSE;
use filament_core::network::Network;

use crate::error::WalletError;

/// Bit set on a BIP-32 child number for hardened derivation.
pub const HARDENED_BIT: u32 = 1 << 31;

/// Maximum number of levels below `m`.
pub const MAX_DEPTH: usize = 5;

/// One level of a derivation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChildIndex {
    index: u32,
    hardened: bool,
}

impl ChildIndex {
    pub fn new(index: u32, hardened: bool) -> Result<Self, WalletError> {
        if index >= HARDENED_BIT {
            return Err(WalletError::InvalidDerivationPath(format!(
                "index {index} out of range"
            )));
        }
        Ok(Self { index, hardened })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn hardened(&self) -> bool {
        self.hardened
    }

    /// BIP-32 child number: the index with the hardened bit applied.
    pub fn child_number(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_BIT
        } else {
            self.index
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.index, if self.hardened { "'" } else { "" })
    }
}

/// A validated derivation path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    children: Vec<ChildIndex>,
}

impl DerivationPath {
    /// `m/44'/<coin>'/<account>'/0/<index>` for the network's coin type.
    pub fn bip44(network: Network, account: u32, index: u32) -> Result<Self, WalletError> {
        Self::from_children(vec![
            ChildIndex::new(BIP44_PURPOSE, true)?,
            ChildIndex::new(network.coin_type(), true)?,
            ChildIndex::new(account, true)?,
            ChildIndex::new(0, false)?,
            ChildIndex::new(index, false)?,
        ])
    }

    fn from_children(children: Vec<ChildIndex>) -> Result<Self, WalletError> {
        if children.len() > MAX_DEPTH {
            return Err(WalletError::InvalidDerivationPath(format!(
                "{} levels exceeds the maximum of {MAX_DEPTH}",
                children.len()
            )));
        }
        if let Some(purpose) = children.first() {
            if *purpose != ChildIndex::new(BIP44_PURPOSE, true)? {
                return Err(WalletError::InvalidDerivationPath(format!(
                    "purpose must be {BIP44_PURPOSE}', found {purpose}"
                )));
            }
        }
        if let Some(coin) = children.get(1) {
            if !coin.hardened {
                return Err(WalletError::InvalidDerivationPath(format!(
                    "coin type {coin} must be hardened"
                )));
            }
        }
        Ok(Self { children })
    }

    pub fn children(&self) -> &[ChildIndex] {
        &self.children
    }

    /// BIP-32 child numbers in derivation order.
    pub fn child_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.children.iter().map(ChildIndex::child_number)
    }

    /// The coin type level, if present.
    pub fn coin_type(&self) -> Option<u32> {
        self.children.get(1).map(ChildIndex::index)
    }
}

fn parse_segment(segment: &str) -> Result<ChildIndex, WalletError> {
    let (digits, hardened) = match segment.strip_suffix('\'') {
        Some(d) => (d, true),
        None => (segment, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalletError::InvalidDerivationPath(format!(
            "malformed segment '{segment}'"
        )));
    }
    let index = digits.parse::<u32>().map_err(|_| {
        WalletError::InvalidDerivationPath(format!("index '{digits}' out of range"))
    })?;
    ChildIndex::new(index, hardened)
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split('/');
        if segments.next() != Some("m") {
            return Err(WalletError::InvalidDerivationPath(format!(
                "'{s}' does not start at the m root"
            )));
        }
        let children = segments
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_children(children)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for child in &self.children {
            write!(f, "/{child}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<DerivationPath, WalletError> {
        s.parse()
    }

    #[test]
    fn parse_standard_paths() {
        let path = parse("m/44'/461'/0'/0/0").unwrap();
        assert_eq!(path.children().len(), 5);
        assert_eq!(path.coin_type(), Some(461));
        assert_eq!(
            path.child_numbers().collect::<Vec<_>>(),
            vec![HARDENED_BIT + 44, HARDENED_BIT + 461, HARDENED_BIT, 0, 0]
        );
        assert_eq!(path.to_string(), "m/44'/461'/0'/0/0");
        assert!(parse("m/44'/1'/0'/0/1").is_ok());
        assert!(parse("m/44'/1'/0'/0'/7'").is_ok());
    }

    #[test]
    fn parse_short_paths() {
        assert!(parse("m").unwrap().children().is_empty());
        assert!(parse("m/44'").is_ok());
        assert!(parse("m/44'/461'").is_ok());
    }

    #[test]
    fn bip44_constructor() {
        let path = DerivationPath::bip44(Network::Testnet, 0, 3).unwrap();
        assert_eq!(path.to_string(), "m/44'/1'/0'/0/3");
        let main = DerivationPath::bip44(Network::Mainnet, 2, 0).unwrap();
        assert_eq!(main.to_string(), "m/44'/461'/2'/0/0");
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in [
            "",
            "44'/461'/0'/0/0",
            "M/44'/461'/0'/0/0",
            "n/44'/461'/0'/0/0",
            "m/",
            "m//44'",
            "m/44'/461'/0'/0/0/",
            "m/44'/461'/x/0/0",
            "m/44'/461'/-1/0/0",
            "m/44'/461'/+1/0/0",
            "m/44'/461'/0''/0/0",
            "m/44'/461'/'0/0/0",
            "m/44h/461'/0'/0/0",
            "m\\44'\\461'",
            "m/44'/461'/ 0'/0/0",
        ] {
            assert!(
                matches!(parse(bad), Err(WalletError::InvalidDerivationPath(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_index() {
        assert!(parse("m/44'/461'/2147483647'/0/0").is_ok());
        assert!(parse("m/44'/461'/2147483648/0/0").is_err());
        assert!(parse("m/44'/461'/99999999999/0/0").is_err());
    }

    #[test]
    fn rejects_wrong_purpose() {
        assert!(parse("m/49'/461'/0'/0/0").is_err());
        assert!(parse("m/44/461'/0'/0/0").is_err());
    }

    #[test]
    fn rejects_unhardened_coin_type() {
        assert!(parse("m/44'/461/0'/0/0").is_err());
    }

    #[test]
    fn rejects_too_deep() {
        assert!(parse("m/44'/461'/0'/0/0/0").is_err());
    }

    #[test]
    fn child_index_range() {
        assert!(ChildIndex::new(HARDENED_BIT, false).is_err());
        assert_eq!(ChildIndex::new(5, true).unwrap().to_string(), "5'");
    }
}
