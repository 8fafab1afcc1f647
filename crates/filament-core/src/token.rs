//! Exact token amounts.
//!
//! Amounts are non-negative integers of atto (10^-18 of a whole token). There
//! is no floating point anywhere: whole-token strings are parsed digit by digit.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{ATTO_PER_FIL, FIL_DECIMALS};
use crate::error::TokenError;

/// A token amount in atto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u128);

impl Token {
    pub const fn zero() -> Self {
        Token(0)
    }

    pub const fn from_atto_u128(atto: u128) -> Self {
        Token(atto)
    }

    /// Parse a decimal atto amount, e.g. `"100"`.
    pub fn from_atto(s: &str) -> Result<Self, TokenError> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TokenError::InvalidAmount(s.to_string()));
        }
        s.parse::<u128>().map(Token).map_err(|_| TokenError::Overflow)
    }

    /// Parse a whole-token decimal amount, e.g. `"1.5"`, with at most 18 fractional digits.
    pub fn from_whole(s: &str) -> Result<Self, TokenError> {
        let s = s.trim();
        let invalid = || TokenError::InvalidAmount(s.to_string());
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let digits_only = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !digits_only(int_part)
            || !digits_only(frac_part)
            || frac_part.len() > FIL_DECIMALS
            || (s.contains('.') && frac_part.is_empty())
        {
            return Err(invalid());
        }
        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| TokenError::Overflow)?
        };
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            let scale = 10u128.pow((FIL_DECIMALS - frac_part.len()) as u32);
            frac_part.parse::<u128>().map_err(|_| invalid())? * scale
        };
        whole
            .checked_mul(ATTO_PER_FIL)
            .and_then(|w| w.checked_add(frac))
            .map(Token)
            .ok_or(TokenError::Overflow)
    }

    pub fn atto(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Token) -> Result<Token, TokenError> {
        self.0.checked_add(other.0).map(Token).ok_or(TokenError::Overflow)
    }

    pub fn checked_sub(self, other: Token) -> Result<Token, TokenError> {
        self.0.checked_sub(other.0).map(Token).ok_or(TokenError::Underflow)
    }

    pub fn checked_mul(self, factor: u128) -> Result<Token, TokenError> {
        self.0.checked_mul(factor).map(Token).ok_or(TokenError::Overflow)
    }

    /// Big-integer byte form: empty for zero, otherwise a `0x00` sign byte
    /// followed by the minimal big-endian magnitude.
    pub fn to_bigint_bytes(&self) -> Vec<u8> {
        if self.0 == 0 {
            return Vec::new();
        }
        let be = self.0.to_be_bytes();
        let start = be.iter().position(|&b| b != 0).unwrap_or(be.len());
        let mut out = Vec::with_capacity(1 + be.len() - start);
        out.push(0);
        out.extend_from_slice(&be[start..]);
        out
    }

    /// Parse the big-integer byte form. Negative amounts are rejected, as
    /// is anything [`Token::to_bigint_bytes`] would not produce.
    pub fn from_bigint_bytes(bytes: &[u8]) -> Result<Self, TokenError> {
        let Some((&sign, magnitude)) = bytes.split_first() else {
            return Ok(Token(0));
        };
        if sign != 0 {
            return Err(TokenError::InvalidAmount("negative amount".into()));
        }
        if magnitude.first().is_none_or(|&b| b == 0) {
            return Err(TokenError::InvalidAmount(
                "non-canonical big-integer bytes".into(),
            ));
        }
        if magnitude.len() > 16 {
            return Err(TokenError::Overflow);
        }
        Ok(Token(
            magnitude.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128),
        ))
    }

    /// Whole-token rendering with trailing fractional zeros trimmed, e.g. `"1.5"`.
    pub fn to_whole_string(&self) -> String {
        let whole = self.0 / ATTO_PER_FIL;
        let frac = self.0 % ATTO_PER_FIL;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:0width$}", width = FIL_DECIMALS);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl From<u128> for Token {
    fn from(atto: u128) -> Self {
        Token(atto)
    }
}

/// Displays the atto amount.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::from_atto(s)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Token::from_atto(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_atto_parses() {
        assert_eq!(Token::from_atto("100").unwrap().atto(), 100);
        assert_eq!(Token::from_atto("0").unwrap(), Token::zero());
        assert!(Token::from_atto("0").unwrap().is_zero());
    }

    #[test]
    fn from_atto_rejects() {
        for bad in ["", "-1", "1.5", "1e3", "abc", "+5"] {
            assert!(matches!(
                Token::from_atto(bad).unwrap_err(),
                TokenError::InvalidAmount(_)
            ));
        }
        assert_eq!(
            Token::from_atto(&"9".repeat(40)).unwrap_err(),
            TokenError::Overflow
        );
    }

    #[test]
    fn from_whole_parses() {
        assert_eq!(Token::from_whole("1").unwrap().atto(), ATTO_PER_FIL);
        assert_eq!(
            Token::from_whole("1.5").unwrap().atto(),
            1_500_000_000_000_000_000
        );
        assert_eq!(Token::from_whole(".000000000000000001").unwrap().atto(), 1);
        assert_eq!(Token::from_whole("0.000000000000000001").unwrap().atto(), 1);
    }

    #[test]
    fn from_whole_rejects() {
        for bad in ["", ".", "1.", "1.2.3", "-1", "0.0000000000000000001", "1,5"] {
            assert!(Token::from_whole(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn whole_string() {
        assert_eq!(Token::from_atto_u128(0).to_whole_string(), "0");
        assert_eq!(Token::from_whole("2").unwrap().to_whole_string(), "2");
        assert_eq!(Token::from_whole("1.25").unwrap().to_whole_string(), "1.25");
        assert_eq!(Token::from_atto_u128(1).to_whole_string(), "0.000000000000000001");
    }

    #[test]
    fn checked_arithmetic() {
        let a = Token::from(10);
        let b = Token::from(3);
        assert_eq!(a.checked_add(b).unwrap(), Token::from(13));
        assert_eq!(a.checked_sub(b).unwrap(), Token::from(7));
        assert_eq!(b.checked_sub(a).unwrap_err(), TokenError::Underflow);
        assert_eq!(
            Token::from(u128::MAX).checked_add(b).unwrap_err(),
            TokenError::Overflow
        );
        assert_eq!(b.checked_mul(4).unwrap(), Token::from(12));
    }

    #[test]
    fn ordering() {
        assert!(Token::from(1) < Token::from(2));
        assert_eq!(Token::default(), Token::zero());
    }

    #[test]
    fn bigint_bytes() {
        assert!(Token::zero().to_bigint_bytes().is_empty());
        assert_eq!(Token::from(100).to_bigint_bytes(), vec![0x00, 0x64]);
        assert_eq!(Token::from(256).to_bigint_bytes(), vec![0x00, 0x01, 0x00]);
        assert_eq!(Token::from(u128::MAX).to_bigint_bytes().len(), 17);
    }

    #[test]
    fn bigint_bytes_parse() {
        assert_eq!(Token::from_bigint_bytes(&[]).unwrap(), Token::zero());
        assert_eq!(Token::from_bigint_bytes(&[0, 1, 0]).unwrap(), Token::from(256));
        assert!(Token::from_bigint_bytes(&[1, 5]).is_err());
        let mut too_long = vec![0, 1];
        too_long.extend([0; 16]);
        assert_eq!(
            Token::from_bigint_bytes(&too_long).unwrap_err(),
            TokenError::Overflow
        );
        let max = Token::from(u128::MAX);
        assert_eq!(Token::from_bigint_bytes(&max.to_bigint_bytes()).unwrap(), max);
    }

    #[test]
    fn bigint_bytes_must_be_minimal() {
        for bytes in [&[0u8][..], &[0, 0], &[0, 0, 1], &[0; 18]] {
            assert!(
                matches!(
                    Token::from_bigint_bytes(bytes),
                    Err(TokenError::InvalidAmount(_))
                ),
                "{bytes:?} accepted"
            );
        }
    }

    #[test]
    fn serde_as_string() {
        let t = Token::from(12345);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"12345\"");
        let back: Token = serde_json::from_str("\"12345\"").unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<Token>("12345").is_err());
    }

    // --- proptest ---

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn whole_string_parses_back(atto in any::<u128>()) {
            let t = Token::from(atto);
            prop_assert_eq!(Token::from_whole(&t.to_whole_string()).unwrap(), t);
            prop_assert_eq!(Token::from_atto(&t.to_string()).unwrap(), t);
        }

        #[test]
        fn add_then_sub_is_identity(a in any::<u64>(), b in any::<u64>()) {
            let (a, b) = (Token::from(a as u128), Token::from(b as u128));
            prop_assert_eq!(a.checked_add(b).unwrap().checked_sub(b).unwrap(), a);
        }
    }
}
