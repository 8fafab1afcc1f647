//! BIP-39 mnemonic parsing, seed derivation and generation.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::keys::Seed;

/// Word counts BIP-39 defines, with their entropy length in bytes.
const WORD_COUNTS: [(usize, usize); 5] = [(12, 16), (15, 20), (18, 24), (21, 28), (24, 32)];

/// Parse an English BIP-39 phrase, validating words and checksum.
///
/// Normalizes whitespace and converts to lowercase before parsing.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = Zeroizing::new(
        phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    );
    Mnemonic::parse_in(Language::English, normalized.as_str())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Compute the 64-byte BIP-39 seed (PBKDF2-HMAC-SHA512) of a phrase and passphrase.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<Seed, WalletError> {
    let mnemonic = parse_mnemonic(phrase)?;
    Ok(Seed::from_bytes(mnemonic.to_seed(passphrase)))
}

/// Generate a fresh English mnemonic with `word_count` words from OS randomness.
pub fn generate_mnemonic(word_count: usize) -> Result<String, WalletError> {
    let entropy_len = WORD_COUNTS
        .iter()
        .find(|(words, _)| *words == word_count)
        .map(|(_, len)| *len)
        .ok_or_else(|| {
            WalletError::InvalidMnemonic(format!(
                "unsupported word count {word_count}, expected 12, 15, 18, 21 or 24"
            ))
        })?;
    let mut entropy = Zeroizing::new(vec![0u8; entropy_len]);
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(mnemonic.to_string())
}
