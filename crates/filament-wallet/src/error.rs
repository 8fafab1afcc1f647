//! Wallet error types.

use filament_core::error::{AddressError, CryptoError};
use thiserror::Error;

/// Errors that can occur while deriving accounts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Invalid BIP-39 mnemonic phrase (unknown word, bad checksum, wrong length).
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Malformed or unsupported derivation path.
    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    /// Key derivation failure.
    #[error("key derivation: {0}")]
    KeyDerivation(String),

    /// Cryptographic error from filament-core.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Address error from filament-core.
    #[error(transparent)]
    Address(#[from] AddressError),
}
