//! # filament-wallet: mnemonic-based account derivation.
//!
//! Turns a BIP-39 mnemonic and a BIP-44 style path into a keypair and its
//! address. secp256k1 keys use BIP-32, BLS keys use EIP-2333.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`mnemonic`]: BIP-39 parsing, seeds, generation
//! - [`path`]: `DerivationPath` parsing and validation
//! - [`eip2333`]: BLS12-381 hierarchical key derivation
//! - [`keys`]: Seed and per-scheme derivation
//! - [`wallet`]: `Wallet::derive_account` and `AccountData`

pub mod eip2333;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod path;
pub mod wallet;

// Re-exports for convenient access
pub use error::WalletError;
pub use keys::{Seed, derive_keypair};
pub use mnemonic::{generate_mnemonic, mnemonic_to_seed, parse_mnemonic};
pub use path::{ChildIndex, DerivationPath};
pub use wallet::{AccountData, Wallet};
