//! Seed management and per-scheme key derivation.
//!
//! secp256k1 keys follow BIP-32 (HMAC-SHA512 chain codes). BLS keys follow
//! EIP-2333, feeding each path level's BIP-32 child number (hardened bit
//! included) in as the EIP-2333 index.

use bip32::{ChildNumber, XPrv};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use filament_core::constants::PRIVATE_KEY_LEN;
use filament_core::crypto::{KeyPair, SignatureType};

use crate::eip2333;
use crate::error::WalletError;
use crate::path::DerivationPath;

/// Length of a BIP-39 seed.
pub const SEED_LEN: usize = 64;

/// A 64-byte BIP-39 seed.
///
/// Secret material is zeroized on drop to prevent leaking key material
/// in freed memory.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; SEED_LEN],
}

impl Seed {
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self { bytes }
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

fn bip32_err(e: bip32::Error) -> WalletError {
    WalletError::KeyDerivation(e.to_string())
}

/// BIP-32 secp256k1 derivation.
pub fn derive_secp256k1(seed: &Seed, path: &DerivationPath) -> Result<KeyPair, WalletError> {
    let mut xprv = XPrv::new(seed.as_bytes()).map_err(bip32_err)?;
    for child in path.children() {
        let number = ChildNumber::new(child.index(), child.hardened()).map_err(bip32_err)?;
        xprv = xprv.derive_child(number).map_err(bip32_err)?;
    }
    let mut secret = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
    secret.copy_from_slice(&xprv.private_key().to_bytes());
    Ok(KeyPair::from_private_key(
        SignatureType::Secp256k1,
        secret.as_slice(),
    )?)
}

/// EIP-2333 BLS derivation.
pub fn derive_bls(seed: &Seed, path: &DerivationPath) -> Result<KeyPair, WalletError> {
    let sk = eip2333::derive_path(seed.as_bytes(), path.child_numbers())?;
    let secret = Zeroizing::new(sk.to_bytes());
    Ok(KeyPair::from_private_key(SignatureType::Bls, secret.as_slice())?)
}

/// Derive the keypair for `sig_type` at `path`.
pub fn derive_keypair(
    seed: &Seed,
    sig_type: SignatureType,
    path: &DerivationPath,
) -> Result<KeyPair, WalletError> {
    match sig_type {
        SignatureType::Secp256k1 => derive_secp256k1(seed, path),
        SignatureType::Bls => derive_bls(seed, path),
    }
}
