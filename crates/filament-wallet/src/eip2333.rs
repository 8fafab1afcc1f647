//! EIP-2333 BLS12-381 key derivation.
//!
//! Keys form a tree: the master key comes from the seed through `HKDF_mod_r`,
//! and each child key is `HKDF_mod_r` of the compressed Lamport public key
//! built from its parent and the child index. Unlike BIP-32 there is no
//! chain code and every derivation is hardened.

use bls12_381::Scalar;
use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::WalletError;

const KEYGEN_SALT: &[u8] = b"BLS-SIG-KEYGEN-SALT-";
/// Output length of `HKDF_mod_r`: ceil(3 * ceil(log2(r)) / 16).
const HKDF_MOD_R_LEN: usize = 48;
const LAMPORT_CHUNKS: usize = 255;
const MIN_SEED_LEN: usize = 32;

fn expand_err(e: hkdf::InvalidLength) -> WalletError {
    WalletError::KeyDerivation(format!("hkdf expand: {e}"))
}

/// Reduce a 48-byte big-endian integer modulo the group order.
fn scalar_from_okm(okm: &[u8; HKDF_MOD_R_LEN]) -> Scalar {
    let mut wide = Zeroizing::new([0u8; 64]);
    for (dst, src) in wide.iter_mut().zip(okm.iter().rev()) {
        *dst = *src;
    }
    Scalar::from_bytes_wide(&wide)
}

fn hkdf_mod_r(ikm: &[u8]) -> Result<Scalar, WalletError> {
    let mut ikm_zero = Zeroizing::new(Vec::with_capacity(ikm.len() + 1));
    ikm_zero.extend_from_slice(ikm);
    ikm_zero.push(0);
    // key_info is empty, followed by I2OSP(L, 2).
    let info = (HKDF_MOD_R_LEN as u16).to_be_bytes();

    let mut salt = Sha256::digest(KEYGEN_SALT);
    loop {
        let hk = Hkdf::<Sha256>::new(Some(salt.as_slice()), ikm_zero.as_slice());
        let mut okm = Zeroizing::new([0u8; HKDF_MOD_R_LEN]);
        hk.expand(&info, okm.as_mut_slice()).map_err(expand_err)?;
        let sk = scalar_from_okm(&okm);
        if sk != Scalar::zero() {
            return Ok(sk);
        }
        salt = Sha256::digest(salt);
    }
}

fn ikm_to_lamport_sk(ikm: &[u8], salt: &[u8]) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = Zeroizing::new(vec![0u8; LAMPORT_CHUNKS * 32]);
    hk.expand(&[], &mut okm).map_err(expand_err)?;
    Ok(okm)
}

fn parent_sk_to_lamport_pk(parent: &Scalar, index: u32) -> Result<[u8; 32], WalletError> {
    let salt = index.to_be_bytes();
    let mut ikm = Zeroizing::new(parent.to_bytes());
    ikm.reverse();
    let mut not_ikm = Zeroizing::new([0u8; 32]);
    for (dst, src) in not_ikm.iter_mut().zip(ikm.iter()) {
        *dst = !*src;
    }
    let lamport_0 = ikm_to_lamport_sk(ikm.as_slice(), &salt)?;
    let lamport_1 = ikm_to_lamport_sk(not_ikm.as_slice(), &salt)?;

    let mut hasher = Sha256::new();
    for chunk in lamport_0.chunks(32).chain(lamport_1.chunks(32)) {
        hasher.update(Sha256::digest(chunk));
    }
    Ok(hasher.finalize().into())
}

/// Master secret key from a seed of at least 32 bytes.
pub fn derive_master_sk(seed: &[u8]) -> Result<Scalar, WalletError> {
    if seed.len() < MIN_SEED_LEN {
        return Err(WalletError::KeyDerivation(format!(
            "seed must be at least {MIN_SEED_LEN} bytes, got {}",
            seed.len()
        )));
    }
    hkdf_mod_r(seed)
}

/// Child secret key at `index`.
pub fn derive_child_sk(parent: &Scalar, index: u32) -> Result<Scalar, WalletError> {
    let lamport_pk = parent_sk_to_lamport_pk(parent, index)?;
    hkdf_mod_r(&lamport_pk)
}

/// Walk a sequence of child indices from the master key.
pub fn derive_path(seed: &[u8], indices: impl IntoIterator<Item = u32>) -> Result<Scalar, WalletError> {
    let mut sk = derive_master_sk(seed)?;
    for index in indices {
        sk = derive_child_sk(&sk, index)?;
    }
    Ok(sk)
}
