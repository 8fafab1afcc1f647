//! BLAKE2b digests used by addresses, checksums and message CIDs.

use crate::constants::{CHECKSUM_LEN, PAYLOAD_HASH_LEN};

/// BLAKE2b with an arbitrary output length (1..=64 bytes).
pub fn blake2b(data: &[u8], len: usize) -> Vec<u8> {
    blake2b_simd::Params::new()
        .hash_length(len)
        .hash(data)
        .as_bytes()
        .to_vec()
}

/// BLAKE2b-160, the address payload hash for secp256k1 keys and actors.
pub fn blake2b_160(data: &[u8]) -> [u8; PAYLOAD_HASH_LEN] {
    let mut out = [0u8; PAYLOAD_HASH_LEN];
    out.copy_from_slice(&blake2b(data, PAYLOAD_HASH_LEN));
    out
}

/// BLAKE2b-256, used for CIDs and as the secp256k1 signing digest.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&blake2b(data, 32));
    out
}

/// 4-byte BLAKE2b address checksum.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&blake2b(data, CHECKSUM_LEN));
    out
}
