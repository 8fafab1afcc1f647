//! Protocol constants.
//!
//! Lengths, namespaces and tags that are fixed by the network's wire formats.

/// SLIP-44 coin type for mainnet derivation paths.
pub const MAINNET_COIN_TYPE: u32 = 461;

/// SLIP-44 coin type shared by all test networks.
pub const TESTNET_COIN_TYPE: u32 = 1;

/// BIP-44 purpose level.
pub const BIP44_PURPOSE: u32 = 44;

/// Length of the address checksum in bytes.
pub const CHECKSUM_LEN: usize = 4;

/// Length of secp256k1 and actor address payloads (blake2b-160).
pub const PAYLOAD_HASH_LEN: usize = 20;

/// Length of a compressed BLS public key (G1).
pub const BLS_PUBLIC_KEY_LEN: usize = 48;

/// Length of a BLS signature (compressed G2).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Length of an uncompressed SEC1 secp256k1 public key.
pub const SECP_PUBLIC_KEY_LEN: usize = 65;

/// Length of a recoverable secp256k1 signature: `r ++ s ++ recovery id`.
pub const SECP_SIGNATURE_LEN: usize = 65;

/// Length of private keys for both signature schemes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Longest delegated sub-address accepted.
pub const MAX_SUBADDRESS_LEN: usize = 54;

/// Delegated namespace of the Ethereum Address Manager actor.
pub const EAM_NAMESPACE: u64 = 10;

/// Length of an Ethereum address.
pub const ETH_ADDRESS_LEN: usize = 20;

/// Largest actor ID that can appear in an ID address.
pub const MAX_ACTOR_ID: u64 = i64::MAX as u64;

/// Longest address string accepted by the decoder: a delegated address with a
/// 20-digit namespace and a 54-byte sub-address.
pub const MAX_ADDRESS_STRING_LEN: usize = 116;

/// Method number of a plain value transfer.
pub const METHOD_SEND: u64 = 0;

/// Message format version.
pub const MESSAGE_VERSION: u64 = 0;

/// Multicodec for DAG-CBOR.
pub const DAG_CBOR_CODEC: u64 = 0x71;

/// Multihash code for blake2b-256.
pub const BLAKE2B_256_CODE: u64 = 0xb220;

/// Domain separation tag for BLS signatures (proof-of-possession-free "NUL" suite).
pub const BLS_SIG_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Atto per whole token.
pub const ATTO_PER_FIL: u128 = 1_000_000_000_000_000_000;

/// Decimal places of a whole token.
pub const FIL_DECIMALS: usize = 18;
