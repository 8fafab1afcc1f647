//! Error types for Filament core types.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid network: {0}")] InvalidNetwork(String),
    #[error("invalid address format: {0}")] InvalidAddressFormat(String),
    #[error("invalid protocol: {0}")] InvalidProtocol(String),
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid payload length for protocol {protocol}: {len} bytes")] InvalidPayloadLength { protocol: u8, len: usize },
    #[error("invalid eth address: {0}")] InvalidEthAddress(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key bytes")] InvalidPrivateKey,
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("unknown signature type: {0}")] UnknownSignatureType(String),
    #[error("signing failed: {0}")] SigningFailed(String),
    #[error("signer {signer} does not own sender {from}")] SignerMismatch { signer: String, from: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid amount: {0}")] InvalidAmount(String),
    #[error("amount overflow")] Overflow,
    #[error("amount underflow")] Underflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("negative gas limit: {0}")] NegativeGasLimit(i64),
    #[error("gas premium {premium} exceeds fee cap {fee_cap}")] PremiumExceedsFeeCap { premium: u128, fee_cap: u128 },
    #[error("malformed message encoding: {0}")] Malformed(String),
    #[error("invalid cid: {0}")] InvalidCid(String),
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Token(#[from] TokenError),
}

