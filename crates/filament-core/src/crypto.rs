//! Keys and signatures for the two supported signature schemes.
//!
//! # Signing scheme
//!
//! - **secp256k1**: ECDSA with RFC-6979 nonces over `blake2b-256(data)`. The
//!   65-byte signature is `r ++ s ++ recovery id`, so the signer's public key
//!   (and address) can be recovered from it.
//! - **BLS**: BLS12-381 min-pk signatures. Public keys are compressed G1
//!   points (48 bytes), signatures compressed G2 points (96 bytes), and
//!   messages are hashed to G2 with the `_NUL_` ciphersuite DST.
//!
//! Private key bytes are a big-endian scalar for secp256k1 and a
//! little-endian scalar for BLS.

use bls12_381::hash_to_curve::{ExpandMsgXmd, HashToCurve};
use bls12_381::{G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use k256::ecdsa::{RecoveryId, SigningKey, VerifyingKey};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::address::Address;
use crate::constants::{
    BLS_PUBLIC_KEY_LEN, BLS_SIGNATURE_LEN, BLS_SIG_DST, PRIVATE_KEY_LEN, SECP_PUBLIC_KEY_LEN,
    SECP_SIGNATURE_LEN,
};
use crate::error::CryptoError;
use crate::hash::blake2b_256;

/// Signature scheme; the discriminant is the wire signature-type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SignatureType {
    Secp256k1 = 1,
    Bls = 2,
}

impl SignatureType {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Signature length in bytes.
    pub fn signature_len(self) -> usize {
        match self {
            SignatureType::Secp256k1 => SECP_SIGNATURE_LEN,
            SignatureType::Bls => BLS_SIGNATURE_LEN,
        }
    }
}

impl TryFrom<u8> for SignatureType {
    type Error = CryptoError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b {
            1 => Ok(SignatureType::Secp256k1),
            2 => Ok(SignatureType::Bls),
            _ => Err(CryptoError::InvalidSignature),
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureType::Secp256k1 => write!(f, "secp256k1"),
            SignatureType::Bls => write!(f, "bls"),
        }
    }
}

impl FromStr for SignatureType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "secp256k1" | "secp" => Ok(SignatureType::Secp256k1),
            "bls" => Ok(SignatureType::Bls),
            _ => Err(CryptoError::UnknownSignatureType(s.to_string())),
        }
    }
}

/// 32-byte private key material. Zeroized on drop, redacted in `Debug`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    bytes: [u8; PRIVATE_KEY_LEN],
}

impl PrivateKey {
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Raw key bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.bytes
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self { bytes: self.bytes }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Public key for either scheme.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PublicKey {
    /// Uncompressed SEC1 point (65 bytes).
    Secp256k1([u8; SECP_PUBLIC_KEY_LEN]),
    /// Compressed G1 point (48 bytes).
    Bls([u8; BLS_PUBLIC_KEY_LEN]),
}

impl PublicKey {
    pub fn sig_type(&self) -> SignatureType {
        match self {
            PublicKey::Secp256k1(_) => SignatureType::Secp256k1,
            PublicKey::Bls(_) => SignatureType::Bls,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PublicKey::Secp256k1(b) => b,
            PublicKey::Bls(b) => b,
        }
    }

    /// Protocol 1 address for secp256k1 keys, protocol 3 for BLS keys.
    pub fn address(&self) -> Address {
        match self {
            PublicKey::Secp256k1(b) => Address::Secp256k1(crate::hash::blake2b_160(b)),
            PublicKey::Bls(b) => Address::Bls(*b),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.sig_type(), hex::encode(self.as_bytes()))
    }
}

/// A signature tagged with its scheme.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    sig_type: SignatureType,
    data: Vec<u8>,
}

impl Signature {
    pub fn new(sig_type: SignatureType, data: Vec<u8>) -> Result<Self, CryptoError> {
        if data.len() != sig_type.signature_len() {
            return Err(CryptoError::InvalidSignature);
        }
        Ok(Self { sig_type, data })
    }

    pub fn sig_type(&self) -> SignatureType {
        self.sig_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Wire form: signature-type byte followed by the signature data.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.data.len());
        out.push(self.sig_type.as_byte());
        out.extend_from_slice(&self.data);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let (&tag, data) = bytes.split_first().ok_or(CryptoError::InvalidSignature)?;
        Self::new(SignatureType::try_from(tag)?, data.to_vec())
    }

    /// Check that `signer` produced this signature over `data`.
    pub fn verify(&self, data: &[u8], signer: &Address) -> Result<(), CryptoError> {
        match (self.sig_type, signer) {
            (SignatureType::Secp256k1, Address::Secp256k1(_)) => {
                let recovered = recover_secp256k1(data, &self.data)?;
                if &recovered.address() != signer {
                    return Err(CryptoError::VerificationFailed);
                }
                Ok(())
            }
            (SignatureType::Bls, Address::Bls(public_key)) => {
                verify_bls(data, &self.data, public_key)
            }
            _ => Err(CryptoError::VerificationFailed),
        }
    }
}

/// Recover the signing public key from a 65-byte recoverable signature.
pub fn recover_secp256k1(data: &[u8], signature: &[u8]) -> Result<PublicKey, CryptoError> {
    if signature.len() != SECP_SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature);
    }
    let digest = blake2b_256(data);
    let sig = k256::ecdsa::Signature::from_slice(&signature[..64])
        .map_err(|_| CryptoError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(signature[64]).ok_or(CryptoError::InvalidSignature)?;
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| CryptoError::VerificationFailed)?;
    let mut out = [0u8; SECP_PUBLIC_KEY_LEN];
    out.copy_from_slice(key.to_encoded_point(false).as_bytes());
    Ok(PublicKey::Secp256k1(out))
}

fn hash_to_g2(data: &[u8]) -> G2Affine {
    let point = <G2Projective as HashToCurve<ExpandMsgXmd<sha2_09::Sha256>>>::hash_to_curve(
        data,
        BLS_SIG_DST,
    );
    G2Affine::from(point)
}

fn verify_bls(
    data: &[u8],
    signature: &[u8],
    public_key: &[u8; BLS_PUBLIC_KEY_LEN],
) -> Result<(), CryptoError> {
    let sig_bytes: [u8; BLS_SIGNATURE_LEN] = signature
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature)?;
    let sig: G2Affine = Option::from(G2Affine::from_compressed(&sig_bytes))
        .ok_or(CryptoError::InvalidSignature)?;
    let pk: G1Affine = Option::from(G1Affine::from_compressed(public_key))
        .ok_or(CryptoError::InvalidPublicKey)?;
    if bool::from(pk.is_identity()) {
        return Err(CryptoError::InvalidPublicKey);
    }
    let lhs = bls12_381::pairing(&pk, &hash_to_g2(data));
    let rhs = bls12_381::pairing(&G1Affine::generator(), &sig);
    if lhs != rhs {
        return Err(CryptoError::VerificationFailed);
    }
    Ok(())
}

fn bls_scalar(bytes: &[u8; PRIVATE_KEY_LEN]) -> Result<Scalar, CryptoError> {
    let scalar: Scalar =
        Option::from(Scalar::from_bytes(bytes)).ok_or(CryptoError::InvalidPrivateKey)?;
    if scalar == Scalar::zero() {
        return Err(CryptoError::InvalidPrivateKey);
    }
    Ok(scalar)
}

/// A private key together with its public key.
#[derive(Clone)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Build a keypair from raw private key bytes.
    pub fn from_private_key(sig_type: SignatureType, bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PRIVATE_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidPrivateKey)?;
        let private_key = PrivateKey::from_bytes(bytes);
        let public_key = match sig_type {
            SignatureType::Secp256k1 => {
                let signing_key = SigningKey::from_slice(private_key.as_bytes())
                    .map_err(|_| CryptoError::InvalidPrivateKey)?;
                let mut out = [0u8; SECP_PUBLIC_KEY_LEN];
                out.copy_from_slice(
                    signing_key.verifying_key().to_encoded_point(false).as_bytes(),
                );
                PublicKey::Secp256k1(out)
            }
            SignatureType::Bls => {
                let scalar = bls_scalar(private_key.as_bytes())?;
                let point = G1Affine::from(G1Projective::generator() * scalar);
                PublicKey::Bls(point.to_compressed())
            }
        };
        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate(sig_type: SignatureType) -> Self {
        use rand::RngCore;
        loop {
            let bytes = match sig_type {
                SignatureType::Secp256k1 => {
                    let mut raw = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
                    rand::rngs::OsRng.fill_bytes(&mut *raw);
                    *raw
                }
                SignatureType::Bls => {
                    let mut wide = Zeroizing::new([0u8; 64]);
                    rand::rngs::OsRng.fill_bytes(&mut *wide);
                    Scalar::from_bytes_wide(&wide).to_bytes()
                }
            };
            // Rejects the (negligible) out-of-range and zero draws.
            if let Ok(kp) = Self::from_private_key(sig_type, &bytes) {
                return kp;
            }
        }
    }

    pub fn sig_type(&self) -> SignatureType {
        self.public_key.sig_type()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn address(&self) -> Address {
        self.public_key.address()
    }

    /// Sign arbitrary bytes (for messages: the CID bytes).
    pub fn sign(&self, data: &[u8]) -> Result<Signature, CryptoError> {
        match self.sig_type() {
            SignatureType::Secp256k1 => {
                let signing_key = SigningKey::from_slice(self.private_key.as_bytes())
                    .map_err(|_| CryptoError::InvalidPrivateKey)?;
                let digest = blake2b_256(data);
                let (sig, recovery_id) = signing_key
                    .sign_prehash_recoverable(&digest)
                    .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
                let mut out = Vec::with_capacity(SECP_SIGNATURE_LEN);
                out.extend_from_slice(&sig.to_bytes());
                out.push(recovery_id.to_byte());
                Signature::new(SignatureType::Secp256k1, out)
            }
            SignatureType::Bls => {
                let scalar = bls_scalar(self.private_key.as_bytes())?;
                let point = G2Affine::from(G2Projective::from(hash_to_g2(data)) * scalar);
                Signature::new(SignatureType::Bls, point.to_compressed().to_vec())
            }
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secp_key() -> KeyPair {
        KeyPair::from_private_key(SignatureType::Secp256k1, &[0x11; 32]).unwrap()
    }

    fn bls_key() -> KeyPair {
        KeyPair::from_private_key(SignatureType::Bls, &[0x11; 32]).unwrap()
    }

    #[test]
    fn signature_type_bytes() {
        assert_eq!(SignatureType::Secp256k1.as_byte(), 1);
        assert_eq!(SignatureType::Bls.as_byte(), 2);
        assert_eq!(SignatureType::try_from(2).unwrap(), SignatureType::Bls);
        assert!(SignatureType::try_from(3).is_err());
    }

    #[test]
    fn signature_type_parse() {
        assert_eq!("BLS".parse::<SignatureType>().unwrap(), SignatureType::Bls);
        assert_eq!(
            "secp256k1".parse::<SignatureType>().unwrap(),
            SignatureType::Secp256k1
        );
        assert!("ed25519".parse::<SignatureType>().is_err());
    }

    #[test]
    fn secp_public_key_shape() {
        let kp = secp_key();
        let bytes = kp.public_key().as_bytes();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], 0x04);
        assert!(matches!(kp.address(), Address::Secp256k1(_)));
    }

    #[test]
    fn secp_known_public_key() {
        // Private key 1 is the generator point.
        let mut one = [0u8; 32];
        one[31] = 1;
        let kp = KeyPair::from_private_key(SignatureType::Secp256k1, &one).unwrap();
        assert_eq!(
            hex::encode(&kp.public_key().as_bytes()[1..33]),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn bls_public_key_shape() {
        let kp = bls_key();
        assert_eq!(kp.public_key().as_bytes().len(), 48);
        assert_eq!(kp.address(), Address::Bls(kp.public_key().as_bytes().try_into().unwrap()));
    }

    #[test]
    fn invalid_private_keys() {
        assert_eq!(
            KeyPair::from_private_key(SignatureType::Secp256k1, &[0u8; 32]).unwrap_err(),
            CryptoError::InvalidPrivateKey
        );
        assert_eq!(
            KeyPair::from_private_key(SignatureType::Secp256k1, &[0xff; 32]).unwrap_err(),
            CryptoError::InvalidPrivateKey
        );
        assert_eq!(
            KeyPair::from_private_key(SignatureType::Bls, &[0u8; 32]).unwrap_err(),
            CryptoError::InvalidPrivateKey
        );
        assert_eq!(
            KeyPair::from_private_key(SignatureType::Bls, &[0xff; 32]).unwrap_err(),
            CryptoError::InvalidPrivateKey
        );
        assert_eq!(
            KeyPair::from_private_key(SignatureType::Bls, &[1u8; 31]).unwrap_err(),
            CryptoError::InvalidPrivateKey
        );
    }

    #[test]
    fn secp_sign_verify() {
        let kp = secp_key();
        let sig = kp.sign(b"hello").unwrap();
        assert_eq!(sig.sig_type(), SignatureType::Secp256k1);
        assert_eq!(sig.data().len(), 65);
        sig.verify(b"hello", &kp.address()).unwrap();
        assert_eq!(
            sig.verify(b"world", &kp.address()).unwrap_err(),
            CryptoError::VerificationFailed
        );
    }

    #[test]
    fn secp_sign_deterministic() {
        let kp = secp_key();
        assert_eq!(kp.sign(b"msg").unwrap(), kp.sign(b"msg").unwrap());
    }

    #[test]
    fn secp_recover_matches_key() {
        let kp = secp_key();
        let sig = kp.sign(b"recover me").unwrap();
        assert_eq!(&recover_secp256k1(b"recover me", sig.data()).unwrap(), kp.public_key());
    }

    #[test]
    fn bls_sign_verify() {
        let kp = bls_key();
        let sig = kp.sign(b"hello").unwrap();
        assert_eq!(sig.data().len(), 96);
        sig.verify(b"hello", &kp.address()).unwrap();
        assert_eq!(
            sig.verify(b"other", &kp.address()).unwrap_err(),
            CryptoError::VerificationFailed
        );
        assert_eq!(kp.sign(b"hello").unwrap(), sig);
    }

    #[test]
    fn wrong_signer_fails() {
        let a = secp_key();
        let b = KeyPair::from_private_key(SignatureType::Secp256k1, &[0x22; 32]).unwrap();
        let sig = a.sign(b"data").unwrap();
        assert!(sig.verify(b"data", &b.address()).is_err());
        // Scheme and address protocol must agree.
        assert!(sig.verify(b"data", &bls_key().address()).is_err());
    }

    #[test]
    fn signature_bytes_roundtrip() {
        let sig = secp_key().sign(b"x").unwrap();
        let bytes = sig.to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(Signature::from_bytes(&bytes).unwrap(), sig);
        assert!(Signature::from_bytes(&bytes[..10]).is_err());
        assert!(Signature::from_bytes(&[]).is_err());
    }

    #[test]
    fn signature_length_enforced() {
        assert!(Signature::new(SignatureType::Bls, vec![0; 65]).is_err());
        assert!(Signature::new(SignatureType::Secp256k1, vec![0; 65]).is_ok());
    }

    #[test]
    fn generate_produces_valid_keys() {
        for t in [SignatureType::Secp256k1, SignatureType::Bls] {
            let kp = KeyPair::generate(t);
            let sig = kp.sign(b"gen").unwrap();
            sig.verify(b"gen", &kp.address()).unwrap();
        }
    }

    #[test]
    fn debug_redacts_private_key() {
        let kp = secp_key();
        let debug = format!("{kp:?} {:?}", kp.private_key());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&hex::encode([0x11u8; 32])));
    }
}
