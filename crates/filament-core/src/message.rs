//! Value-transfer messages and their signed form.
//!
//! # Canonical encoding
//!
//! A message serializes to a 10-element DAG-CBOR array:
//!
//! ```text
//! [version, to, from, nonce, value, gas_limit, gas_fee_cap, gas_premium, method, params]
//! ```
//!
//! Addresses are byte strings of their binary form, token amounts are byte
//! strings of their big-integer form, and `params` is a byte string. The
//! message CID is taken over these bytes, and signatures are made over the
//! CID bytes.

use crate::address::Address;
use crate::cbor::{Decoder, Encoder};
use crate::cid::Cid;
use crate::constants::{MESSAGE_VERSION, METHOD_SEND};
use crate::crypto::{KeyPair, Signature, SignatureType};
use crate::error::{CryptoError, MessageError, TokenError};
use crate::token::Token;

const MESSAGE_FIELDS: usize = 10;

/// Gas settings chosen by the node's estimator (or by hand).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasParams {
    pub gas_limit: i64,
    pub gas_fee_cap: Token,
    pub gas_premium: Token,
}

impl GasParams {
    fn validate(&self) -> Result<(), MessageError> {
        if self.gas_limit < 0 {
            return Err(MessageError::NegativeGasLimit(self.gas_limit));
        }
        if self.gas_premium > self.gas_fee_cap {
            return Err(MessageError::PremiumExceedsFeeCap {
                premium: self.gas_premium.atto(),
                fee_cap: self.gas_fee_cap.atto(),
            });
        }
        Ok(())
    }
}

/// An unsigned message. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    version: u64,
    to: Address,
    from: Address,
    nonce: u64,
    value: Token,
    gas: GasParams,
    method: u64,
    params: Vec<u8>,
}

impl Message {
    /// Start a message from `from` to `to`. Defaults: nonce 0, zero value,
    /// zero gas, method 0 (plain send), empty params.
    pub fn builder(from: Address, to: Address) -> MessageBuilder {
        MessageBuilder {
            to,
            from,
            nonce: 0,
            value: Token::zero(),
            gas: GasParams::default(),
            method: METHOD_SEND,
            params: Vec::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn to(&self) -> &Address {
        &self.to
    }

    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn value(&self) -> Token {
        self.value
    }

    pub fn gas(&self) -> GasParams {
        self.gas
    }

    pub fn gas_limit(&self) -> i64 {
        self.gas.gas_limit
    }

    pub fn gas_fee_cap(&self) -> Token {
        self.gas.gas_fee_cap
    }

    pub fn gas_premium(&self) -> Token {
        self.gas.gas_premium
    }

    pub fn method(&self) -> u64 {
        self.method
    }

    pub fn params(&self) -> &[u8] {
        &self.params
    }

    /// A copy of this message with different gas settings.
    pub fn with_gas(&self, gas: GasParams) -> Result<Message, MessageError> {
        gas.validate()?;
        Ok(Message {
            gas,
            ..self.clone()
        })
    }

    /// A copy of this message with a different nonce.
    pub fn with_nonce(&self, nonce: u64) -> Message {
        Message {
            nonce,
            ..self.clone()
        }
    }

    /// Most the sender can be charged: `value + gas_fee_cap * gas_limit`.
    pub fn required_funds(&self) -> Result<Token, TokenError> {
        let gas = self.gas.gas_fee_cap.checked_mul(self.gas.gas_limit as u128)?;
        self.value.checked_add(gas)
    }

    /// Canonical DAG-CBOR encoding.
    pub fn to_cbor(&self) -> Vec<u8> {
        Encoder::new()
            .array(MESSAGE_FIELDS)
            .uint(self.version)
            .bytes(&self.to.to_bytes())
            .bytes(&self.from.to_bytes())
            .uint(self.nonce)
            .bytes(&self.value.to_bigint_bytes())
            .int(self.gas.gas_limit)
            .bytes(&self.gas.gas_fee_cap.to_bigint_bytes())
            .bytes(&self.gas.gas_premium.to_bigint_bytes())
            .uint(self.method)
            .bytes(&self.params)
            .finish()
    }

    /// Decode the canonical encoding. Rejects trailing bytes.
    pub fn from_cbor(data: &[u8]) -> Result<Self, MessageError> {
        let mut d = Decoder::new(data);
        let message = Self::decode(&mut d)?;
        d.finish()?;
        Ok(message)
    }

    fn decode(d: &mut Decoder<'_>) -> Result<Self, MessageError> {
        let fields = d.array()?;
        if fields != MESSAGE_FIELDS {
            return Err(MessageError::Malformed(format!(
                "expected {MESSAGE_FIELDS} fields, found {fields}"
            )));
        }
        let version = d.uint()?;
        if version != MESSAGE_VERSION {
            return Err(MessageError::Malformed(format!(
                "unsupported message version {version}"
            )));
        }
        let to = Address::from_bytes(d.bytes()?)?;
        let from = Address::from_bytes(d.bytes()?)?;
        let nonce = d.uint()?;
        let value = Token::from_bigint_bytes(d.bytes()?)?;
        let gas = GasParams {
            gas_limit: d.int()?,
            gas_fee_cap: Token::from_bigint_bytes(d.bytes()?)?,
            gas_premium: Token::from_bigint_bytes(d.bytes()?)?,
        };
        let method = d.uint()?;
        let params = d.bytes()?.to_vec();
        Message::builder(from, to)
            .nonce(nonce)
            .value(value)
            .gas(gas)
            .method(method)
            .params(params)
            .build()
    }

    /// CID of the canonical encoding.
    pub fn cid(&self) -> Cid {
        Cid::from_cbor(&self.to_cbor())
    }
}

/// Builder for [`Message`]; validation happens in [`MessageBuilder::build`].
#[derive(Clone, Debug)]
pub struct MessageBuilder {
    to: Address,
    from: Address,
    nonce: u64,
    value: Token,
    gas: GasParams,
    method: u64,
    params: Vec<u8>,
}

impl MessageBuilder {
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn value(mut self, value: Token) -> Self {
        self.value = value;
        self
    }

    pub fn gas(mut self, gas: GasParams) -> Self {
        self.gas = gas;
        self
    }

    pub fn method(mut self, method: u64) -> Self {
        self.method = method;
        self
    }

    pub fn params(mut self, params: Vec<u8>) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<Message, MessageError> {
        self.gas.validate()?;
        Ok(Message {
            version: MESSAGE_VERSION,
            to: self.to,
            from: self.from,
            nonce: self.nonce,
            value: self.value,
            gas: self.gas,
            method: self.method,
            params: self.params,
        })
    }
}

/// A message with the sender's signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage {
    message: Message,
    signature: Signature,
}

impl SignedMessage {
    /// Sign `message` with `key`, which must own the sender address.
    pub fn sign(message: Message, key: &KeyPair) -> Result<Self, CryptoError> {
        let signer = key.address();
        if &signer != message.from() {
            return Err(CryptoError::SignerMismatch {
                signer: format!("{signer:?}"),
                from: format!("{:?}", message.from()),
            });
        }
        let signature = key.sign(message.cid().as_bytes())?;
        Ok(Self { message, signature })
    }

    /// Pair a message with an existing signature without checking it.
    pub fn new_unchecked(message: Message, signature: Signature) -> Self {
        Self { message, signature }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn into_parts(self) -> (Message, Signature) {
        (self.message, self.signature)
    }

    /// Check the signature against the message sender.
    pub fn verify(&self) -> Result<(), CryptoError> {
        self.signature
            .verify(self.message.cid().as_bytes(), self.message.from())
    }

    /// `[message, signature bytes]`.
    pub fn to_cbor(&self) -> Vec<u8> {
        Encoder::new()
            .array(2)
            .raw(&self.message.to_cbor())
            .bytes(&self.signature.to_bytes())
            .finish()
    }

    pub fn from_cbor(data: &[u8]) -> Result<Self, MessageError> {
        let mut d = Decoder::new(data);
        if d.array()? != 2 {
            return Err(MessageError::Malformed("signed message must have 2 fields".into()));
        }
        let message = Message::decode(&mut d)?;
        let signature = Signature::from_bytes(d.bytes()?)
            .map_err(|e| MessageError::Malformed(e.to_string()))?;
        d.finish()?;
        Ok(Self { message, signature })
    }

    /// BLS messages are identified by the unsigned message CID (their
    /// signatures are aggregated in blocks); secp256k1 messages by the CID of
    /// the signed encoding.
    pub fn cid(&self) -> Cid {
        match self.signature.sig_type() {
            SignatureType::Bls => self.message.cid(),
            SignatureType::Secp256k1 => Cid::from_cbor(&self.to_cbor()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq20() -> [u8; 20] {
        let mut out = [0u8; 20];
        for (i, b) in out.iter_mut().enumerate() {
            *b = i as u8;
        }
        out
    }

    fn sample_gas() -> GasParams {
        GasParams {
            gas_limit: 1_000_000,
            gas_fee_cap: Token::from(200),
            gas_premium: Token::zero(),
        }
    }

    fn sample() -> Message {
        Message::builder(Address::Secp256k1(seq20()), Address::Id(1))
            .nonce(5)
            .value(Token::from(100))
            .gas(sample_gas())
            .build()
            .unwrap()
    }

    #[test]
    fn cbor_vector() {
        assert_eq!(
            hex::encode(sample().to_cbor()),
            "8a004200015501000102030405060708090a0b0c0d0e0f10111213054200641a000f42404200c8400040"
        );
    }

    #[test]
    fn cid_vector() {
        assert_eq!(
            sample().cid().to_string(),
            "bafy2bzaceaqu7uycvc4jqxwkhcz5pkaxrqlgj5hjr2dcniruvj4f24xnvstvg"
        );
    }

    #[test]
    fn cbor_decode() {
        let msg = sample();
        assert_eq!(Message::from_cbor(&msg.to_cbor()).unwrap(), msg);
        let mut trailing = msg.to_cbor();
        trailing.push(0);
        assert!(Message::from_cbor(&trailing).is_err());
        assert!(Message::from_cbor(&[0x80]).is_err());
    }

    #[test]
    fn builder_defaults() {
        let msg = Message::builder(Address::Id(2), Address::Id(3)).build().unwrap();
        assert_eq!(msg.version(), 0);
        assert_eq!(msg.method(), METHOD_SEND);
        assert_eq!(msg.nonce(), 0);
        assert!(msg.value().is_zero());
        assert!(msg.params().is_empty());
    }

    #[test]
    fn builder_rejects_bad_gas() {
        let negative = GasParams {
            gas_limit: -1,
            ..sample_gas()
        };
        assert_eq!(
            Message::builder(Address::Id(2), Address::Id(3))
                .gas(negative)
                .build()
                .unwrap_err(),
            MessageError::NegativeGasLimit(-1)
        );
        let premium = GasParams {
            gas_premium: Token::from(201),
            ..sample_gas()
        };
        assert!(matches!(
            sample().with_gas(premium).unwrap_err(),
            MessageError::PremiumExceedsFeeCap { .. }
        ));
    }

    #[test]
    fn with_gas_leaves_original() {
        let msg = sample();
        let updated = msg
            .with_gas(GasParams {
                gas_limit: 5,
                ..sample_gas()
            })
            .unwrap();
        assert_eq!(msg.gas_limit(), 1_000_000);
        assert_eq!(updated.gas_limit(), 5);
        assert_ne!(msg.cid(), updated.cid());
        assert_eq!(msg.with_nonce(9).nonce(), 9);
    }

    #[test]
    fn required_funds() {
        assert_eq!(sample().required_funds().unwrap(), Token::from(100 + 200_000_000));
    }

    #[test]
    fn sign_and_verify_secp() {
        let key = KeyPair::from_private_key(SignatureType::Secp256k1, &[7; 32]).unwrap();
        let msg = Message::builder(key.address(), Address::Id(1))
            .value(Token::from(1))
            .build()
            .unwrap();
        let signed = SignedMessage::sign(msg.clone(), &key).unwrap();
        signed.verify().unwrap();
        assert_ne!(signed.cid(), msg.cid());
        let decoded = SignedMessage::from_cbor(&signed.to_cbor()).unwrap();
        assert_eq!(decoded, signed);
        assert_eq!(decoded.cid(), signed.cid());
    }

    #[test]
    fn sign_and_verify_bls() {
        let key = KeyPair::from_private_key(SignatureType::Bls, &[7; 32]).unwrap();
        let msg = Message::builder(key.address(), Address::Id(1)).build().unwrap();
        let signed = SignedMessage::sign(msg.clone(), &key).unwrap();
        signed.verify().unwrap();
        assert_eq!(signed.cid(), msg.cid());
    }

    #[test]
    fn signer_must_own_sender() {
        let key = KeyPair::from_private_key(SignatureType::Secp256k1, &[7; 32]).unwrap();
        assert!(matches!(
            SignedMessage::sign(sample(), &key).unwrap_err(),
            CryptoError::SignerMismatch { .. }
        ));
    }

    #[test]
    fn tampered_message_fails_verification() {
        let key = KeyPair::from_private_key(SignatureType::Secp256k1, &[7; 32]).unwrap();
        let msg = Message::builder(key.address(), Address::Id(1)).build().unwrap();
        let signed = SignedMessage::sign(msg, &key).unwrap();
        let (msg, sig) = signed.into_parts();
        let tampered = SignedMessage::new_unchecked(msg.with_nonce(1), sig);
        assert!(tampered.verify().is_err());
    }
}
