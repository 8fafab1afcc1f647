//! Node-facing data types and their Lotus JSON shapes.
//!
//! Lotus encodes structs with PascalCase keys, token amounts as decimal
//! strings, byte strings as standard base64 (`null` when empty) and CIDs as
//! `{"/": "<cid>"}`. Addresses travel in their string form, so converting a
//! message to JSON needs the network it is rendered for.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use filament_core::address::{Address, NetworkAddress};
use filament_core::cid::Cid;
use filament_core::crypto::{Signature, SignatureType};
use filament_core::message::{GasParams, Message, SignedMessage};
use filament_core::network::Network;
use filament_core::token::Token;

use crate::error::RpcError;

/// On-chain state of an actor, as far as accounts care.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActorState {
    pub nonce: u64,
    pub balance: Token,
}

/// Execution result of a message included on chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Receipt {
    pub exit_code: i64,
    #[serde(rename = "Return", default, with = "base64_bytes")]
    pub return_data: Vec<u8>,
    pub gas_used: i64,
}

/// Where a message landed: `StateSearchMsg` result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MsgLookup {
    /// CID of the message that executed (may differ from the searched CID
    /// when the node allows replacement).
    pub message: Cid,
    pub receipt: Receipt,
    pub height: i64,
}

/// `ChainHead` result, reduced to the epoch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct TipSetHeight {
    pub height: i64,
}

/// Lotus JSON form of an unsigned [`Message`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LotusMessage {
    pub version: u64,
    pub to: String,
    pub from: String,
    pub nonce: u64,
    pub value: Token,
    pub gas_limit: i64,
    pub gas_fee_cap: Token,
    pub gas_premium: Token,
    pub method: u64,
    #[serde(default, with = "base64_bytes")]
    pub params: Vec<u8>,
}

impl LotusMessage {
    pub fn from_message(message: &Message, network: Network) -> Self {
        Self {
            version: message.version(),
            to: message.to().encode(network),
            from: message.from().encode(network),
            nonce: message.nonce(),
            value: message.value(),
            gas_limit: message.gas_limit(),
            gas_fee_cap: message.gas_fee_cap(),
            gas_premium: message.gas_premium(),
            method: message.method(),
            params: message.params().to_vec(),
        }
    }

    pub fn gas(&self) -> GasParams {
        GasParams {
            gas_limit: self.gas_limit,
            gas_fee_cap: self.gas_fee_cap,
            gas_premium: self.gas_premium,
        }
    }

    pub fn to_message(&self) -> Result<Message, RpcError> {
        let message = Message::builder(parse_address(&self.from)?, parse_address(&self.to)?)
            .nonce(self.nonce)
            .value(self.value)
            .gas(self.gas())
            .method(self.method)
            .params(self.params.clone())
            .build()?;
        Ok(message)
    }
}

fn parse_address(s: &str) -> Result<Address, RpcError> {
    Ok(s.parse::<NetworkAddress>()?.into_address())
}

/// Lotus JSON form of a [`Signature`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LotusSignature {
    #[serde(rename = "Type")]
    pub sig_type: u8,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl From<&Signature> for LotusSignature {
    fn from(sig: &Signature) -> Self {
        Self {
            sig_type: sig.sig_type().as_byte(),
            data: sig.data().to_vec(),
        }
    }
}

impl LotusSignature {
    pub fn to_signature(&self) -> Result<Signature, RpcError> {
        let sig_type = SignatureType::try_from(self.sig_type)?;
        Ok(Signature::new(sig_type, self.data.clone())?)
    }
}

/// Lotus JSON form of a [`SignedMessage`], as sent to `MpoolPush`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LotusSignedMessage {
    pub message: LotusMessage,
    pub signature: LotusSignature,
}

impl LotusSignedMessage {
    pub fn from_signed(signed: &SignedMessage, network: Network) -> Self {
        Self {
            message: LotusMessage::from_message(signed.message(), network),
            signature: LotusSignature::from(signed.signature()),
        }
    }

    pub fn to_signed(&self) -> Result<SignedMessage, RpcError> {
        Ok(SignedMessage::new_unchecked(
            self.message.to_message()?,
            self.signature.to_signature()?,
        ))
    }
}

/// Base64 byte strings where `null` and `""` both mean empty.
mod base64_bytes {
    use super::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if bytes.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&STANDARD.encode(bytes))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Vec::new()),
            Some(s) => STANDARD.decode(s).map_err(serde::de::Error::custom),
        }
    }
}
