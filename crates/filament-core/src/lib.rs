//! # filament-core
//! Networks, addresses, token amounts, keys and messages for Filecoin-style
//! accounts.

pub mod address;
pub mod cbor;
pub mod cid;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod eth;
pub mod hash;
pub mod message;
pub mod network;
pub mod token;

pub use address::{Address, DelegatedAddress, NetworkAddress, Protocol};
pub use cid::Cid;
pub use crypto::{KeyPair, PrivateKey, PublicKey, Signature, SignatureType};
pub use message::{GasParams, Message, MessageBuilder, SignedMessage};
pub use network::{Network, NetworkName, get_network_prefix, validate_network};
pub use token::Token;
