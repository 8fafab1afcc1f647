//! # filament-rpc: node access for Filament accounts.
//!
//! Sends value and reads balances through a Lotus-compatible JSON-RPC node,
//! and tracks submitted messages until they are executed on chain.
//!
//! # Modules
//!
//! - [`error`]: `RpcError` enum
//! - [`config`]: `RpcConfig` and `WaitOptions`
//! - [`types`]: actor state, receipts and Lotus JSON shapes
//! - [`node`]: the `NodeRpc` trait
//! - [`lotus`]: `LotusClient`, the JSON-RPC implementation
//! - [`nonce`]: per-sender nonce serialization
//! - [`state`]: message lifecycle state machine
//! - [`submitter`]: `wait_msg_state`
//! - [`account`]: `Account::send` and `Account::get_balance`

pub mod account;
pub mod config;
pub mod error;
pub mod lotus;
pub mod node;
pub mod nonce;
pub mod state;
pub mod submitter;
pub mod types;

// Re-exports for convenient access
pub use account::Account;
pub use config::{RpcConfig, WaitOptions};
pub use error::RpcError;
pub use lotus::LotusClient;
pub use node::NodeRpc;
pub use nonce::NonceTracker;
pub use state::{MessageState, TrackedMessage};
pub use submitter::{wait_msg_state, wait_tracked};
pub use types::{ActorState, MsgLookup, Receipt};
