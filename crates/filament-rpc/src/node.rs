//! The node collaborator seam.
//!
//! Everything that needs chain state or the message pool goes through
//! [`NodeRpc`]. [`crate::lotus::LotusClient`] implements it over JSON-RPC;
//! tests substitute in-memory nodes.

use std::sync::Arc;

use async_trait::async_trait;

use filament_core::address::Address;
use filament_core::cid::Cid;
use filament_core::message::{GasParams, Message, SignedMessage};
use filament_core::network::Network;

use crate::error::RpcError;
use crate::types::{ActorState, MsgLookup};

/// Operations a Lotus-compatible node provides.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Network the node serves.
    fn network(&self) -> Network;

    /// Next nonce for `address` as the node sees it, pending messages included.
    async fn get_nonce(&self, address: &Address) -> Result<u64, RpcError>;

    /// Gas limit, fee cap and premium for `message`.
    async fn estimate_gas(&self, message: &Message) -> Result<GasParams, RpcError>;

    /// Push a signed message into the message pool. Never retried.
    async fn submit(&self, signed: &SignedMessage) -> Result<Cid, RpcError>;

    /// Actor state, or [`RpcError::AccountNotFound`] for unknown addresses.
    async fn get_actor_state(&self, address: &Address) -> Result<ActorState, RpcError>;

    /// Look for an executed message; `None` while it is not on chain.
    async fn search_msg(&self, cid: &Cid) -> Result<Option<MsgLookup>, RpcError>;

    /// Current chain head epoch.
    async fn chain_height(&self) -> Result<i64, RpcError>;
}

#[async_trait]
impl<T: NodeRpc + ?Sized> NodeRpc for Arc<T> {
    fn network(&self) -> Network {
        (**self).network()
    }

    async fn get_nonce(&self, address: &Address) -> Result<u64, RpcError> {
        (**self).get_nonce(address).await
    }

    async fn estimate_gas(&self, message: &Message) -> Result<GasParams, RpcError> {
        (**self).estimate_gas(message).await
    }

    async fn submit(&self, signed: &SignedMessage) -> Result<Cid, RpcError> {
        (**self).submit(signed).await
    }

    async fn get_actor_state(&self, address: &Address) -> Result<ActorState, RpcError> {
        (**self).get_actor_state(address).await
    }

    async fn search_msg(&self, cid: &Cid) -> Result<Option<MsgLookup>, RpcError> {
        (**self).search_msg(cid).await
    }

    async fn chain_height(&self) -> Result<i64, RpcError> {
        (**self).chain_height().await
    }
}
