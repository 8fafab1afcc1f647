//! Sending value and reading balances through a node.
//!
//! [`Account`] wraps a [`NodeRpc`] with a per-sender [`NonceTracker`]. A send
//! holds the sender's nonce slot from nonce selection until the node accepts
//! or rejects the message, so concurrent sends never reuse a nonce.

use tracing::{debug, info, warn};

use filament_core::address::NetworkAddress;
use filament_core::cid::Cid;
use filament_core::constants::METHOD_SEND;
use filament_core::error::{AddressError, CryptoError};
use filament_core::message::{Message, SignedMessage};
use filament_core::network::Network;
use filament_core::token::Token;
use filament_wallet::AccountData;

use crate::config::WaitOptions;
use crate::error::RpcError;
use crate::node::NodeRpc;
use crate::nonce::NonceTracker;
use crate::state::{MessageState, TrackedMessage};
use crate::submitter;
use crate::types::Receipt;

/// Account operations against one node.
pub struct Account<R> {
    rpc: R,
    nonces: NonceTracker,
}

impl<R: NodeRpc> Account<R> {
    pub fn new(rpc: R) -> Self {
        Self {
            rpc,
            nonces: NonceTracker::new(),
        }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn network(&self) -> Network {
        self.rpc.network()
    }

    fn check_network(&self, address: &NetworkAddress) -> Result<(), RpcError> {
        let node = self.rpc.network();
        if address.network() != node {
            return Err(AddressError::InvalidNetwork(format!(
                "{address} is a {} address but the node serves {node}",
                address.network()
            ))
            .into());
        }
        Ok(())
    }

    /// Current balance of `address`.
    ///
    /// Addresses the node has never seen yield [`RpcError::AccountNotFound`].
    pub async fn get_balance(&self, address: &NetworkAddress) -> Result<Token, RpcError> {
        self.check_network(address)?;
        let actor = self.rpc.get_actor_state(address.address()).await?;
        debug!(%address, balance = %actor.balance, "account: balance");
        Ok(actor.balance)
    }

    /// Balance of a derived account; see [`Account::get_balance`].
    pub async fn get_balance_of(&self, account: &AccountData) -> Result<Token, RpcError> {
        self.get_balance(account.address()).await
    }

    /// Stop tracking `sender`'s nonce once its in-flight send finishes.
    /// The next send asks the node again.
    pub async fn forget_nonce(&self, sender: &AccountData) -> bool {
        self.nonces.forget(sender.address().address()).await
    }

    /// Transfer `amount` from `sender` to `to` and return the message CID.
    pub async fn send(
        &self,
        sender: &AccountData,
        to: &NetworkAddress,
        amount: Token,
    ) -> Result<Cid, RpcError> {
        self.check_network(sender.address())?;
        self.check_network(to)?;
        let message = Message::builder(sender.address().address().clone(), to.address().clone())
            .value(amount)
            .method(METHOD_SEND)
            .build()?;
        let tracked = self.push(sender, message).await?;
        Ok(tracked.cid().clone())
    }

    /// Fill in nonce and gas for `message`, sign it with `sender` and submit.
    ///
    /// The nonce and gas already set on `message` are replaced. On success
    /// the returned message is in [`MessageState::Submitted`].
    pub async fn push(
        &self,
        sender: &AccountData,
        message: Message,
    ) -> Result<TrackedMessage, RpcError> {
        self.check_network(sender.address())?;
        let from = sender.address().address();
        if message.from() != from {
            return Err(CryptoError::SignerMismatch {
                signer: sender.address().to_string(),
                from: message.from().encode(self.network()),
            }
            .into());
        }

        let mut slot = self.nonces.lock(from).await;
        let node_nonce = self.rpc.get_nonce(from).await?;
        let nonce = slot.select(node_nonce);
        debug!(sender = %sender.address(), nonce, node_nonce, "account: nonce reserved");

        let message = message.with_nonce(nonce);
        let gas = self.rpc.estimate_gas(&message).await?;
        let message = message.with_gas(gas)?;
        debug!(
            gas_limit = gas.gas_limit,
            fee_cap = %gas.gas_fee_cap,
            premium = %gas.gas_premium,
            "account: gas estimated"
        );

        let mut tracked = TrackedMessage::new(message.cid());
        let signed = SignedMessage::sign(message, sender.key_pair())?;
        tracked.set_cid(signed.cid());
        tracked.advance(MessageState::Signed)?;

        match self.rpc.submit(&signed).await {
            Ok(cid) => {
                slot.commit(nonce);
                tracked.set_cid(cid);
                tracked.advance(MessageState::Submitted)?;
                info!(cid = %tracked.cid(), sender = %sender.address(), nonce, "account: message submitted");
                Ok(tracked)
            }
            Err(e) => {
                slot.reset();
                warn!(sender = %sender.address(), nonce, error = %e, "account: submission failed");
                Err(e)
            }
        }
    }

    /// Wait for a submitted message; see [`submitter::wait_msg_state`].
    pub async fn wait_msg_state(&self, cid: &Cid, opts: WaitOptions) -> Result<Receipt, RpcError> {
        submitter::wait_msg_state(&self.rpc, cid, opts).await
    }
}
