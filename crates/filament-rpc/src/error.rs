//! RPC and submission error types.

use filament_core::cid::Cid;
use filament_core::error::{AddressError, CryptoError, MessageError, TokenError};
use thiserror::Error;

use crate::state::MessageState;

/// Errors from talking to a node and tracking submitted messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// Transport failure, timeout or unreachable endpoint.
    #[error("node unavailable: {0}")]
    NodeUnavailable(String),

    /// The node holds no actor for this address (never funded).
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The node refused the message (bad nonce, insufficient funds, ...).
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    /// The message did not land on chain before the wait deadline.
    #[error("message {cid} not confirmed before timeout")]
    ConfirmationTimeout { cid: Cid },

    /// The message landed on chain but its execution failed.
    #[error("message {cid} failed with exit code {exit_code}")]
    MessageFailed { cid: Cid, exit_code: i64 },

    /// The node answered with something we could not interpret.
    #[error("invalid node response: {0}")]
    InvalidResponse(String),

    /// A tracked message was moved along an edge the lifecycle forbids.
    #[error("invalid message state transition: {from} -> {to}")]
    InvalidStateTransition { from: MessageState, to: MessageState },

    /// Address error from filament-core.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Cryptographic error from filament-core.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Message construction error from filament-core.
    #[error(transparent)]
    Message(#[from] MessageError),
}

impl From<TokenError> for RpcError {
    fn from(e: TokenError) -> Self {
        RpcError::Message(MessageError::Token(e))
    }
}

impl RpcError {
    /// Whether retrying the same read could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RpcError::NodeUnavailable(_))
    }
}
