//! Message lifecycle state machine.
//!
//! ```text
//! Built -> Signed -> Submitted -> Pending -> Confirmed
//!                                        \-> Failed
//!                                        \-> TimedOut
//! ```
//!
//! Transitions only move forward; terminal states never change.

use std::fmt;

use tracing::debug;

use filament_core::cid::Cid;

use crate::error::RpcError;
use crate::types::Receipt;

/// Where a message is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageState {
    Built,
    Signed,
    Submitted,
    Pending,
    Confirmed,
    Failed,
    TimedOut,
}

impl MessageState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MessageState::Confirmed | MessageState::Failed | MessageState::TimedOut
        )
    }

    pub fn can_transition_to(self, next: MessageState) -> bool {
        use MessageState::*;
        matches!(
            (self, next),
            (Built, Signed)
                | (Signed, Submitted)
                | (Submitted, Pending)
                | (Pending, Confirmed)
                | (Pending, Failed)
                | (Pending, TimedOut)
        )
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageState::Built => "built",
            MessageState::Signed => "signed",
            MessageState::Submitted => "submitted",
            MessageState::Pending => "pending",
            MessageState::Confirmed => "confirmed",
            MessageState::Failed => "failed",
            MessageState::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}

/// A message identified by CID, moving through [`MessageState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedMessage {
    cid: Cid,
    state: MessageState,
    receipt: Option<Receipt>,
    height: Option<i64>,
}

impl TrackedMessage {
    /// Track a freshly built message.
    pub fn new(cid: Cid) -> Self {
        Self::at(cid, MessageState::Built)
    }

    /// Resume tracking a message already in `state` (e.g. one submitted
    /// elsewhere, known only by CID).
    pub fn at(cid: Cid, state: MessageState) -> Self {
        Self {
            cid,
            state,
            receipt: None,
            height: None,
        }
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    /// Execution receipt, once the message has landed.
    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Inclusion epoch, once the message has landed.
    pub fn height(&self) -> Option<i64> {
        self.height
    }

    /// Move to `next`, rejecting any edge outside the lifecycle.
    pub fn advance(&mut self, next: MessageState) -> Result<(), RpcError> {
        if !self.state.can_transition_to(next) {
            return Err(RpcError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(cid = %self.cid, from = %self.state, to = %next, "state: transition");
        self.state = next;
        Ok(())
    }

    /// Rebind the CID, which changes once a secp256k1 signature is attached.
    pub(crate) fn set_cid(&mut self, cid: Cid) {
        self.cid = cid;
    }

    /// Record where the message landed and move to its terminal state.
    pub(crate) fn land(&mut self, receipt: Receipt, height: i64) -> Result<(), RpcError> {
        let next = if receipt.exit_code == 0 {
            MessageState::Confirmed
        } else {
            MessageState::Failed
        };
        self.advance(next)?;
        self.receipt = Some(receipt);
        self.height = Some(height);
        Ok(())
    }
}
