//! Confirmation tracking for submitted messages.
//!
//! [`wait_msg_state`] polls the node until the message shows up in an
//! executed tipset (plus `confidence` epochs), its receipt reports failure,
//! or the deadline passes. Dropping the returned future stops the local wait
//! only; the message stays in the node's pool.

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use filament_core::cid::Cid;

use crate::config::WaitOptions;
use crate::error::RpcError;
use crate::node::NodeRpc;
use crate::state::{MessageState, TrackedMessage};
use crate::types::Receipt;

/// Wait for `cid` to be executed on chain and return its receipt.
///
/// A non-zero exit code yields [`RpcError::MessageFailed`]; running out of
/// time yields [`RpcError::ConfirmationTimeout`]. Node errors during polling
/// are returned as-is.
pub async fn wait_msg_state<R>(rpc: &R, cid: &Cid, opts: WaitOptions) -> Result<Receipt, RpcError>
where
    R: NodeRpc + ?Sized,
{
    let tracked = TrackedMessage::at(cid.clone(), MessageState::Submitted);
    let tracked = wait_tracked(rpc, tracked, opts).await?;
    tracked
        .receipt()
        .cloned()
        .ok_or_else(|| RpcError::InvalidResponse(format!("no receipt recorded for {cid}")))
}

/// Drive a submitted (or pending) message to a terminal state.
pub async fn wait_tracked<R>(
    rpc: &R,
    mut tracked: TrackedMessage,
    opts: WaitOptions,
) -> Result<TrackedMessage, RpcError>
where
    R: NodeRpc + ?Sized,
{
    if tracked.state() == MessageState::Submitted {
        tracked.advance(MessageState::Pending)?;
    }
    if tracked.state() != MessageState::Pending {
        return Err(RpcError::InvalidStateTransition {
            from: tracked.state(),
            to: MessageState::Pending,
        });
    }

    let cid = tracked.cid().clone();
    // A timeout too large to represent means no deadline.
    let deadline = Instant::now().checked_add(opts.timeout);
    let mut polls: u64 = 0;
    loop {
        polls += 1;
        if let Some(lookup) = rpc.search_msg(&cid).await? {
            let target = i64::try_from(opts.confidence)
                .map_or(i64::MAX, |c| lookup.height.saturating_add(c));
            let settled = opts.confidence == 0 || rpc.chain_height().await? >= target;
            if settled {
                let exit_code = lookup.receipt.exit_code;
                tracked.land(lookup.receipt, lookup.height)?;
                if exit_code != 0 {
                    warn!(%cid, exit_code, height = lookup.height, "submitter: message failed");
                    return Err(RpcError::MessageFailed { cid, exit_code });
                }
                info!(%cid, height = lookup.height, polls, "submitter: message confirmed");
                return Ok(tracked);
            }
            debug!(%cid, height = lookup.height, target, "submitter: awaiting confidence");
        } else {
            debug!(%cid, polls, "submitter: not on chain yet");
        }

        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    tracked.advance(MessageState::TimedOut)?;
                    warn!(%cid, polls, "submitter: confirmation timed out");
                    return Err(RpcError::ConfirmationTimeout { cid });
                }
                opts.poll_interval.min(deadline - now)
            }
            None => opts.poll_interval,
        };
        sleep(pause).await;
    }
}
