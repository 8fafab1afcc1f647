//! Per-sender nonce serialization.
//!
//! Each sender address gets its own async mutex guarding the next nonce we
//! expect to use. The slot is held from nonce selection through submission,
//! so concurrent sends from one account get consecutive nonces while sends
//! from different accounts proceed in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use filament_core::address::Address;

/// Lock table of per-sender nonce slots.
#[derive(Default)]
pub struct NonceTracker {
    slots: DashMap<Address, Arc<Mutex<Option<u64>>>>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `address`'s nonce slot.
    pub async fn lock(&self, address: &Address) -> NonceSlot {
        // Clone the Arc out so the map shard is not held across the await.
        let slot = self
            .slots
            .entry(address.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        NonceSlot {
            guard: slot.lock_owned().await,
        }
    }

    /// Locally cached next nonce, if any.
    pub async fn cached(&self, address: &Address) -> Option<u64> {
        let slot = self.slots.get(address).map(|s| s.clone())?;
        let next = *slot.lock().await;
        next
    }

    /// Drop `address`'s slot once no send from it is in flight.
    ///
    /// Waits for the slot lock. Returns `false` if there was no slot or
    /// another task queued on it meanwhile, in which case it is kept.
    pub async fn forget(&self, address: &Address) -> bool {
        let Some(slot) = self.slots.get(address).map(|s| s.clone()) else {
            return false;
        };
        let _held = slot.lock().await;
        // One reference in the map, one here; any more is a queued sender.
        self.slots
            .remove_if(address, |_, s| Arc::ptr_eq(s, &slot) && Arc::strong_count(s) == 2)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Exclusive access to one sender's next nonce.
pub struct NonceSlot {
    guard: OwnedMutexGuard<Option<u64>>,
}

impl NonceSlot {
    /// Nonce to use: the node's view or our own, whichever is further ahead.
    pub fn select(&self, node_nonce: u64) -> u64 {
        (*self.guard).map_or(node_nonce, |local| local.max(node_nonce))
    }

    /// Record that `nonce` was accepted by the node.
    pub fn commit(&mut self, nonce: u64) {
        *self.guard = Some(nonce.saturating_add(1));
    }

    /// Forget the cached nonce so the next send asks the node again.
    pub fn reset(&mut self) {
        *self.guard = None;
    }
}
