//! Shared test helpers: an in-memory node and account fixtures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use filament_core::address::Address;
use filament_core::cid::Cid;
use filament_core::crypto::SignatureType;
use filament_core::message::{GasParams, Message, SignedMessage};
use filament_core::network::Network;
use filament_core::token::Token;
use filament_rpc::{ActorState, MsgLookup, NodeRpc, Receipt, RpcError, WaitOptions};
use filament_wallet::{AccountData, Wallet};

/// BIP-39 test phrase (all-zero entropy).
pub const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Gas the mock node hands out for every estimate.
pub const TEST_GAS: GasParams = GasParams {
    gas_limit: 1_000_000,
    gas_fee_cap: Token::from_atto_u128(100),
    gas_premium: Token::from_atto_u128(50),
};

/// Derive a test account from [`ABANDON`].
pub fn account(network: Network, sig_type: SignatureType, path: &str) -> AccountData {
    Wallet::derive_account(ABANDON, sig_type, path, "", network).unwrap()
}

/// Wait options suited to an in-memory node.
pub fn fast_wait(timeout: Duration) -> WaitOptions {
    WaitOptions {
        timeout,
        poll_interval: Duration::from_millis(5),
        confidence: 0,
    }
}

#[derive(Default)]
struct NodeState {
    actors: HashMap<Address, ActorState>,
    pending: Vec<SignedMessage>,
    executed: HashMap<Cid, MsgLookup>,
    height: i64,
    fail_next: Option<i64>,
}

impl NodeState {
    fn pending_from(&self, from: &Address) -> u64 {
        self.pending
            .iter()
            .filter(|m| m.message().from() == from)
            .count() as u64
    }

    fn next_nonce(&self, from: &Address) -> u64 {
        self.actors.get(from).map_or(0, |a| a.nonce) + self.pending_from(from)
    }

    fn execute(&mut self, signed: SignedMessage, exit_code: i64) -> Result<(), RpcError> {
        let cid = signed.cid();
        let message = signed.message();
        let fee = max_fee(message)?;

        let sender = self
            .actors
            .get_mut(message.from())
            .ok_or_else(|| RpcError::AccountNotFound(format!("{:?}", message.from())))?;
        sender.nonce += 1;
        sender.balance = sender.balance.checked_sub(fee)?;
        if exit_code == 0 {
            sender.balance = sender.balance.checked_sub(message.value())?;
            let receiver = self.actors.entry(message.to().clone()).or_default();
            receiver.balance = receiver.balance.checked_add(message.value())?;
        }

        let lookup = MsgLookup {
            message: cid.clone(),
            receipt: Receipt {
                exit_code,
                return_data: Vec::new(),
                gas_used: message.gas_limit(),
            },
            height: self.height,
        };
        self.executed.insert(cid, lookup);
        Ok(())
    }
}

/// Most a message can cost in gas: `gas_fee_cap * gas_limit`.
fn max_fee(message: &Message) -> Result<Token, RpcError> {
    Ok(message.gas_fee_cap().checked_mul(message.gas_limit() as u128)?)
}

/// In-memory node: checks signatures, nonces and balances on submit, and
/// executes pending messages when [`MockNode::mine`] is called.
pub struct MockNode {
    network: Network,
    state: Mutex<NodeState>,
}

impl MockNode {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            state: Mutex::new(NodeState::default()),
        }
    }

    /// Credit `amount`, creating the actor if needed.
    pub fn fund(&self, address: &Address, amount: Token) {
        let mut state = self.state.lock();
        let actor = state.actors.entry(address.clone()).or_default();
        actor.balance = actor.balance.checked_add(amount).unwrap();
    }

    pub fn balance(&self, address: &Address) -> Option<Token> {
        self.state.lock().actors.get(address).map(|a| a.balance)
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Nonces of pending messages from `from`, in submission order.
    pub fn pending_nonces(&self, from: &Address) -> Vec<u64> {
        self.state
            .lock()
            .pending
            .iter()
            .filter(|m| m.message().from() == from)
            .map(|m| m.message().nonce())
            .collect()
    }

    /// Make the next executed message fail with `exit_code`.
    pub fn fail_next(&self, exit_code: i64) {
        self.state.lock().fail_next = Some(exit_code);
    }

    /// Produce one epoch, executing every pending message in nonce order.
    pub fn mine(&self) -> usize {
        let mut state = self.state.lock();
        state.height += 1;
        let mut pending = std::mem::take(&mut state.pending);
        pending.sort_by_key(|m| m.message().nonce());
        let count = pending.len();
        for signed in pending {
            let exit_code = state.fail_next.take().unwrap_or(0);
            state.execute(signed, exit_code).unwrap();
        }
        count
    }

    /// Produce `epochs` empty epochs.
    pub fn advance(&self, epochs: i64) {
        self.state.lock().height += epochs;
    }
}

#[async_trait]
impl NodeRpc for MockNode {
    fn network(&self) -> Network {
        self.network
    }

    async fn get_nonce(&self, address: &Address) -> Result<u64, RpcError> {
        Ok(self.state.lock().next_nonce(address))
    }

    async fn estimate_gas(&self, _message: &Message) -> Result<GasParams, RpcError> {
        Ok(TEST_GAS)
    }

    async fn submit(&self, signed: &SignedMessage) -> Result<Cid, RpcError> {
        signed
            .verify()
            .map_err(|e| RpcError::SubmissionRejected(format!("bad signature: {e}")))?;
        let message = signed.message();
        let mut state = self.state.lock();

        let expected = state.next_nonce(message.from());
        if message.nonce() != expected {
            return Err(RpcError::SubmissionRejected(format!(
                "nonce {} does not match expected {expected}",
                message.nonce()
            )));
        }
        let balance = state
            .actors
            .get(message.from())
            .map_or(Token::zero(), |a| a.balance);
        if balance < message.required_funds()? {
            return Err(RpcError::SubmissionRejected("insufficient funds".into()));
        }

        state.pending.push(signed.clone());
        Ok(signed.cid())
    }

    async fn get_actor_state(&self, address: &Address) -> Result<ActorState, RpcError> {
        self.state
            .lock()
            .actors
            .get(address)
            .cloned()
            .ok_or_else(|| RpcError::AccountNotFound(format!("{address:?}")))
    }

    async fn search_msg(&self, cid: &Cid) -> Result<Option<MsgLookup>, RpcError> {
        Ok(self.state.lock().executed.get(cid).cloned())
    }

    async fn chain_height(&self) -> Result<i64, RpcError> {
        Ok(self.state.lock().height)
    }
}

/// Mine an epoch every `interval` until the returned handle is aborted.
pub fn spawn_miner(node: Arc<MockNode>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            node.mine();
        }
    })
}
