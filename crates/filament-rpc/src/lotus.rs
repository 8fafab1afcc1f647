//! [`NodeRpc`] over a Lotus JSON-RPC endpoint.
//!
//! Read-only calls are retried with linear backoff when the transport fails.
//! `MpoolPush` is sent exactly once: a push that timed out may still have
//! reached the pool, so resending is left to the caller.

use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::core::ClientError;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HeaderMap, HeaderValue, HttpClient, HttpClientBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use filament_core::address::Address;
use filament_core::cid::Cid;
use filament_core::message::{GasParams, Message, SignedMessage};
use filament_core::network::Network;

use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::node::NodeRpc;
use crate::types::{ActorState, LotusMessage, LotusSignedMessage, MsgLookup, TipSetHeight};

const MPOOL_GET_NONCE: &str = "Filecoin.MpoolGetNonce";
const GAS_ESTIMATE_MESSAGE_GAS: &str = "Filecoin.GasEstimateMessageGas";
const MPOOL_PUSH: &str = "Filecoin.MpoolPush";
const STATE_GET_ACTOR: &str = "Filecoin.StateGetActor";
const STATE_SEARCH_MSG: &str = "Filecoin.StateSearchMsg";
const CHAIN_HEAD: &str = "Filecoin.ChainHead";

/// Search the whole chain when looking up a message.
const SEARCH_NO_LIMIT: i64 = -1;

/// How a single call went wrong, before it is mapped per method.
#[derive(Debug)]
enum Failure {
    /// The node answered with a JSON-RPC error.
    Node(String),
    /// Transport failure or timeout; worth retrying for reads.
    Transport(String),
    /// Request or response could not be (de)serialized.
    Malformed(String),
}

impl Failure {
    fn from_client(method: &str, err: ClientError) -> Self {
        match err {
            ClientError::Call(obj) => Failure::Node(obj.message().to_string()),
            ClientError::ParseError(e) => Failure::Malformed(format!("{method}: {e}")),
            other => Failure::Transport(format!("{method}: {other}")),
        }
    }

    fn into_rpc(self, method: &str) -> RpcError {
        match self {
            Failure::Node(msg) => RpcError::InvalidResponse(format!("{method}: {msg}")),
            Failure::Transport(msg) => RpcError::NodeUnavailable(msg),
            Failure::Malformed(msg) => RpcError::InvalidResponse(msg),
        }
    }
}

fn is_actor_not_found(msg: &str) -> bool {
    msg.to_ascii_lowercase().contains("actor not found")
}

fn params(args: &[Value]) -> Result<ArrayParams, Failure> {
    let mut params = ArrayParams::new();
    for arg in args {
        params
            .insert(arg)
            .map_err(|e| Failure::Malformed(e.to_string()))?;
    }
    Ok(params)
}

/// Lotus JSON-RPC client.
pub struct LotusClient {
    client: HttpClient,
    config: RpcConfig,
}

impl LotusClient {
    pub fn new(config: RpcConfig) -> Result<Self, RpcError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                RpcError::NodeUnavailable("token is not a valid header value".into())
            })?;
            headers.insert("Authorization", value);
        }
        let client = HttpClientBuilder::default()
            .request_timeout(config.request_timeout)
            .set_headers(headers)
            .build(&config.url)
            .map_err(|e| RpcError::NodeUnavailable(format!("{}: {e}", config.url)))?;
        debug!(url = %config.url, network = %config.network, "lotus: client ready");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    fn render(&self, address: &Address) -> Value {
        Value::String(address.encode(self.config.network))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, args: &[Value]) -> Result<T, Failure> {
        self.client
            .request(method, params(args)?)
            .await
            .map_err(|e| Failure::from_client(method, e))
    }

    /// A read-only call, retried on transport failure.
    async fn read<T: DeserializeOwned>(&self, method: &str, args: &[Value]) -> Result<T, Failure> {
        let mut attempt: u32 = 0;
        loop {
            match self.call(method, args).await {
                Err(Failure::Transport(msg)) if attempt < self.config.read_retries => {
                    attempt += 1;
                    let delay = backoff(self.config.retry_backoff, attempt);
                    warn!(method, attempt, error = %msg, "lotus: transport failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

#[async_trait]
impl NodeRpc for LotusClient {
    fn network(&self) -> Network {
        self.config.network
    }

    async fn get_nonce(&self, address: &Address) -> Result<u64, RpcError> {
        self.read(MPOOL_GET_NONCE, &[self.render(address)])
            .await
            .map_err(|f| f.into_rpc(MPOOL_GET_NONCE))
    }

    async fn estimate_gas(&self, message: &Message) -> Result<GasParams, RpcError> {
        let lotus = LotusMessage::from_message(message, self.config.network);
        let arg = serde_json::to_value(&lotus)
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        let estimated: LotusMessage = self
            .read(GAS_ESTIMATE_MESSAGE_GAS, &[arg, Value::Null, json!([])])
            .await
            .map_err(|f| match f {
                Failure::Node(msg) => RpcError::SubmissionRejected(msg),
                other => other.into_rpc(GAS_ESTIMATE_MESSAGE_GAS),
            })?;
        Ok(estimated.gas())
    }

    async fn submit(&self, signed: &SignedMessage) -> Result<Cid, RpcError> {
        let lotus = LotusSignedMessage::from_signed(signed, self.config.network);
        let arg = serde_json::to_value(&lotus)
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        let cid: Cid = self
            .call(MPOOL_PUSH, &[arg])
            .await
            .map_err(|f| match f {
                Failure::Node(msg) => RpcError::SubmissionRejected(msg),
                other => other.into_rpc(MPOOL_PUSH),
            })?;
        let local = signed.cid();
        if cid != local {
            warn!(%cid, %local, "lotus: node reported a different message cid");
        }
        Ok(cid)
    }

    async fn get_actor_state(&self, address: &Address) -> Result<ActorState, RpcError> {
        let not_found = || RpcError::AccountNotFound(address.encode(self.config.network));
        let actor: Option<ActorState> = self
            .read(STATE_GET_ACTOR, &[self.render(address), json!([])])
            .await
            .map_err(|f| match f {
                Failure::Node(msg) if is_actor_not_found(&msg) => not_found(),
                other => other.into_rpc(STATE_GET_ACTOR),
            })?;
        actor.ok_or_else(not_found)
    }

    async fn search_msg(&self, cid: &Cid) -> Result<Option<MsgLookup>, RpcError> {
        let args = [json!([]), json!(cid), json!(SEARCH_NO_LIMIT), json!(true)];
        self.read(STATE_SEARCH_MSG, &args)
            .await
            .map_err(|f| f.into_rpc(STATE_SEARCH_MSG))
    }

    async fn chain_height(&self) -> Result<i64, RpcError> {
        let head: TipSetHeight = self
            .read(CHAIN_HEAD, &[])
            .await
            .map_err(|f| f.into_rpc(CHAIN_HEAD))?;
        Ok(head.height)
    }
}
