//! Node connection and confirmation-wait settings.
//!
//! [`RpcConfig`] describes how to reach a Lotus-compatible node and
//! [`WaitOptions`] how long to wait for a message to land on chain.

use std::time::Duration;

use filament_core::network::Network;

/// Default Lotus JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:1234/rpc/v1";

/// Connection settings for a Lotus-compatible node.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,
    /// Optional bearer token sent in the `Authorization` header.
    pub token: Option<String>,
    /// Network the node serves; addresses are rendered with its prefix.
    pub network: Network,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Extra attempts for read-only calls after a transport failure.
    pub read_retries: u32,
    /// Delay before the first retry, growing linearly per attempt.
    pub retry_backoff: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            token: None,
            network: Network::Testnet,
            request_timeout: Duration::from_secs(30),
            read_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl RpcConfig {
    pub fn new(url: impl Into<String>, network: Network) -> Self {
        Self {
            url: url.into(),
            network,
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// How [`crate::submitter::wait_msg_state`] polls for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up after this long.
    pub timeout: Duration,
    /// Delay between polls.
    pub poll_interval: Duration,
    /// Epochs that must pass on top of the inclusion epoch.
    pub confidence: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(5),
            confidence: 0,
        }
    }
}
