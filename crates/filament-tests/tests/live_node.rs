//! Tests against a real Lotus node. Ignored by default.
//!
//! Run with `cargo test -p filament-tests --test live_node -- --ignored` and:
//!
//! - `NETWORK` (`mainnet` or `calibration`)
//! - `NODE_RPC_URL`
//! - `NODE_RPC_TOKEN` (optional)
//! - `ACCOUNT_MNEMONIC`
//! - `SENDER_ACCOUNT_PATH`, `RECEIVER_ACCOUNT_PATH`

use std::env;
use std::time::Duration;

use filament_core::crypto::SignatureType;
use filament_core::network::get_network_prefix;
use filament_core::token::Token;
use filament_rpc::{Account, LotusClient, RpcConfig, WaitOptions};
use filament_wallet::{AccountData, Wallet};

struct LiveEnv {
    client: Account<LotusClient>,
    sender: AccountData,
    receiver: AccountData,
}

fn var(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("{name} must be set for live tests"))
}

fn live_env() -> LiveEnv {
    let network = get_network_prefix(&var("NETWORK")).unwrap();

    let mut config = RpcConfig::new(var("NODE_RPC_URL"), network);
    if let Ok(token) = env::var("NODE_RPC_TOKEN") {
        config = config.with_token(token);
    }
    let client = Account::new(LotusClient::new(config).unwrap());

    let mnemonic = var("ACCOUNT_MNEMONIC");
    let derive = |path: &str| {
        Wallet::derive_account(&mnemonic, SignatureType::Secp256k1, path, "", network).unwrap()
    };
    LiveEnv {
        client,
        sender: derive(&var("SENDER_ACCOUNT_PATH")),
        receiver: derive(&var("RECEIVER_ACCOUNT_PATH")),
    }
}

#[tokio::test]
#[ignore = "needs a live Lotus node"]
async fn live_balance() {
    let env = live_env();
    let balance = env.client.get_balance(env.sender.address()).await.unwrap();
    assert!(!balance.is_zero(), "sender {} has no funds", env.sender.address());
}

#[tokio::test]
#[ignore = "needs a live Lotus node"]
async fn live_send_and_wait() {
    let env = live_env();
    let amount = Token::from_atto_u128(100);
    let before = env.client.get_balance(env.sender.address()).await.unwrap();

    let cid = env
        .client
        .send(&env.sender, env.receiver.address(), amount)
        .await
        .unwrap();
    let opts = WaitOptions {
        timeout: Duration::from_secs(600),
        poll_interval: Duration::from_secs(10),
        confidence: 0,
    };
    let receipt = env.client.wait_msg_state(&cid, opts).await.unwrap();
    assert_eq!(receipt.exit_code, 0);

    let after = env.client.get_balance(env.sender.address()).await.unwrap();
    assert!(before.checked_sub(after).unwrap() >= amount);
}
