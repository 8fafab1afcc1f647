//! filament-cli: command-line front end for Filecoin-style accounts.
//!
//! Derives accounts from a mnemonic, converts between address forms, and
//! sends value or queries balances through a Lotus-compatible node.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use zeroize::Zeroizing;

use filament_core::address::NetworkAddress;
use filament_core::cid::Cid;
use filament_core::crypto::SignatureType;
use filament_core::token::Token;
use filament_rpc::{Account, LotusClient, WaitOptions, wait_msg_state};
use filament_wallet::{AccountData, DerivationPath, Wallet};

mod config;

use config::{Overrides, Settings};

/// Filament account toolkit.
#[derive(Parser)]
#[command(name = "filament-cli")]
#[command(version, about = "Filecoin-style account toolkit")]
struct Cli {
    /// Config file (default: ~/.config/filament/config.toml).
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Network: mainnet, calibration or butterfly.
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Lotus JSON-RPC endpoint.
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Log output format ("text" or "json").
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new mnemonic.
    Generate(GenerateArgs),
    /// Derive an account from the configured mnemonic.
    Derive(KeyArgs),
    /// Convert between Ethereum and Filecoin address forms.
    Convert(ConvertArgs),
    /// Query an address balance.
    Balance(BalanceArgs),
    /// Send value from a derived account.
    Send(SendArgs),
    /// Wait for a submitted message to be executed.
    Wait(WaitArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Number of words (12, 15, 18, 21 or 24).
    #[arg(short, long, default_value_t = 24)]
    words: usize,
}

#[derive(Args)]
struct KeyArgs {
    /// Signature scheme: secp256k1 or bls.
    #[arg(short, long, default_value = "secp256k1")]
    sig_type: String,

    /// Full derivation path; overrides --account/--index.
    #[arg(short, long)]
    path: Option<String>,

    /// BIP-44 account level.
    #[arg(long, default_value_t = 0)]
    account: u32,

    /// BIP-44 address index.
    #[arg(long, default_value_t = 0)]
    index: u32,
}

#[derive(Args)]
struct ConvertArgs {
    /// A 0x-prefixed Ethereum address or a Filecoin address.
    address: String,
}

#[derive(Args)]
struct BalanceArgs {
    /// Address to query.
    address: String,
}

#[derive(Args)]
struct SendArgs {
    #[command(flatten)]
    key: KeyArgs,

    /// Recipient address (any protocol, including f410/t410).
    #[arg(short, long)]
    to: String,

    /// Amount in FIL (e.g. 0.5).
    #[arg(long)]
    amount: String,

    /// Wait for the message to be executed.
    #[arg(long)]
    wait: bool,

    #[command(flatten)]
    wait_opts: WaitOpts,
}

#[derive(Args)]
struct WaitArgs {
    /// Message CID.
    cid: String,

    #[command(flatten)]
    wait_opts: WaitOpts,
}

#[derive(Args)]
struct WaitOpts {
    /// Give up after this many seconds.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Seconds between polls.
    #[arg(long, default_value_t = 5)]
    poll_secs: u64,

    /// Epochs to wait on top of inclusion.
    #[arg(long, default_value_t = 0)]
    confidence: u64,
}

impl WaitOpts {
    fn options(&self) -> WaitOptions {
        WaitOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_secs(self.poll_secs),
            confidence: self.confidence,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_format);

    let overrides = Overrides {
        config: cli.config.clone(),
        network: cli.network.clone(),
        rpc_url: cli.rpc_url.clone(),
    };
    let settings = Settings::load(&overrides)?;

    match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Derive(args) => derive(&settings, &args),
        Commands::Convert(args) => convert(&settings, args),
        Commands::Balance(args) => balance(&settings, args).await,
        Commands::Send(args) => send(&settings, args).await,
        Commands::Wait(args) => wait(&settings, args).await,
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the `info` default.
fn init_logging(format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let phrase = Zeroizing::new(Wallet::generate_mnemonic(args.words)?);
    println!("{}", phrase.as_str());
    eprintln!("\nWARNING: Anyone with this phrase controls the derived accounts.");
    Ok(())
}

fn derive(settings: &Settings, args: &KeyArgs) -> Result<()> {
    let account = derive_account(settings, args)?;
    println!("Address:   {}", account.address());
    println!("Type:      {}", account.signature_type());
    if let Some(path) = account.path() {
        println!("Path:      {path}");
    }
    if let Ok(eth) = account.address().address().to_eth_address() {
        println!("Eth:       {eth}");
    }
    Ok(())
}

fn convert(settings: &Settings, args: ConvertArgs) -> Result<()> {
    let input = args.address.trim();
    if input.starts_with("0x") || input.starts_with("0X") {
        let address = NetworkAddress::from_eth_address(settings.network(), input)
            .context("Invalid Ethereum address")?;
        println!("{address}");
        return Ok(());
    }

    let address: NetworkAddress = input.parse().context("Invalid Filecoin address")?;
    println!("Network:   {}", address.network());
    println!("Protocol:  {}", address.protocol());
    match address.address().to_checksum_eth_address() {
        Ok(eth) => println!("Eth:       {eth}"),
        Err(_) => println!("Eth:       (no Ethereum form)"),
    }
    Ok(())
}

async fn balance(settings: &Settings, args: BalanceArgs) -> Result<()> {
    let address = NetworkAddress::parse(args.address.trim(), settings.network())
        .with_context(|| format!("Invalid {} address", settings.network_name))?;
    let account = connect(settings)?;
    let balance = account
        .get_balance(&address)
        .await
        .with_context(|| format!("Failed to query balance of {address}"))?;
    println!("{} FIL ({} attoFIL)", balance.to_whole_string(), balance);
    Ok(())
}

async fn send(settings: &Settings, args: SendArgs) -> Result<()> {
    let to = NetworkAddress::parse(args.to.trim(), settings.network())
        .with_context(|| format!("Invalid {} recipient", settings.network_name))?;
    let amount = Token::from_whole(args.amount.trim()).context("Invalid amount")?;
    if amount.is_zero() {
        bail!("Amount must be greater than zero");
    }
    let sender = derive_account(settings, &args.key)?;
    let account = connect(settings)?;

    info!(from = %sender.address(), %to, %amount, "Sending");
    let cid = account
        .send(&sender, &to, amount)
        .await
        .context("Send failed")?;
    println!("{cid}");

    if args.wait {
        let receipt = account
            .wait_msg_state(&cid, args.wait_opts.options())
            .await
            .with_context(|| format!("Message {cid} did not confirm"))?;
        println!("Confirmed (gas used {})", receipt.gas_used);
    }
    Ok(())
}

async fn wait(settings: &Settings, args: WaitArgs) -> Result<()> {
    let cid: Cid = args.cid.trim().parse().context("Invalid message CID")?;
    let client = LotusClient::new(settings.rpc.clone()).context("Failed to build RPC client")?;
    let receipt = wait_msg_state(&client, &cid, args.wait_opts.options())
        .await
        .with_context(|| format!("Message {cid} did not confirm"))?;
    println!("Confirmed (exit code {}, gas used {})", receipt.exit_code, receipt.gas_used);
    Ok(())
}

fn connect(settings: &Settings) -> Result<Account<LotusClient>> {
    let client = LotusClient::new(settings.rpc.clone()).context("Failed to build RPC client")?;
    Ok(Account::new(client))
}

fn derive_account(settings: &Settings, args: &KeyArgs) -> Result<AccountData> {
    let sig_type: SignatureType = args.sig_type.parse().context("Invalid signature type")?;
    let path = match &args.path {
        Some(p) => p.clone(),
        None => DerivationPath::bip44(settings.network(), args.account, args.index)?.to_string(),
    };
    let mnemonic = match settings.mnemonic() {
        Some(m) => Zeroizing::new(m.to_string()),
        None => prompt_secret("Mnemonic")?,
    };
    Wallet::derive_account(
        &mnemonic,
        sig_type,
        &path,
        settings.passphrase(),
        settings.network(),
    )
    .context("Failed to derive account")
}

/// Prompt for a secret without echo.
fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    rpassword::prompt_password(format!("{prompt}: "))
        .map(Zeroizing::new)
        .context("Failed to read input")
}
