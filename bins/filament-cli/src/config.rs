//! CLI settings, layered from lowest to highest precedence:
//! 1. built-in defaults
//! 2. TOML file (`--config`, else `~/.config/filament/config.toml` if present)
//! 3. `FILAMENT_*` environment variables (e.g. `FILAMENT_RPC_URL`)
//! 4. command-line flags

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use zeroize::Zeroizing;

use filament_core::network::{Network, NetworkName};
use filament_rpc::RpcConfig;

const ENV_PREFIX: &str = "FILAMENT";
const DEFAULT_NETWORK: &str = "calibration";

/// Raw values as read from the file and environment.
#[derive(Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    network: Option<String>,
    rpc_url: Option<String>,
    rpc_token: Option<String>,
    request_timeout_secs: Option<u64>,
    read_retries: Option<u32>,
    mnemonic: Option<String>,
    passphrase: Option<String>,
}

/// Flags that override file and environment values.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub network: Option<String>,
    pub rpc_url: Option<String>,
}

/// Resolved CLI settings.
pub struct Settings {
    pub network_name: NetworkName,
    pub rpc: RpcConfig,
    mnemonic: Option<Zeroizing<String>>,
    passphrase: Zeroizing<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("network_name", &self.network_name)
            .field("rpc_url", &self.rpc.url)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Load settings from the process environment and the config file.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let env = config::Environment::with_prefix(ENV_PREFIX);
        Self::load_with(overrides, env, default_config_path())
    }

    fn load_with(
        overrides: &Overrides,
        env: config::Environment,
        default_path: Option<PathBuf>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();
        match (&overrides.config, default_path) {
            (Some(path), _) => builder = builder.add_source(toml_file(path).required(true)),
            (None, Some(path)) => builder = builder.add_source(toml_file(&path).required(false)),
            (None, None) => {}
        }
        let raw: RawSettings = builder
            .add_source(env)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        Self::resolve(raw, overrides)
    }

    fn resolve(raw: RawSettings, overrides: &Overrides) -> Result<Self> {
        let network_str = overrides
            .network
            .clone()
            .or(raw.network)
            .unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        let network_name: NetworkName = network_str
            .parse()
            .with_context(|| format!("Unsupported network '{network_str}'"))?;

        let mut rpc = RpcConfig {
            network: network_name.prefix(),
            ..RpcConfig::default()
        };
        if let Some(url) = overrides.rpc_url.clone().or(raw.rpc_url) {
            rpc.url = url;
        }
        rpc.token = raw.rpc_token;
        if let Some(secs) = raw.request_timeout_secs {
            rpc.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = raw.read_retries {
            rpc.read_retries = retries;
        }

        Ok(Self {
            network_name,
            rpc,
            mnemonic: raw.mnemonic.map(Zeroizing::new),
            passphrase: Zeroizing::new(raw.passphrase.unwrap_or_default()),
        })
    }

    pub fn network(&self) -> Network {
        self.rpc.network
    }

    /// Mnemonic from the file or `FILAMENT_MNEMONIC`, if configured.
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_ref().map(|m| m.as_str())
    }

    /// BIP-39 passphrase, empty unless configured.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

fn toml_file(path: &Path) -> config::File<config::FileSourceFile, config::FileFormat> {
    config::File::new(&path.to_string_lossy(), config::FileFormat::Toml)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("filament").join("config.toml"))
}
