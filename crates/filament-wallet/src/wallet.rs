//! Account derivation entry points.
//!
//! [`Wallet`] holds no state: every call derives what it needs from its
//! inputs and hands back an [`AccountData`]. Nothing is persisted.

use std::fmt;

use tracing::{debug, warn};

use filament_core::address::NetworkAddress;
use filament_core::crypto::{KeyPair, SignatureType};
use filament_core::network::Network;

use crate::error::WalletError;
use crate::keys::{Seed, derive_keypair};
use crate::mnemonic::{self, parse_mnemonic};
use crate::path::DerivationPath;

/// A derived or recovered account: keys plus the address they control.
#[derive(Clone)]
pub struct AccountData {
    key_pair: KeyPair,
    address: NetworkAddress,
    path: Option<DerivationPath>,
}

impl AccountData {
    fn new(key_pair: KeyPair, network: Network, path: Option<DerivationPath>) -> Self {
        let address = NetworkAddress::new(network, key_pair.address());
        Self {
            key_pair,
            address,
            path,
        }
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn address(&self) -> &NetworkAddress {
        &self.address
    }

    pub fn network(&self) -> Network {
        self.address.network()
    }

    pub fn signature_type(&self) -> SignatureType {
        self.key_pair.sig_type()
    }

    /// Derivation path, `None` for accounts recovered from a raw key.
    pub fn path(&self) -> Option<&DerivationPath> {
        self.path.as_ref()
    }
}

impl fmt::Debug for AccountData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountData")
            .field("address", &self.address.to_string())
            .field("signature_type", &self.signature_type())
            .field("path", &self.path.as_ref().map(ToString::to_string))
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Stateless account derivation.
pub struct Wallet;

impl Wallet {
    /// Derive the account at `path` from a BIP-39 mnemonic.
    ///
    /// The mnemonic and path are both validated before any seed material
    /// is computed.
    pub fn derive_account(
        mnemonic: &str,
        signature_type: SignatureType,
        path: &str,
        passphrase: &str,
        network: Network,
    ) -> Result<AccountData, WalletError> {
        let parsed = parse_mnemonic(mnemonic)?;
        let path: DerivationPath = path.parse()?;
        if !coin_type_matches(&path, network) {
            warn!(
                coin_type = ?path.coin_type(),
                expected = network.coin_type(),
                %network,
                "wallet: derivation path coin type does not match network"
            );
        }

        let seed = Seed::from_bytes(parsed.to_seed(passphrase));
        let key_pair = derive_keypair(&seed, signature_type, &path)?;
        let account = AccountData::new(key_pair, network, Some(path));
        debug!(
            address = %account.address(),
            %signature_type,
            path = ?account.path().map(ToString::to_string),
            "wallet: account derived"
        );
        Ok(account)
    }

    /// Rebuild an account from raw private key bytes.
    ///
    /// secp256k1 keys are big-endian scalars, BLS keys little-endian.
    pub fn recover_account(
        private_key: &[u8],
        signature_type: SignatureType,
        network: Network,
    ) -> Result<AccountData, WalletError> {
        let key_pair = KeyPair::from_private_key(signature_type, private_key)?;
        let account = AccountData::new(key_pair, network, None);
        debug!(address = %account.address(), %signature_type, "wallet: account recovered");
        Ok(account)
    }

    /// Fresh English mnemonic of 12, 15, 18, 21 or 24 words.
    pub fn generate_mnemonic(word_count: usize) -> Result<String, WalletError> {
        mnemonic::generate_mnemonic(word_count)
    }
}

/// Whether the path's coin type level is the one registered for `network`.
/// Paths too short to carry a coin type are accepted.
fn coin_type_matches(path: &DerivationPath, network: Network) -> bool {
    path.coin_type().is_none_or(|coin| coin == network.coin_type())
}
