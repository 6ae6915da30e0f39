//! Command handlers and the argument helpers they share.

pub mod account;
pub mod chain;
pub mod crypt;
pub mod key;
pub mod pow;
pub mod tx;

use std::str::FromStr;

use clap::Args;
use zeroize::Zeroizing;

use etherwallet_crypto::hd_derive::DerivationPath;
use etherwallet_crypto::mnemonic::Mnemonic;
use etherwallet_types::{Address, EtherwalletError, Result, U256};
use etherwallet_wallet::{Account, FileKeyStore};

use crate::config;
use crate::GlobalOpts;

// ---------------------------------------------------------------------------
// Account selection
// ---------------------------------------------------------------------------

/// Which account a command acts as.
///
/// Either a key store entry (`--key`) or a mnemonic (`--mnemonic`, or
/// `$ETHERWALLET_MNEMONIC` when neither flag is given).
#[derive(Args)]
pub struct AccountArgs {
    /// Use the key stored under this name.
    #[arg(long, value_name = "NAME", conflicts_with = "mnemonic")]
    pub key: Option<String>,

    /// Mnemonic phrase (default: $ETHERWALLET_MNEMONIC).
    #[arg(long, value_name = "PHRASE")]
    pub mnemonic: Option<String>,

    /// Account index on m/44'/60'/0'/0/<index>.
    #[arg(long, default_value_t = 0, conflicts_with = "path")]
    pub index: u32,

    /// Full derivation path, e.g. "m/44'/60'/1'/0/0".
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,
}

impl AccountArgs {
    /// Resolves the selected account.
    pub fn open(&self, opts: &GlobalOpts) -> Result<Account> {
        if let Some(name) = &self.key {
            let store = key_store(opts);
            return Account::load(&store, name);
        }

        let phrase = match &self.mnemonic {
            Some(p) => Zeroizing::new(p.clone()),
            None => config::mnemonic_from_env().ok_or_else(|| EtherwalletError::ConfigError {
                reason: format!(
                    "no account selected: pass --key, --mnemonic, or set {}",
                    config::MNEMONIC_ENV
                ),
            })?,
        };
        open_mnemonic(&phrase, self.index, self.path.as_deref())
    }
}

/// Derives an account from a phrase using `$ETHERWALLET_PASSPHRASE`.
pub fn open_mnemonic(phrase: &str, index: u32, path: Option<&str>) -> Result<Account> {
    let mnemonic = Mnemonic::parse(phrase)?;
    let passphrase = config::passphrase_from_env();
    let seed = mnemonic.to_seed(&passphrase)?;
    match path {
        Some(p) => Account::from_seed_path(&seed, DerivationPath::from_str(p)?),
        None => Account::from_seed(&seed, index),
    }
}

/// The key store configured for this invocation.
pub fn key_store(opts: &GlobalOpts) -> FileKeyStore {
    FileKeyStore::new(opts.config.keystore_dir.clone())
}

// ---------------------------------------------------------------------------
// Argument parsing helpers
// ---------------------------------------------------------------------------

/// Parses a `0x` address, enforcing the checksum on mixed case.
pub fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s.trim())
}

/// Parses optional hex call data.
pub fn parse_data(data: Option<&str>) -> Result<Vec<u8>> {
    let Some(data) = data else {
        return Ok(Vec::new());
    };
    let body = data.trim();
    let body = body.strip_prefix("0x").unwrap_or(body);
    hex::decode(body).map_err(|e| EtherwalletError::EncodingError {
        reason: format!("call data is not valid hex: {e}"),
    })
}

/// Parses a decimal wei amount.
pub fn parse_wei(s: &str) -> Result<U256> {
    let digits = s.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EtherwalletError::EncodingError {
            reason: format!("invalid wei amount {s:?}: expected decimal digits"),
        });
    }
    U256::from_str_radix(digits, 10).map_err(|e| EtherwalletError::EncodingError {
        reason: format!("invalid wei amount {s:?}: {e}"),
    })
}
