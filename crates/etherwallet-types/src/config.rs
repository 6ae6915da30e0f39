//! Wallet configuration with sensible defaults.
//!
//! All operational parameters are centralized here. The CLI loads a
//! JSON file on top of these defaults and then applies flag overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EtherwalletError, Result};

/// Highest proof-of-work difficulty: a SHA-256 hex digest has 64 characters.
pub const MAX_POW_DIFFICULTY: u32 = 64;

/// Global wallet configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WalletConfig {
    /// JSON-RPC endpoint of the chain node.
    pub rpc_url: String,

    /// Per-request timeout for chain calls, in seconds.
    pub request_timeout_secs: u64,

    /// Directory holding named private keys.
    pub keystore_dir: PathBuf,

    /// Gas limit used by `send` when none is given.
    /// 21000 covers a plain value transfer.
    pub default_gas_limit: u64,

    // ----- Proof-of-work --------------------------------------------------

    /// Required number of leading hex `'0'` characters.
    pub pow_difficulty: u32,

    /// Wall-clock budget for a search before it is cancelled, in seconds.
    pub pow_timeout_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            request_timeout_secs: 10,
            keystore_dir: default_keystore_dir(),
            default_gas_limit: 21_000,
            pow_difficulty: 4,
            pow_timeout_secs: 60,
        }
    }
}

impl WalletConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| EtherwalletError::ConfigError {
            reason: format!("failed to read config file {}: {e}", path.display()),
        })?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|e| EtherwalletError::ConfigError {
                reason: format!("failed to parse config file {}: {e}", path.display()),
            })?;
        Ok(config)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Proof-of-work timeout as a [`Duration`].
    pub fn pow_timeout(&self) -> Duration {
        Duration::from_secs(self.pow_timeout_secs)
    }

    /// Validates all configuration values.
    ///
    /// Returns an error if any value is outside its acceptable range.
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(EtherwalletError::ConfigError {
                reason: "rpc_url must not be empty".into(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(EtherwalletError::ConfigError {
                reason: "request_timeout_secs must be greater than 0".into(),
            });
        }

        if self.default_gas_limit == 0 {
            return Err(EtherwalletError::ConfigError {
                reason: "default_gas_limit must be greater than 0".into(),
            });
        }

        if self.pow_timeout_secs == 0 {
            return Err(EtherwalletError::ConfigError {
                reason: "pow_timeout_secs must be greater than 0".into(),
            });
        }

        if self.pow_difficulty > MAX_POW_DIFFICULTY {
            return Err(EtherwalletError::ConfigError {
                reason: format!("pow_difficulty must be 0..={MAX_POW_DIFFICULTY}"),
            });
        }

        Ok(())
    }
}

/// Returns the platform-appropriate default key directory.
///
/// - Linux: `~/.local/share/etherwallet/keys`
/// - macOS: `~/Library/Application Support/etherwallet/keys`
/// - Windows: `C:\Users\<user>\AppData\Roaming\etherwallet\keys`
pub fn default_keystore_dir() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("etherwallet").join("keys")
}
