//! Configuration resolution for the CLI.
//!
//! Values are layered, later layers winning:
//!
//! 1. Built-in defaults ([`WalletConfig::default`])
//! 2. The JSON file given with `--config`
//! 3. Individual flags (`--rpc-url`, `--timeout`, `--keystore-dir`)
//!
//! The BIP39 passphrase has no flag; it is read only from
//! `ETHERWALLET_PASSPHRASE`. A mnemonic is taken from `--mnemonic` when
//! given, otherwise from `ETHERWALLET_MNEMONIC`.

use std::path::PathBuf;

use zeroize::Zeroizing;

use etherwallet_types::config::WalletConfig;
use etherwallet_types::Result;

/// Environment variable holding the optional BIP39 passphrase.
pub const PASSPHRASE_ENV: &str = "ETHERWALLET_PASSPHRASE";

/// Environment variable holding a mnemonic phrase.
pub const MNEMONIC_ENV: &str = "ETHERWALLET_MNEMONIC";

/// Flag values that override the config file.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub rpc_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub keystore_dir: Option<PathBuf>,
}

/// Builds the effective config and validates it.
pub fn resolve(cli: &CliOverrides) -> Result<WalletConfig> {
    let base = match &cli.config_path {
        Some(path) => WalletConfig::load(path)?,
        None => WalletConfig::default(),
    };
    let config = merge_cli(base, cli);
    config.validate()?;
    Ok(config)
}

/// Applies flag overrides onto a config-file base.
fn merge_cli(mut config: WalletConfig, cli: &CliOverrides) -> WalletConfig {
    if let Some(ref url) = cli.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout_secs = secs;
    }
    if let Some(ref dir) = cli.keystore_dir {
        config.keystore_dir = dir.clone();
    }
    config
}

/// BIP39 passphrase from the environment, empty when unset.
pub fn passphrase_from_env() -> Zeroizing<String> {
    Zeroizing::new(std::env::var(PASSPHRASE_ENV).unwrap_or_default())
}

/// Mnemonic from the environment, if set and non-empty.
pub fn mnemonic_from_env() -> Option<Zeroizing<String>> {
    std::env::var(MNEMONIC_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(Zeroizing::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use etherwallet_types::EtherwalletError;
    use std::io::Write;

    #[test]
    fn defaults_without_file_or_flags() -> std::result::Result<(), EtherwalletError> {
        let config = resolve(&CliOverrides::default())?;
        assert_eq!(config, WalletConfig::default());
        Ok(())
    }

    #[test]
    fn flags_override_file() -> std::result::Result<(), EtherwalletError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rpc_url": "http://file:8545", "request_timeout_secs": 3, "pow_difficulty": 2}}"#
        )
        .unwrap();

        let config = resolve(&CliOverrides {
            config_path: Some(file.path().to_path_buf()),
            rpc_url: Some("http://flag:8545".into()),
            timeout_secs: None,
            keystore_dir: Some(PathBuf::from("/tmp/keys")),
        })?;

        assert_eq!(config.rpc_url, "http://flag:8545");
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.pow_difficulty, 2);
        assert_eq!(config.keystore_dir, PathBuf::from("/tmp/keys"));
        Ok(())
    }

    #[test]
    fn invalid_override_rejected() {
        let result = resolve(&CliOverrides {
            timeout_secs: Some(0),
            ..CliOverrides::default()
        });
        assert!(matches!(result, Err(EtherwalletError::ConfigError { .. })));
    }

    #[test]
    fn missing_file_rejected() {
        let result = resolve(&CliOverrides {
            config_path: Some(PathBuf::from("/nonexistent/etherwallet.json")),
            ..CliOverrides::default()
        });
        assert!(matches!(result, Err(EtherwalletError::ConfigError { .. })));
    }
}
