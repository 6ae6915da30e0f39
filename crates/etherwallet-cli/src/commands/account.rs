//! Mnemonic and account commands: `new`, `import`, `address`.

use std::io::BufRead;

use clap::Args;
use zeroize::Zeroizing;

use etherwallet_types::{EtherwalletError, Result};
use etherwallet_wallet::Account;

use crate::commands::{key_store, open_mnemonic, AccountArgs};
use crate::config;
use crate::output;
use crate::GlobalOpts;

#[derive(Args)]
pub struct NewArgs {
    /// Number of mnemonic words (12, 15, 18, 21 or 24).
    #[arg(long, default_value_t = 12)]
    pub words: usize,

    /// Also save the derived private key under this name.
    #[arg(long, value_name = "NAME")]
    pub save: Option<String>,

    /// Print the private key.
    #[arg(long)]
    pub show_private: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Mnemonic phrase. Read from stdin when omitted.
    pub phrase: Option<String>,

    /// Account index on m/44'/60'/0'/0/<index>.
    #[arg(long, default_value_t = 0, conflicts_with = "path")]
    pub index: u32,

    /// Full derivation path, e.g. "m/44'/60'/1'/0/0".
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Save the derived private key under this name.
    #[arg(long, value_name = "NAME")]
    pub save: Option<String>,

    /// Print the private key.
    #[arg(long)]
    pub show_private: bool,
}

#[derive(Args)]
pub struct AddressArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// Print the private key.
    #[arg(long)]
    pub show_private: bool,
}

/// Entropy size for a BIP39 word count (`words * 32 / 3`).
fn entropy_bits_for_words(words: usize) -> Result<usize> {
    if words == 0 || words % 3 != 0 {
        return Err(EtherwalletError::EntropyError {
            reason: format!("unsupported word count {words}; use 12, 15, 18, 21 or 24"),
        });
    }
    Ok(words * 32 / 3)
}

pub fn new(args: NewArgs, opts: &GlobalOpts) -> Result<()> {
    let bits = entropy_bits_for_words(args.words)?;
    let passphrase = config::passphrase_from_env();
    let (mnemonic, account) = Account::create(bits, &passphrase)?;

    if let Some(name) = &args.save {
        account.save(&key_store(opts), name)?;
    }

    output::print_warning(
        "write the mnemonic down and keep it offline; it is shown only once",
        opts.json,
    );

    let mut fields = vec![("mnemonic", mnemonic.as_str().to_owned())];
    fields.extend(account_fields(&account, args.show_private));
    output::print_fields(&fields, opts.json);
    Ok(())
}

pub fn import(args: ImportArgs, opts: &GlobalOpts) -> Result<()> {
    let phrase = match args.phrase {
        Some(p) => Zeroizing::new(p),
        None => read_phrase_from_stdin()?,
    };
    let account = open_mnemonic(&phrase, args.index, args.path.as_deref())?;

    if let Some(name) = &args.save {
        account.save(&key_store(opts), name)?;
    }

    output::print_fields(&account_fields(&account, args.show_private), opts.json);
    Ok(())
}

pub fn address(args: AddressArgs, opts: &GlobalOpts) -> Result<()> {
    let account = args.account.open(opts)?;
    output::print_fields(&account_fields(&account, args.show_private), opts.json);
    Ok(())
}

/// Standard field set describing an account.
pub fn account_fields(account: &Account, show_private: bool) -> Vec<(&'static str, String)> {
    let mut fields = Vec::with_capacity(4);
    if let Some(path) = account.derivation_path() {
        fields.push(("path", path.to_string()));
    }
    fields.push(("address", account.address().to_string()));
    fields.push(("public_key", account.public_key().to_hex()));
    if show_private {
        fields.push(("private_key", account.private_key().to_hex().to_string()));
    }
    fields
}

fn read_phrase_from_stdin() -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| EtherwalletError::ConfigError {
            reason: format!("failed to read mnemonic from stdin: {e}"),
        })?;
    if line.trim().is_empty() {
        return Err(EtherwalletError::ChecksumError {
            reason: "empty mnemonic".into(),
        });
    }
    Ok(line)
}
