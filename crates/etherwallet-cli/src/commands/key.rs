//! Named key store commands.

use clap::Subcommand;

use etherwallet_types::Result;
use etherwallet_wallet::Account;

use crate::commands::account::account_fields;
use crate::commands::{key_store, AccountArgs};
use crate::output;
use crate::GlobalOpts;

#[derive(Subcommand)]
pub enum KeyAction {
    /// Save an account's private key under a name.
    Save {
        /// Entry name ([A-Za-z0-9_.-]).
        name: String,

        #[command(flatten)]
        account: AccountArgs,
    },
    /// Load a saved key and show its address.
    Load {
        /// Entry name.
        name: String,

        /// Print the private key.
        #[arg(long)]
        show_private: bool,
    },
}

pub fn run(action: KeyAction, opts: &GlobalOpts) -> Result<()> {
    match action {
        KeyAction::Save { name, account } => save(&name, &account, opts),
        KeyAction::Load { name, show_private } => load(&name, show_private, opts),
    }
}

fn save(name: &str, account: &AccountArgs, opts: &GlobalOpts) -> Result<()> {
    let account = account.open(opts)?;
    let store = key_store(opts);
    account.save(&store, name)?;

    if opts.json {
        output::print_fields(
            &[
                ("name", name.to_owned()),
                ("address", account.address().to_string()),
            ],
            true,
        );
    } else {
        output::print_success(
            &format!("saved {} as '{name}' in {}", account.address(), store.dir().display()),
            false,
        );
    }
    Ok(())
}

fn load(name: &str, show_private: bool, opts: &GlobalOpts) -> Result<()> {
    let account = Account::load(&key_store(opts), name)?;
    let mut fields = vec![("name", name.to_owned())];
    fields.extend(account_fields(&account, show_private));
    output::print_fields(&fields, opts.json);
    Ok(())
}
