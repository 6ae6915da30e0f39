//! etherwallet command-line client.
//!
//! Local commands (mnemonics, addresses, encryption, offline signing,
//! decoding, proof-of-work, key storage) never touch the network. Only
//! `balance` and `send` talk to the JSON-RPC endpoint.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use etherwallet_types::config::WalletConfig;
use etherwallet_types::EtherwalletError;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// etherwallet: Ethereum HD wallet.
#[derive(Parser)]
#[command(name = "etherwallet", version, about)]
struct Cli {
    /// Output in JSON format (no colors, machine-readable).
    #[arg(long, global = true)]
    json: bool,

    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON config file. Flags below override its values.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the node.
    #[arg(long, global = true, value_name = "URL")]
    rpc_url: Option<String>,

    /// Request timeout in seconds. Goes before the subcommand; `pow`
    /// has its own `--timeout`.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Directory of the named key store.
    #[arg(long, global = true, value_name = "DIR")]
    keystore_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new mnemonic and derive its first account.
    New(commands::account::NewArgs),
    /// Import an existing mnemonic (argument or stdin).
    Import(commands::account::ImportArgs),
    /// Show the address and public key of an account.
    Address(commands::account::AddressArgs),
    /// Encrypt a message to a public key.
    Encrypt(commands::crypt::EncryptArgs),
    /// Decrypt a message addressed to an account.
    Decrypt(commands::crypt::DecryptArgs),
    /// Query the balance of an address.
    Balance(commands::chain::BalanceArgs),
    /// Sign and broadcast a transfer.
    Send(commands::chain::SendArgs),
    /// Sign a transfer with explicit parameters, without the network.
    SignOffline(commands::tx::SignOfflineArgs),
    /// Decode a signed raw transaction.
    Decode(commands::tx::DecodeArgs),
    /// Search for a proof-of-work nonce.
    Pow(commands::pow::PowArgs),
    /// Manage the named key store.
    Key {
        #[command(subcommand)]
        action: commands::key::KeyAction,
    },
}

// ---------------------------------------------------------------------------
// Global options passed to every command handler
// ---------------------------------------------------------------------------

/// Shared options threaded into command handlers.
pub struct GlobalOpts {
    pub json: bool,
    pub config: WalletConfig,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let json = cli.json;
    let result = run(cli).await;

    if let Err(e) = result {
        output::print_error(&e.to_string(), json);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> std::result::Result<(), EtherwalletError> {
    let overrides = config::CliOverrides {
        config_path: cli.config,
        rpc_url: cli.rpc_url,
        timeout_secs: cli.timeout,
        keystore_dir: cli.keystore_dir,
    };
    let opts = GlobalOpts {
        json: cli.json,
        config: config::resolve(&overrides)?,
    };

    dispatch(&opts, cli.command).await
}

async fn dispatch(opts: &GlobalOpts, cmd: Commands) -> std::result::Result<(), EtherwalletError> {
    match cmd {
        Commands::New(args) => commands::account::new(args, opts),
        Commands::Import(args) => commands::account::import(args, opts),
        Commands::Address(args) => commands::account::address(args, opts),
        Commands::Encrypt(args) => commands::crypt::encrypt(args, opts),
        Commands::Decrypt(args) => commands::crypt::decrypt(args, opts),
        Commands::Balance(args) => commands::chain::balance(args, opts).await,
        Commands::Send(args) => commands::chain::send(args, opts).await,
        Commands::SignOffline(args) => commands::tx::sign_offline(args, opts),
        Commands::Decode(args) => commands::tx::decode(args, opts),
        Commands::Pow(args) => commands::pow::run(args, opts).await,
        Commands::Key { action } => commands::key::run(action, opts),
    }
}
