//! Network commands: `balance` and `send`.

use clap::Args;

use etherwallet_chain::{ChainClient, JsonRpcClient};
use etherwallet_types::units::{format_ether, parse_ether};
use etherwallet_types::Result;

use crate::commands::{parse_address, parse_data, AccountArgs};
use crate::output;
use crate::GlobalOpts;

#[derive(Args)]
pub struct BalanceArgs {
    /// Address to query.
    pub address: String,
}

#[derive(Args)]
pub struct SendArgs {
    /// Recipient address.
    #[arg(long)]
    pub to: String,

    /// Amount in ether, e.g. "0.1".
    #[arg(long, value_name = "ETH")]
    pub value_eth: String,

    /// Gas limit (default: config `default_gas_limit`).
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// Hex call data.
    #[arg(long, value_name = "HEX")]
    pub data: Option<String>,

    #[command(flatten)]
    pub account: AccountArgs,
}

pub async fn balance(args: BalanceArgs, opts: &GlobalOpts) -> Result<()> {
    let address = parse_address(&args.address)?;
    let client = JsonRpcClient::from_config(&opts.config)?;

    let wei = client.balance_of(&address).await?;

    output::print_fields(
        &[
            ("address", address.to_string()),
            ("wei", wei.to_string()),
            ("ether", format_ether(wei)),
        ],
        opts.json,
    );
    Ok(())
}

pub async fn send(args: SendArgs, opts: &GlobalOpts) -> Result<()> {
    let to = parse_address(&args.to)?;
    let value = parse_ether(&args.value_eth)?;
    let data = parse_data(args.data.as_deref())?;
    let gas_limit = args.gas_limit.unwrap_or(opts.config.default_gas_limit);

    let account = args.account.open(opts)?;
    let client = JsonRpcClient::from_config(&opts.config)?;

    let hash = account.send(&client, to, value, gas_limit, data).await?;

    output::print_fields(
        &[
            ("tx_hash", hash.to_string()),
            ("from", account.address().to_string()),
            ("to", to.to_string()),
            ("value_wei", value.to_string()),
        ],
        opts.json,
    );
    Ok(())
}
