//! Offline transaction tooling: `sign-offline` and `decode`.

use clap::Args;

use etherwallet_protocol::transaction::SignedTransaction;
use etherwallet_types::units::parse_ether;
use etherwallet_types::{ChainParameters, EtherwalletError, Result};

use crate::commands::{parse_address, parse_data, parse_wei, AccountArgs};
use crate::output;
use crate::GlobalOpts;

#[derive(Args)]
pub struct SignOfflineArgs {
    /// Recipient address.
    #[arg(long)]
    pub to: String,

    /// Amount in ether, e.g. "0.1".
    #[arg(long, value_name = "ETH")]
    pub value_eth: String,

    /// Sender nonce.
    #[arg(long)]
    pub nonce: u64,

    /// Gas price in wei.
    #[arg(long, value_name = "WEI")]
    pub gas_price: String,

    /// Replay-protection chain id.
    #[arg(long)]
    pub chain_id: u64,

    /// Gas limit (default: config `default_gas_limit`).
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// Hex call data.
    #[arg(long, value_name = "HEX")]
    pub data: Option<String>,

    #[command(flatten)]
    pub account: AccountArgs,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Signed transaction hex, with or without 0x.
    pub raw: String,
}

pub fn sign_offline(args: SignOfflineArgs, opts: &GlobalOpts) -> Result<()> {
    let to = parse_address(&args.to)?;
    let value = parse_ether(&args.value_eth)?;
    let data = parse_data(args.data.as_deref())?;
    let params = ChainParameters {
        chain_id: args.chain_id,
        suggested_gas_price: parse_wei(&args.gas_price)?,
        pending_nonce: args.nonce,
    };
    let gas_limit = args.gas_limit.unwrap_or(opts.config.default_gas_limit);

    let account = args.account.open(opts)?;
    let signed = account.sign_offline(to, value, gas_limit, &params, data)?;

    output::print_fields(
        &[
            ("raw", signed.raw_hex()),
            ("tx_hash", signed.hash().to_string()),
            ("from", account.address().to_string()),
        ],
        opts.json,
    );
    Ok(())
}

pub fn decode(args: DecodeArgs, opts: &GlobalOpts) -> Result<()> {
    let signed = SignedTransaction::from_hex(&args.raw)?;
    let sender = signed.recover_sender()?;

    let mut value = serde_json::to_value(&signed).map_err(|e| EtherwalletError::EncodingError {
        reason: format!("failed to render transaction: {e}"),
    })?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("from".into(), sender.to_string().into());
        obj.insert("hash".into(), signed.hash().to_string().into());
        obj.insert(
            "chain_id".into(),
            signed.chain_id().map_or(serde_json::Value::Null, Into::into),
        );
    }

    output::print_json_value(&value, opts.json);
    Ok(())
}
