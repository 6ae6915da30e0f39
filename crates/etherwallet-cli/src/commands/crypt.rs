//! `encrypt` / `decrypt`: hybrid public-key encryption of short messages.

use clap::Args;

use etherwallet_crypto::ecies::CipherBlob;
use etherwallet_crypto::signing::PublicKey;
use etherwallet_types::Result;
use etherwallet_wallet::Account;

use crate::commands::AccountArgs;
use crate::output;
use crate::GlobalOpts;

#[derive(Args)]
pub struct EncryptArgs {
    /// Recipient public key (hex: 64-byte X||Y, or 33/65-byte SEC1).
    pub recipient: String,

    /// Message to encrypt.
    pub message: String,
}

#[derive(Args)]
pub struct DecryptArgs {
    /// Ciphertext as printed by `encrypt`.
    pub ciphertext: String,

    #[command(flatten)]
    pub account: AccountArgs,
}

pub fn encrypt(args: EncryptArgs, opts: &GlobalOpts) -> Result<()> {
    let recipient = PublicKey::from_hex(&args.recipient)?;
    let blob = Account::encrypt_for(&recipient, args.message.as_bytes())?;
    output::print_fields(&[("ciphertext", blob.to_hex())], opts.json);
    Ok(())
}

pub fn decrypt(args: DecryptArgs, opts: &GlobalOpts) -> Result<()> {
    let blob = CipherBlob::from_hex(&args.ciphertext)?;
    let account = args.account.open(opts)?;
    let plaintext = account.decrypt(&blob)?;

    match String::from_utf8(plaintext) {
        Ok(text) => output::print_fields(&[("plaintext", text)], opts.json),
        Err(e) => output::print_fields(
            &[("plaintext_hex", format!("0x{}", hex::encode(e.into_bytes())))],
            opts.json,
        ),
    }
    Ok(())
}
