//! Wallet-level orchestration for etherwallet.
//!
//! - **Account** sessions derived from a mnemonic, a seed or a raw key
//! - **Encrypt / decrypt** messages to and from an account
//! - **Sign** transactions offline, or **send** them through a [`ChainClient`]
//! - **Persist** named private keys through a [`KeyStore`]
//!
//! [`ChainClient`]: etherwallet_chain::ChainClient

pub mod account;
pub mod keystore;

pub use account::Account;
pub use keystore::{FileKeyStore, KeyStore, MemoryKeyStore};
