//! Account sessions: one signing key plus its address.
//!
//! An [`Account`] is the unit the CLI works with. It can be created
//! from a fresh mnemonic, an imported phrase, a seed, a raw private key,
//! or a [`KeyStore`] entry. The private key lives only as long as the
//! account and is zeroized when it is dropped.
//!
//! # Send flow
//!
//! [`Account::send`] performs, in order:
//!
//! 1. Fetch fresh [`ChainParameters`] (chain id, gas price, pending nonce).
//! 2. Build the transaction.
//! 3. Sign it for the fetched chain id.
//! 4. Encode and broadcast it.
//!
//! Nothing is retried. A failed step aborts the flow with its error so
//! the caller can decide whether to try again with new parameters.

use etherwallet_chain::ChainClient;
use etherwallet_crypto::address::address_of;
use etherwallet_crypto::ecies::{self, CipherBlob};
use etherwallet_crypto::hd_derive::{derive_path, DerivationPath};
use etherwallet_crypto::mnemonic::{Mnemonic, Seed};
use etherwallet_crypto::signing::{KeyPair, PrivateKey, PublicKey};
use etherwallet_protocol::transaction::{SignedTransaction, Transaction};
use etherwallet_types::{Address, ChainParameters, Result, TxHash, U256};

use crate::keystore::KeyStore;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A signing key, its address, and the path it was derived on (if any).
pub struct Account {
    keypair: KeyPair,
    address: Address,
    path: Option<DerivationPath>,
}

// Account does not implement Clone/Debug to prevent leakage.

impl Account {
    // -- Construction -----------------------------------------------------

    /// Generates a new mnemonic and derives its first account.
    ///
    /// The mnemonic is returned so it can be shown to the user once.
    ///
    /// # Errors
    ///
    /// `EntropyError` for unsupported `entropy_bits`.
    pub fn create(entropy_bits: usize, passphrase: &str) -> Result<(Mnemonic, Self)> {
        let mnemonic = Mnemonic::generate(entropy_bits)?;
        let seed = mnemonic.to_seed(passphrase)?;
        let account = Self::from_seed(&seed, 0)?;
        Ok((mnemonic, account))
    }

    /// Derives account `index` (`m/44'/60'/0'/0/index`) from a phrase.
    ///
    /// # Errors
    ///
    /// `ChecksumError` if the phrase is not a valid mnemonic.
    pub fn from_mnemonic(phrase: &str, passphrase: &str, index: u32) -> Result<Self> {
        let mnemonic = Mnemonic::parse(phrase)?;
        let seed = mnemonic.to_seed(passphrase)?;
        Self::from_seed(&seed, index)
    }

    /// Derives account `index` from a seed.
    pub fn from_seed(seed: &Seed, index: u32) -> Result<Self> {
        Self::from_seed_path(seed, DerivationPath::ethereum_account(index))
    }

    /// Derives the account at an arbitrary path.
    pub fn from_seed_path(seed: &Seed, path: DerivationPath) -> Result<Self> {
        let keypair = derive_path(seed, &path)?;
        let address = address_of(keypair.public_key());
        tracing::info!(%address, %path, "account derived");
        Ok(Self {
            keypair,
            address,
            path: Some(path),
        })
    }

    /// Wraps a raw private key.
    pub fn from_private_key(key: PrivateKey) -> Self {
        Self::from_keypair(KeyPair::from_private(key))
    }

    /// Wraps an existing keypair.
    pub fn from_keypair(keypair: KeyPair) -> Self {
        let address = address_of(keypair.public_key());
        Self {
            keypair,
            address,
            path: None,
        }
    }

    /// Loads the key stored under `name`.
    pub fn load<S: KeyStore + ?Sized>(store: &S, name: &str) -> Result<Self> {
        store.load(name).map(Self::from_keypair)
    }

    /// Persists this account's private key under `name`.
    pub fn save<S: KeyStore + ?Sized>(&self, store: &S, name: &str) -> Result<()> {
        store.save(name, self.keypair.private_key())
    }

    // -- Accessors --------------------------------------------------------

    /// The account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The account public key.
    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    /// The account private key.
    pub fn private_key(&self) -> &PrivateKey {
        self.keypair.private_key()
    }

    /// Path the key was derived on, or `None` for imported raw keys.
    pub fn derivation_path(&self) -> Option<&DerivationPath> {
        self.path.as_ref()
    }

    // -- Messages ---------------------------------------------------------

    /// Encrypts `plaintext` so only the holder of `recipient`'s private
    /// key can read it.
    pub fn encrypt_for(recipient: &PublicKey, plaintext: &[u8]) -> Result<CipherBlob> {
        ecies::encrypt(recipient, plaintext)
    }

    /// Decrypts a message addressed to this account.
    ///
    /// # Errors
    ///
    /// `AuthenticationError` if the blob was tampered with or was not
    /// encrypted to this account.
    pub fn decrypt(&self, blob: &CipherBlob) -> Result<Vec<u8>> {
        ecies::decrypt(self.keypair.private_key(), blob)
    }

    // -- Transactions -----------------------------------------------------

    /// Signs `tx` for `chain_id`.
    pub fn sign_transaction(&self, tx: Transaction, chain_id: u64) -> Result<SignedTransaction> {
        tx.sign(self.keypair.private_key(), chain_id)
    }

    /// Builds and signs a transfer from explicitly supplied parameters,
    /// without touching the network.
    pub fn sign_offline(
        &self,
        to: Address,
        value: U256,
        gas_limit: u64,
        params: &ChainParameters,
        data: Vec<u8>,
    ) -> Result<SignedTransaction> {
        let tx = Transaction::build(to, value, gas_limit, params, data);
        self.sign_transaction(tx, params.chain_id)
    }

    /// Current balance of this account.
    pub async fn balance<C: ChainClient>(&self, client: &C) -> Result<U256> {
        client.balance_of(&self.address).await
    }

    /// Fetches fresh chain parameters, signs a transfer of `value` wei to
    /// `to`, and broadcasts it.
    ///
    /// # Errors
    ///
    /// Any error from the chain client is returned unchanged; nothing is
    /// retried. `SigningError` if signing fails.
    pub async fn send<C: ChainClient>(
        &self,
        client: &C,
        to: Address,
        value: U256,
        gas_limit: u64,
        data: Vec<u8>,
    ) -> Result<TxHash> {
        let params = client.chain_parameters(&self.address).await?;
        tracing::debug!(
            from = %self.address,
            chain_id = params.chain_id,
            nonce = params.pending_nonce,
            gas_price = %params.suggested_gas_price,
            "chain parameters fetched"
        );

        let signed = self.sign_offline(to, value, gas_limit, &params, data)?;
        let local_hash = signed.hash();

        let hash = client.broadcast(&signed.encode()).await.map_err(|e| {
            tracing::warn!(tx_hash = %local_hash, error = %e, "broadcast failed");
            e
        })?;

        if hash != local_hash {
            tracing::warn!(
                local = %local_hash,
                remote = %hash,
                "node reported a different transaction hash"
            );
        }
        tracing::info!(from = %self.address, %to, tx_hash = %hash, "transaction sent");
        Ok(hash)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
