//! Integration tests for etherwallet-wallet.
//!
//! The chain is replaced by [`MockChain`], which serves fixed parameters,
//! records every broadcast and counts calls so tests can assert that the
//! send flow never retries.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use etherwallet_chain::ChainClient;
use etherwallet_crypto::hash::keccak256;
use etherwallet_protocol::transaction::SignedTransaction;
use etherwallet_types::{Address, ChainParameters, EtherwalletError, Result, TxHash, U256};
use etherwallet_wallet::{Account, FileKeyStore, KeyStore, MemoryKeyStore};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Well-known development mnemonic (account 0 = 0xf39F...2266).
const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

const RECIPIENT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

// ---------------------------------------------------------------------------
// MockChain
// ---------------------------------------------------------------------------

struct MockChain {
    params: ChainParameters,
    balance: U256,
    broadcast_error: Option<EtherwalletError>,
    nonce_error: Option<EtherwalletError>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
    nonce_calls: AtomicUsize,
    broadcast_calls: AtomicUsize,
}

impl MockChain {
    fn new(chain_id: u64, nonce: u64) -> Self {
        Self {
            params: ChainParameters {
                chain_id,
                suggested_gas_price: U256::from(2_000_000_000u64),
                pending_nonce: nonce,
            },
            balance: U256::from(5u64) * U256::from(10u64).pow(U256::from(17u64)),
            broadcast_error: None,
            nonce_error: None,
            broadcasts: Mutex::new(Vec::new()),
            nonce_calls: AtomicUsize::new(0),
            broadcast_calls: AtomicUsize::new(0),
        }
    }
}

impl ChainClient for MockChain {
    async fn pending_nonce(&self, _address: &Address) -> Result<u64> {
        self.nonce_calls.fetch_add(1, Ordering::SeqCst);
        match &self.nonce_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.params.pending_nonce),
        }
    }

    async fn suggest_gas_price(&self) -> Result<U256> {
        Ok(self.params.suggested_gas_price)
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.params.chain_id)
    }

    async fn balance_of(&self, _address: &Address) -> Result<U256> {
        Ok(self.balance)
    }

    async fn broadcast(&self, signed_tx: &[u8]) -> Result<TxHash> {
        self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.broadcast_error {
            return Err(e.clone());
        }
        self.broadcasts.lock().push(signed_tx.to_vec());
        Ok(TxHash::new(keccak256(signed_tx)))
    }
}

fn dev_account() -> Account {
    Account::from_mnemonic(DEV_MNEMONIC, "", 0).unwrap()
}

fn recipient() -> Address {
    Address::from_str(RECIPIENT).unwrap()
}

// ---------------------------------------------------------------------------
// Send flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_broadcasts_signed_transfer() -> std::result::Result<(), EtherwalletError> {
    let chain = MockChain::new(1337, 9);
    let account = dev_account();
    let value = U256::from(10u64).pow(U256::from(16u64));

    let hash = account
        .send(&chain, recipient(), value, 21_000, Vec::new())
        .await?;

    let sent = chain.broadcasts.lock().clone();
    assert_eq!(sent.len(), 1);

    let decoded = SignedTransaction::decode(&sent[0])?;
    let tx = decoded.transaction();
    assert_eq!(tx.nonce, 9);
    assert_eq!(tx.gas_price, U256::from(2_000_000_000u64));
    assert_eq!(tx.gas_limit, 21_000);
    assert_eq!(tx.to, recipient());
    assert_eq!(tx.value, value);
    assert!(tx.data.is_empty());
    assert_eq!(decoded.chain_id(), Some(1337));
    assert_eq!(decoded.recover_sender()?, account.address());
    assert_eq!(decoded.hash(), hash);
    Ok(())
}

#[tokio::test]
async fn send_carries_call_data() -> std::result::Result<(), EtherwalletError> {
    let chain = MockChain::new(1, 0);
    let account = dev_account();

    account
        .send(&chain, recipient(), U256::ZERO, 60_000, vec![0xa9, 0x05, 0x9c, 0xbb])
        .await?;

    let sent = chain.broadcasts.lock().clone();
    let decoded = SignedTransaction::decode(&sent[0])?;
    assert_eq!(decoded.transaction().data, vec![0xa9, 0x05, 0x9c, 0xbb]);
    assert_eq!(decoded.chain_id(), Some(1));
    Ok(())
}

#[tokio::test]
async fn send_fetches_fresh_nonce_each_time() -> std::result::Result<(), EtherwalletError> {
    let chain = MockChain::new(1, 4);
    let account = dev_account();

    account.send(&chain, recipient(), U256::from(1u64), 21_000, Vec::new()).await?;
    account.send(&chain, recipient(), U256::from(2u64), 21_000, Vec::new()).await?;

    assert_eq!(chain.nonce_calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn network_failure_is_not_retried() {
    let mut chain = MockChain::new(1, 0);
    chain.broadcast_error = Some(EtherwalletError::NetworkError {
        reason: "connection reset".into(),
    });
    let account = dev_account();

    let err = account
        .send(&chain, recipient(), U256::from(1u64), 21_000, Vec::new())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(chain.broadcast_calls.load(Ordering::SeqCst), 1);
    assert!(chain.broadcasts.lock().is_empty());
}

#[tokio::test]
async fn rejection_is_propagated_unchanged() {
    let mut chain = MockChain::new(1, 0);
    let rejection = EtherwalletError::Rejected {
        code: -32000,
        reason: "nonce too low".into(),
    };
    chain.broadcast_error = Some(rejection.clone());

    let err = dev_account()
        .send(&chain, recipient(), U256::from(1u64), 21_000, Vec::new())
        .await
        .unwrap_err();

    assert_eq!(err, rejection);
}

#[tokio::test]
async fn parameter_failure_aborts_before_broadcast() {
    let mut chain = MockChain::new(1, 0);
    chain.nonce_error = Some(EtherwalletError::MalformedResponse {
        reason: "bad quantity".into(),
    });

    let err = dev_account()
        .send(&chain, recipient(), U256::from(1u64), 21_000, Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, EtherwalletError::MalformedResponse { .. }));
    assert!(!err.is_retryable());
    assert_eq!(chain.broadcast_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn balance_reads_from_chain() -> std::result::Result<(), EtherwalletError> {
    let chain = MockChain::new(1, 0);
    let balance = dev_account().balance(&chain).await?;
    assert_eq!(balance, chain.balance);
    Ok(())
}

// ---------------------------------------------------------------------------
// Key persistence
// ---------------------------------------------------------------------------

#[test]
fn account_survives_file_store_round_trip() -> std::result::Result<(), EtherwalletError> {
    let dir = tempfile::tempdir().unwrap();
    let store = FileKeyStore::new(dir.path());
    let account = dev_account();

    account.save(&store, "dev")?;
    let restored = Account::load(&store, "dev")?;

    assert_eq!(restored.address(), account.address());
    assert!(restored.derivation_path().is_none());
    Ok(())
}

#[test]
fn account_works_through_trait_object() -> std::result::Result<(), EtherwalletError> {
    let store: Box<dyn KeyStore> = Box::new(MemoryKeyStore::new());
    let account = dev_account();

    account.save(store.as_ref(), "dev")?;
    assert_eq!(Account::load(store.as_ref(), "dev")?.address(), account.address());
    assert!(matches!(
        Account::load(store.as_ref(), "missing"),
        Err(EtherwalletError::NotFound { .. })
    ));
    Ok(())
}
