//! Known-vector and property tests for derivation and hybrid encryption.
//!
//! Test vectors sourced from:
//! - BIP32: test vector 1 (seed `000102...0f`)

use etherwallet_crypto::ecies::{decrypt, encrypt, CipherBlob};
use etherwallet_crypto::hd_derive::{ChildIndex, DerivationPath, ExtendedKey};
use etherwallet_crypto::signing::{KeyPair, PrivateKey};
use etherwallet_types::EtherwalletError;
use proptest::prelude::*;

// ===================================================================
// BIP32 test vector 1
// ===================================================================

const BIP32_SEED: &str = "000102030405060708090a0b0c0d0e0f";

fn master() -> std::result::Result<ExtendedKey, Box<dyn std::error::Error>> {
    Ok(ExtendedKey::master_from_bytes(&hex::decode(BIP32_SEED)?)?)
}

fn private_hex(key: &ExtendedKey) -> String {
    key.private_key()
        .map(|k| hex::encode(k.to_bytes().as_slice()))
        .unwrap_or_default()
}

#[test]
fn bip32_vector1_master() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let m = master()?;
    assert_eq!(
        private_hex(&m),
        "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
    );
    assert_eq!(
        hex::encode(m.chain_code()),
        "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
    );
    assert_eq!(hex::encode(m.fingerprint()), "3442193e");
    Ok(())
}

#[test]
fn bip32_vector1_m_0h() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let child = master()?.derive_path(&"m/0'".parse()?)?;
    assert_eq!(
        private_hex(&child),
        "edb2e14f9ee77d26dd93b4ecede8d16ed408ce149b6cd80b0715a2d911a0afea"
    );
    assert_eq!(
        hex::encode(child.chain_code()),
        "47fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141"
    );
    assert_eq!(hex::encode(child.parent_fingerprint()), "3442193e");
    assert_eq!(child.depth(), 1);
    Ok(())
}

#[test]
fn bip32_vector1_m_0h_1() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let path: DerivationPath = "m/0H/1".parse()?;
    let child = master()?.derive_path(&path)?;
    assert_eq!(
        private_hex(&child),
        "3c6cb8d0f6a264c91ea8b5030fadaa8e538b020f0a387421a12de9319dc93368"
    );
    assert_eq!(
        hex::encode(child.chain_code()),
        "2a7857631386ba23dacac34180dd1983734e444fdbf774041578e9b6adb37c19"
    );
    assert_eq!(child.child_index(), 1);
    Ok(())
}

#[test]
fn bip32_vector1_public_derivation() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let parent = master()?.derive_child(ChildIndex::hardened(0))?;
    let via_public = parent.neuter().derive_child(ChildIndex::normal(1))?;
    let via_private = parent.derive_child(ChildIndex::normal(1))?;
    assert_eq!(via_public.public_key(), via_private.public_key());
    assert_eq!(via_public.chain_code(), via_private.chain_code());
    assert!(via_public.private_key().is_none());
    Ok(())
}

// ===================================================================
// Hybrid cipher
// ===================================================================

#[test]
fn encrypt_to_derived_account() -> std::result::Result<(), EtherwalletError> {
    let key = PrivateKey::from_hex(
        "0x4646464646464646464646464646464646464646464646464646464646464646",
    )?;
    let blob = encrypt(&key.public_key(), b"secret note")?;
    let wire = blob.to_bytes();
    let parsed = CipherBlob::from_bytes(&wire)?;
    assert_eq!(decrypt(&key, &parsed)?, b"secret note");
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn ecies_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..10_000)) {
        let recipient = KeyPair::generate();
        let blob = encrypt(recipient.public_key(), &plaintext)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let decrypted = decrypt(recipient.private_key(), &blob)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn ecies_ciphertext_bitflip_rejected(
        plaintext in proptest::collection::vec(any::<u8>(), 1..2_048),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let recipient = KeyPair::generate();
        let mut blob = encrypt(recipient.public_key(), &plaintext)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let i = position.index(blob.ciphertext.len());
        blob.ciphertext[i] ^= 1 << bit;

        let result = decrypt(recipient.private_key(), &blob);
        let rejected = matches!(result, Err(EtherwalletError::AuthenticationError { .. }));
        prop_assert!(rejected);
    }

    #[test]
    fn ecies_mac_bitflip_rejected(
        plaintext in proptest::collection::vec(any::<u8>(), 0..512),
        position in 0usize..32,
        bit in 0u8..8,
    ) {
        let recipient = KeyPair::generate();
        let mut blob = encrypt(recipient.public_key(), &plaintext)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        blob.mac[position] ^= 1 << bit;

        let result = decrypt(recipient.private_key(), &blob);
        let rejected = matches!(result, Err(EtherwalletError::AuthenticationError { .. }));
        prop_assert!(rejected);
    }
}
