//! Hybrid public-key encryption (ECIES over secp256k1).
//!
//! # Encryption
//!
//! 1. Generate a fresh ephemeral keypair.
//! 2. `shared = ECDH(ephemeral_sk, recipient_pk)`.
//! 3. `HKDF-SHA256(shared, info = "etherwallet-ecies-v1")` → 64 bytes:
//!    `enc_key[0..16] ‖ iv[16..32] ‖ mac_key[32..64]`.
//! 4. `ciphertext = AES-128-CTR(enc_key, iv, plaintext)`.
//! 5. `mac = HMAC-SHA256(mac_key, iv ‖ ciphertext ‖ ephemeral_pk)`.
//!
//! # Wire format
//!
//! ```text
//! ephemeral_pk (65, uncompressed) ‖ iv (16) ‖ ciphertext ‖ mac (32)
//! ```
//!
//! Decryption verifies the MAC in constant time before touching the
//! ciphertext, so a tampered blob never yields plaintext.

use aes::cipher::{KeyIvInit, StreamCipher};
use etherwallet_types::{EtherwalletError, Result};
use zeroize::Zeroizing;

use crate::ecdh::ecdh_derive_shared;
use crate::hkdf::hkdf_sha256;
use crate::mac::{hmac_sha256, verify_hmac_sha256, HMAC_SHA256_LEN};
use crate::signing::{PrivateKey, PublicKey};

/// AES-128 in big-endian counter mode.
type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

/// Domain separation string for the HKDF expansion.
const HKDF_INFO: &[u8] = b"etherwallet-ecies-v1";

/// AES-128 key length.
const ENC_KEY_LEN: usize = 16;

/// Counter-mode IV length.
pub const IV_LEN: usize = 16;

/// Smallest valid wire blob: empty ciphertext.
pub const MIN_BLOB_LEN: usize = PublicKey::UNCOMPRESSED_LEN + IV_LEN + HMAC_SHA256_LEN;

// ---------------------------------------------------------------------------
// CipherBlob
// ---------------------------------------------------------------------------

/// Self-contained ciphertext: everything except the recipient's private
/// key needed to decrypt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherBlob {
    /// One-time public key generated by the sender.
    pub ephemeral_public_key: PublicKey,
    /// Counter-mode IV.
    pub iv: [u8; IV_LEN],
    /// AES-128-CTR output, same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// HMAC-SHA256 over `iv ‖ ciphertext ‖ ephemeral_public_key`.
    pub mac: [u8; HMAC_SHA256_LEN],
}

impl CipherBlob {
    /// Serializes to the wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_BLOB_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.ephemeral_public_key.to_uncompressed());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.mac);
        out
    }

    /// Parses the wire format.
    ///
    /// # Errors
    ///
    /// - [`EtherwalletError::EncodingError`] if the blob is shorter than
    ///   [`MIN_BLOB_LEN`].
    /// - [`EtherwalletError::CurveError`] if the ephemeral key is not a
    ///   valid point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_BLOB_LEN {
            return Err(EtherwalletError::EncodingError {
                reason: format!(
                    "cipher blob must be at least {MIN_BLOB_LEN} bytes, got {}",
                    bytes.len()
                ),
            });
        }

        let (eph, rest) = bytes.split_at(PublicKey::UNCOMPRESSED_LEN);
        let (iv_bytes, rest) = rest.split_at(IV_LEN);
        let (ciphertext, mac_bytes) = rest.split_at(rest.len() - HMAC_SHA256_LEN);

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(iv_bytes);
        let mut mac = [0u8; HMAC_SHA256_LEN];
        mac.copy_from_slice(mac_bytes);

        Ok(Self {
            ephemeral_public_key: PublicKey::from_slice(eph)?,
            iv,
            ciphertext: ciphertext.to_vec(),
            mac,
        })
    }

    /// Hex rendering of [`Self::to_bytes`], `0x`-prefixed.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parses a hex blob, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let body = s.trim();
        let body = body.strip_prefix("0x").unwrap_or(body);
        let bytes = hex::decode(body).map_err(|_| EtherwalletError::EncodingError {
            reason: "cipher blob is not valid hex".into(),
        })?;
        Self::from_bytes(&bytes)
    }
}

// ---------------------------------------------------------------------------
// Key schedule
// ---------------------------------------------------------------------------

/// Keys derived from one ECDH shared secret.
struct SessionKeys {
    material: Zeroizing<[u8; 64]>,
}

impl SessionKeys {
    fn derive(our_secret: &PrivateKey, their_public: &PublicKey) -> Result<Self> {
        let shared = ecdh_derive_shared(our_secret, their_public);
        let okm = hkdf_sha256(shared.as_bytes(), b"", HKDF_INFO, 64)?;

        let mut material = Zeroizing::new([0u8; 64]);
        material.copy_from_slice(okm.as_bytes());
        Ok(Self { material })
    }

    fn enc_key(&self) -> &[u8] {
        &self.material[..ENC_KEY_LEN]
    }

    fn iv(&self) -> [u8; IV_LEN] {
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&self.material[ENC_KEY_LEN..ENC_KEY_LEN + IV_LEN]);
        iv
    }

    fn mac_key(&self) -> &[u8] {
        &self.material[ENC_KEY_LEN + IV_LEN..]
    }
}

fn apply_ctr(key: &[u8], iv: &[u8; IV_LEN], data: &mut [u8]) -> Result<()> {
    let mut cipher =
        Aes128Ctr::new_from_slices(key, iv).map_err(|e| EtherwalletError::AuthenticationError {
            reason: format!("AES-128-CTR init failed: {e}"),
        })?;
    cipher.apply_keystream(data);
    Ok(())
}

// ---------------------------------------------------------------------------
// Encrypt / Decrypt
// ---------------------------------------------------------------------------

/// Encrypts `plaintext` to `recipient` under a fresh ephemeral key.
pub fn encrypt(recipient: &PublicKey, plaintext: &[u8]) -> Result<CipherBlob> {
    let ephemeral = PrivateKey::generate();
    encrypt_with_ephemeral(recipient, plaintext, &ephemeral)
}

/// Deterministic core of [`encrypt`] with a caller-chosen ephemeral key.
///
/// Reusing an ephemeral key for two messages reuses the keystream.
pub(crate) fn encrypt_with_ephemeral(
    recipient: &PublicKey,
    plaintext: &[u8],
    ephemeral: &PrivateKey,
) -> Result<CipherBlob> {
    let keys = SessionKeys::derive(ephemeral, recipient)?;
    let ephemeral_public_key = ephemeral.public_key();
    let iv = keys.iv();

    let mut ciphertext = plaintext.to_vec();
    apply_ctr(keys.enc_key(), &iv, &mut ciphertext)?;

    let mac = hmac_sha256(
        keys.mac_key(),
        &[&iv, &ciphertext, &ephemeral_public_key.to_uncompressed()],
    )?;

    Ok(CipherBlob {
        ephemeral_public_key,
        iv,
        ciphertext,
        mac,
    })
}

/// Decrypts `blob` with the recipient's private key.
///
/// # Errors
///
/// [`EtherwalletError::AuthenticationError`] if the MAC does not match.
/// No plaintext is produced in that case.
pub fn decrypt(recipient: &PrivateKey, blob: &CipherBlob) -> Result<Vec<u8>> {
    let keys = SessionKeys::derive(recipient, &blob.ephemeral_public_key)?;

    verify_hmac_sha256(
        keys.mac_key(),
        &[
            &blob.iv,
            &blob.ciphertext,
            &blob.ephemeral_public_key.to_uncompressed(),
        ],
        &blob.mac,
    )?;

    let mut plaintext = blob.ciphertext.clone();
    apply_ctr(keys.enc_key(), &blob.iv, &mut plaintext)?;
    Ok(plaintext)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
