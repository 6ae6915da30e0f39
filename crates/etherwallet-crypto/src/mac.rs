//! HMAC message authentication codes.
//!
//! HMAC-SHA256 authenticates hybrid-cipher payloads (Encrypt-then-MAC);
//! HMAC-SHA512 drives BIP32 master and child key derivation.

use etherwallet_types::{EtherwalletError, Result};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};

/// HMAC-SHA256 type alias.
type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA512 type alias.
type HmacSha512 = Hmac<Sha512>;

/// Fixed output length of HMAC-SHA256 in bytes.
pub const HMAC_SHA256_LEN: usize = 32;

/// Computes HMAC-SHA256 over the concatenation of `parts` using `key`.
///
/// Taking the message in parts lets callers authenticate
/// `iv ‖ ciphertext ‖ ephemeral_key` without building a temporary buffer.
///
/// # Errors
///
/// Returns [`EtherwalletError::AuthenticationError`] if HMAC
/// initialisation fails (should not happen with SHA-256, but we avoid
/// `unwrap`).
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| {
        EtherwalletError::AuthenticationError {
            reason: format!("HMAC-SHA256 key init failed: {e}"),
        }
    })?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().into())
}

/// Verifies an HMAC-SHA256 tag in constant time.
///
/// # Errors
///
/// Returns [`EtherwalletError::AuthenticationError`] if the computed tag
/// does not match `expected`.
pub fn verify_hmac_sha256(key: &[u8], parts: &[&[u8]], expected: &[u8]) -> Result<()> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| {
        EtherwalletError::AuthenticationError {
            reason: format!("HMAC-SHA256 key init failed: {e}"),
        }
    })?;
    for part in parts {
        mac.update(part);
    }

    mac.verify_slice(expected)
        .map_err(|_| EtherwalletError::AuthenticationError {
            reason: "MAC verification failed: tag mismatch".into(),
        })
}

/// Computes HMAC-SHA512 and returns the 64-byte output.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|e| {
        EtherwalletError::DerivationError {
            reason: format!("HMAC-SHA512 key init failed: {e}"),
        }
    })?;
    mac.update(data);
    let result = mac.finalize().into_bytes();

    let mut output = [0u8; 64];
    output.copy_from_slice(&result);
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
