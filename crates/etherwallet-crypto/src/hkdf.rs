//! HKDF-SHA256 key expansion for the hybrid cipher.
//!
//! Implements RFC 5869 extract-and-expand over SHA-256. The ECDH
//! shared secret is expanded into a cipher key, an IV and a MAC key.
//! The output is zeroized on drop.

use etherwallet_types::{EtherwalletError, Result};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum output length in bytes.
///
/// HKDF-SHA256 can produce up to `255 × 32` bytes; the hybrid cipher
/// needs 64, so larger requests are refused.
const MAX_OUTPUT_LEN: usize = 64;

// ---------------------------------------------------------------------------
// HkdfOutput
// ---------------------------------------------------------------------------

/// Variable-length key material derived by HKDF-SHA256.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct HkdfOutput {
    bytes: Vec<u8>,
}

impl HkdfOutput {
    /// Returns the derived key material as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// HkdfOutput does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// Derives `output_len` bytes from `ikm` using HKDF-SHA256.
///
/// An empty `salt` is passed through as "no salt", which RFC 5869 §2.2
/// defines as a zero-filled salt of hash length.
///
/// # Errors
///
/// [`EtherwalletError::DerivationError`] if `output_len` is 0 or
/// exceeds 64 bytes.
pub fn hkdf_sha256(ikm: &[u8], salt: &[u8], info: &[u8], output_len: usize) -> Result<HkdfOutput> {
    if output_len == 0 || output_len > MAX_OUTPUT_LEN {
        return Err(EtherwalletError::DerivationError {
            reason: format!("HKDF output length must be 1..={MAX_OUTPUT_LEN}, got {output_len}"),
        });
    }

    let salt_opt: Option<&[u8]> = if salt.is_empty() { None } else { Some(salt) };
    let hk = Hkdf::<Sha256>::new(salt_opt, ikm);

    let mut okm = vec![0u8; output_len];
    hk.expand(info, &mut okm).map_err(|e| EtherwalletError::DerivationError {
        reason: format!("HKDF-SHA256 expansion failed: {e}"),
    })?;

    Ok(HkdfOutput { bytes: okm })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn different_info_different_output() -> std::result::Result<(), EtherwalletError> {
        let ikm = [0x42u8; 32];
        let out_a = hkdf_sha256(&ikm, b"", b"info-a", 32)?;
        let out_b = hkdf_sha256(&ikm, b"", b"info-b", 32)?;
        assert_ne!(out_a.as_bytes(), out_b.as_bytes());
        Ok(())
    }

    #[test]
    fn output_len_bounds() {
        assert!(hkdf_sha256(&[0x01; 32], b"", b"info", 0).is_err());
        assert!(hkdf_sha256(&[0x01; 32], b"", b"info", 65).is_err());
        assert!(hkdf_sha256(&[0x01; 32], b"", b"info", 64).is_ok());
    }

    /// RFC 5869 Test Case 1 (HKDF-SHA256).
    #[test]
    fn rfc5869_test_vector_1() -> std::result::Result<(), EtherwalletError> {
        let ikm = [0x0bu8; 22];
        let salt: Vec<u8> = (0x00u8..=0x0c).collect();
        let info: Vec<u8> = (0xf0u8..=0xf9).collect();

        let out = hkdf_sha256(&ikm, &salt, &info, 42)?;
        assert_eq!(
            hex::encode(out.as_bytes()),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
        );
        Ok(())
    }
}
