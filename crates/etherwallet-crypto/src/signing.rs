//! secp256k1 keys and recoverable ECDSA signatures.
//!
//! Signatures use RFC 6979 deterministic nonces and are normalized to
//! low-S, so the same key and digest always produce the same `(r, s, v)`.
//! The private key is zeroized on drop by `k256`'s `SigningKey`.

use std::fmt;

use etherwallet_types::{EtherwalletError, Result};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// secp256k1 private scalar in `[1, n - 1]`.
pub struct PrivateKey {
    pub(crate) inner: SigningKey,
}

// PrivateKey does not implement Clone/Debug to prevent leakage.

impl PrivateKey {
    /// Fixed byte length of a private scalar.
    pub const LEN: usize = 32;

    /// Generates a new random key using OS-level entropy.
    pub fn generate() -> Self {
        Self {
            inner: SigningKey::random(&mut OsRng),
        }
    }

    /// Creates a key from a 32-byte big-endian scalar.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::CurveError`] if the scalar is zero or not
    /// below the curve order.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = SigningKey::from_slice(bytes).map_err(|_| EtherwalletError::CurveError {
            reason: "private scalar must be in [1, n - 1]".into(),
        })?;
        Ok(Self { inner })
    }

    /// Parses a hex scalar, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let body = s.trim();
        let body = body.strip_prefix("0x").unwrap_or(body);
        let bytes = Zeroizing::new(hex::decode(body).map_err(|_| EtherwalletError::CurveError {
            reason: "private key is not valid hex".into(),
        })?);
        if bytes.len() != Self::LEN {
            return Err(EtherwalletError::CurveError {
                reason: format!("private key must be 32 bytes, got {}", bytes.len()),
            });
        }
        let mut arr = Zeroizing::new([0u8; 32]);
        arr.copy_from_slice(&bytes);
        Self::from_bytes(&arr)
    }

    /// Returns the big-endian scalar bytes.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Renders the scalar as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.to_bytes().as_slice())))
    }

    /// Returns the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(k256::PublicKey::from(self.inner.verifying_key()))
    }

    /// Signs a 32-byte digest, returning `(r, s)` plus the recovery id.
    ///
    /// The digest is used as-is (no further hashing).
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature> {
        let (signature, recovery_id) = self
            .inner
            .sign_prehash_recoverable(digest)
            .map_err(|e| EtherwalletError::SigningError {
                reason: format!("ECDSA signing failed: {e}"),
            })?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        })
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A validated secp256k1 public point (never the identity).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub(crate) k256::PublicKey);

impl PublicKey {
    /// Length of the uncompressed SEC1 encoding (`0x04 ‖ X ‖ Y`).
    pub const UNCOMPRESSED_LEN: usize = 65;

    /// Length of the compressed SEC1 encoding.
    pub const COMPRESSED_LEN: usize = 33;

    /// Parses a public key from SEC1 bytes (33 or 65) or a raw 64-byte
    /// `X ‖ Y` point.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::CurveError`] if the bytes do not describe a
    /// point on the curve.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let parsed = if bytes.len() == 64 {
            let mut sec1 = [0u8; 65];
            sec1[0] = 0x04;
            sec1[1..].copy_from_slice(bytes);
            k256::PublicKey::from_sec1_bytes(&sec1)
        } else {
            k256::PublicKey::from_sec1_bytes(bytes)
        };

        parsed.map(Self).map_err(|_| EtherwalletError::CurveError {
            reason: format!("{} bytes do not encode a secp256k1 point", bytes.len()),
        })
    }

    /// Parses a hex public key in any form accepted by [`Self::from_slice`].
    pub fn from_hex(s: &str) -> Result<Self> {
        let body = s.trim();
        let body = body.strip_prefix("0x").unwrap_or(body);
        let bytes = hex::decode(body).map_err(|_| EtherwalletError::CurveError {
            reason: "public key is not valid hex".into(),
        })?;
        Self::from_slice(&bytes)
    }

    /// Uncompressed SEC1 encoding, `0x04 ‖ X ‖ Y`.
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Compressed SEC1 encoding, `0x02/0x03 ‖ X`.
    pub fn to_compressed(&self) -> [u8; 33] {
        let point = self.0.to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// The 64-byte `X ‖ Y` point without the SEC1 prefix.
    pub fn to_raw(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(&self.to_uncompressed()[1..]);
        out
    }

    /// Hex of the 64-byte `X ‖ Y` point, `0x`-prefixed.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_raw()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// A private key together with its cached public key.
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

// KeyPair does not implement Clone/Debug to prevent leakage.

impl KeyPair {
    /// Builds a keypair from a private key.
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// Generates a random keypair.
    pub fn generate() -> Self {
        Self::from_private(PrivateKey::generate())
    }

    /// Returns the private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Returns the public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

// ---------------------------------------------------------------------------
// Recoverable signatures
// ---------------------------------------------------------------------------

/// ECDSA signature with the recovery id needed to rebuild the signer's
/// public key from the digest alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// Big-endian `r`.
    pub r: [u8; 32],
    /// Big-endian `s`, always in the lower half of the curve order.
    pub s: [u8; 32],
    /// Recovery id in `0..=3` (in practice `0` or `1`).
    pub recovery_id: u8,
}

/// Recovers the public key that produced `signature` over `digest`.
///
/// # Errors
///
/// [`EtherwalletError::SigningError`] if the components are out of
/// range or no key verifies the signature.
pub fn recover_public_key(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<PublicKey> {
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);

    let sig = Signature::from_slice(&rs).map_err(|e| EtherwalletError::SigningError {
        reason: format!("invalid signature components: {e}"),
    })?;
    let recovery_id =
        RecoveryId::from_byte(signature.recovery_id).ok_or_else(|| EtherwalletError::SigningError {
            reason: format!("invalid recovery id {}", signature.recovery_id),
        })?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id).map_err(|e| {
        EtherwalletError::SigningError {
            reason: format!("public key recovery failed: {e}"),
        }
    })?;

    Ok(PublicKey(k256::PublicKey::from(&verifying_key)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
