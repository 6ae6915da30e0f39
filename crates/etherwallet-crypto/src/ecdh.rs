//! secp256k1 Elliptic-Curve Diffie-Hellman key agreement.
//!
//! The shared secret is the affine x-coordinate of `sk · PK`. Both
//! sides performing the operation with the other's public key obtain
//! the same 32 bytes.

use k256::ecdh::diffie_hellman;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::signing::{PrivateKey, PublicKey};

// ---------------------------------------------------------------------------
// SharedSecret
// ---------------------------------------------------------------------------

/// Shared secret derived from an ECDH exchange (32 bytes).
///
/// Automatically zeroized on drop. Feed it to a KDF; never use it
/// directly as a cipher key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Returns the raw 32-byte shared secret.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// SharedSecret does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// ECDH
// ---------------------------------------------------------------------------

/// Computes the shared secret between `our_secret` and `their_public`.
pub fn ecdh_derive_shared(our_secret: &PrivateKey, their_public: &PublicKey) -> SharedSecret {
    let shared = diffie_hellman(our_secret.inner.as_nonzero_scalar(), their_public.0.as_affine());
    let mut out = [0u8; 32];
    out.copy_from_slice(shared.raw_secret_bytes());
    SharedSecret(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_secret_matches_both_ways() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();

        let ab = ecdh_derive_shared(&a, &b.public_key());
        let ba = ecdh_derive_shared(&b, &a.public_key());
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn different_peers_different_secrets() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let c = PrivateKey::generate();

        let ac = ecdh_derive_shared(&a, &c.public_key());
        let bc = ecdh_derive_shared(&b, &c.public_key());
        assert_ne!(ac.as_bytes(), bc.as_bytes());
    }
}
