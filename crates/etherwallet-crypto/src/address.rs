//! Account address derivation.
//!
//! `address = Keccak-256(X ‖ Y)[12..32]`, where `X ‖ Y` is the 64-byte
//! uncompressed public point without its `0x04` prefix.

use etherwallet_types::Address;

use crate::hash::keccak256;
use crate::signing::PublicKey;

/// Derives the 20-byte account address of `public_key`.
pub fn address_of(public_key: &PublicKey) -> Address {
    let hash = keccak256(&public_key.to_raw());
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::new(out)
}
