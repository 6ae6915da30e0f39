//! Cryptographic primitives for the etherwallet engine.
//!
//! This crate is the **sole** location for raw cryptographic operations.
//! Curve arithmetic is delegated to `k256`; nothing here reimplements
//! field or group operations.
//!
//! # Modules
//!
//! - [`mnemonic`]: BIP39 generation, validation and seed derivation
//! - [`hd_derive`]: BIP32 secp256k1 extended keys and derivation paths
//! - [`signing`]: secp256k1 keys and recoverable ECDSA
//! - [`address`]: public key to account address
//! - [`ecdh`]: secp256k1 Diffie-Hellman
//! - [`ecies`]: hybrid public-key encryption
//! - [`hash`]: Keccak-256, SHA-256 and HASH160
//! - [`hkdf`]: HKDF-SHA256 key expansion
//! - [`mac`]: HMAC-SHA256 / HMAC-SHA512

pub mod address;
pub mod ecdh;
pub mod ecies;
pub mod hash;
pub mod hd_derive;
pub mod hkdf;
pub mod mac;
pub mod mnemonic;
pub mod signing;
pub mod wordlist;
