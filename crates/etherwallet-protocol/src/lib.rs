//! Wire formats and protocol-level algorithms for etherwallet.
//!
//! # Modules
//!
//! - [`transaction`]: EIP-155 transaction build, signing hash, sign, RLP encode/decode
//! - [`pow`]: difficulty-targeted SHA-256 search with cooperative cancellation

pub mod pow;
pub mod transaction;
