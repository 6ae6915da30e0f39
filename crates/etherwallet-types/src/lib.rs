//! Core shared types for the etherwallet workspace.
//!
//! This crate defines the fundamental value types (addresses, hashes,
//! chain parameters), the single workspace error enum, and the wallet
//! configuration. Every other crate depends on it; it depends on no
//! other workspace crate.

pub mod config;
pub mod units;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub use alloy_primitives::U256;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// 20-byte account address: the last 20 bytes of Keccak-256 over the
/// 64-byte uncompressed public key.
///
/// Displayed with the EIP-55 mixed-case checksum and a `0x` prefix.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Address(alloy_primitives::Address);

impl Address {
    /// The fixed byte length of an address.
    pub const LEN: usize = 20;

    /// Creates a new `Address` from raw bytes.
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(alloy_primitives::Address::new(bytes))
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0 .0 .0
    }

    /// Creates an `Address` from a slice, which must be exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| EtherwalletError::InvalidAddress {
            reason: format!("expected {} bytes, got {}", Self::LEN, bytes.len()),
        })?;
        Ok(Self::new(arr))
    }

    /// Renders the address with the EIP-55 mixed-case checksum.
    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self::new(bytes)
    }
}

impl From<Address> for alloy_primitives::Address {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = EtherwalletError;

    /// Parses a hex address with or without `0x`.
    ///
    /// All-lowercase and all-uppercase inputs are accepted as-is. Mixed
    /// case input must carry a valid EIP-55 checksum.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if body.len() != 40 {
            return Err(EtherwalletError::InvalidAddress {
                reason: format!("expected 40 hex characters, got {}", body.len()),
            });
        }

        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let parsed = if has_upper && has_lower {
            alloy_primitives::Address::parse_checksummed(format!("0x{body}"), None).map_err(
                |e| EtherwalletError::InvalidAddress {
                    reason: format!("EIP-55 checksum mismatch: {e}"),
                },
            )?
        } else {
            alloy_primitives::Address::from_str(body).map_err(|_| {
                EtherwalletError::InvalidAddress {
                    reason: "invalid hex encoding".into(),
                }
            })?
        };

        Ok(Self(parsed))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// 32-byte transaction hash (Keccak-256 of the encoded signed
/// transaction).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// The fixed byte length of a transaction hash.
    pub const LEN: usize = 32;

    /// Creates a new `TxHash` from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = EtherwalletError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let body = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let bytes = hex::decode(body).map_err(|_| EtherwalletError::EncodingError {
            reason: "invalid hex encoding for transaction hash".into(),
        })?;
        if bytes.len() != Self::LEN {
            return Err(EtherwalletError::EncodingError {
                reason: format!("expected 32 bytes for transaction hash, got {}", bytes.len()),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ---------------------------------------------------------------------------
// ChainParameters
// ---------------------------------------------------------------------------

/// Live chain parameters needed to build a transaction.
///
/// Fetched fresh from the chain client for every signing attempt and
/// never cached: a stale nonce makes the broadcast fail.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ChainParameters {
    /// Replay-protection chain identifier.
    pub chain_id: u64,
    /// Gas price suggested by the node, in wei.
    pub suggested_gas_price: U256,
    /// Next nonce for the sending account, including pending transactions.
    pub pending_nonce: u64,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Unified error type for every etherwallet crate.
///
/// Cryptographic failures are permanent for the given input. Only
/// [`EtherwalletError::NetworkError`] is worth retrying, and only by the
/// caller (see [`EtherwalletError::is_retryable`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EtherwalletError {
    /// Unsupported entropy length for mnemonic generation.
    #[error("entropy error: {reason}")]
    EntropyError {
        /// Human-readable description of the entropy problem.
        reason: String,
    },

    /// A mnemonic phrase is malformed or its checksum does not match.
    #[error("checksum error: {reason}")]
    ChecksumError {
        /// Human-readable description of the mnemonic failure.
        reason: String,
    },

    /// Hierarchical key derivation failed.
    #[error("derivation error: {reason}")]
    DerivationError {
        /// Human-readable description of the derivation failure.
        reason: String,
    },

    /// A point is not on the curve or a scalar is out of range.
    #[error("curve error: {reason}")]
    CurveError {
        /// Human-readable description of the curve failure.
        reason: String,
    },

    /// MAC verification failed while decrypting.
    #[error("authentication error: {reason}")]
    AuthenticationError {
        /// Human-readable description of the authentication failure.
        reason: String,
    },

    /// Signing failed or a signature could not be interpreted.
    #[error("signing error: {reason}")]
    SigningError {
        /// Human-readable description of the signing failure.
        reason: String,
    },

    /// The chain client could not be reached, timed out, or the node
    /// answered with a server error. Retryable by the caller.
    #[error("network error: {reason}")]
    NetworkError {
        /// Human-readable description of the network failure.
        reason: String,
    },

    /// The chain client answered with something that cannot be
    /// interpreted. Never retryable.
    #[error("malformed response: {reason}")]
    MalformedResponse {
        /// Human-readable description of the malformed payload.
        reason: String,
    },

    /// The node refused the request (e.g. nonce too low, underpriced).
    #[error("rejected by node ({code}): {reason}")]
    Rejected {
        /// JSON-RPC error code returned by the node.
        code: i64,
        /// Message returned by the node.
        reason: String,
    },

    /// Binary transaction encoding or decoding failed.
    #[error("encoding error: {reason}")]
    EncodingError {
        /// Human-readable description of the encoding failure.
        reason: String,
    },

    /// The provided address is malformed or fails checksum validation.
    #[error("invalid address: {reason}")]
    InvalidAddress {
        /// Human-readable description of why the address is invalid.
        reason: String,
    },

    /// A key store read or write failed.
    #[error("storage error: {reason}")]
    StorageError {
        /// Human-readable description of the storage failure.
        reason: String,
    },

    /// A named entry does not exist in the key store.
    #[error("not found: {name}")]
    NotFound {
        /// Name of the missing entry.
        name: String,
    },

    /// A configuration value is invalid or missing.
    #[error("config error: {reason}")]
    ConfigError {
        /// Human-readable description of the configuration problem.
        reason: String,
    },

    /// A long-running search stopped before finding a result.
    #[error("cancelled: {reason}")]
    Cancelled {
        /// Why the search stopped (token, deadline, iteration cap).
        reason: String,
    },
}

impl EtherwalletError {
    /// Returns `true` if the failure is transient and the caller may
    /// retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError { .. })
    }
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`EtherwalletError`].
pub type Result<T> = std::result::Result<T, EtherwalletError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
