//! Difficulty-targeted hash search.
//!
//! # Algorithm
//!
//! ```text
//! hash_hex = hex(SHA-256(data || decimal(nonce)))
//! accepted = hash_hex starts with `difficulty` '0' characters
//! ```
//!
//! Nonces are tried in order from 0, so the result is the smallest
//! accepted nonce. Acceptance is computed from each attempt's own hash;
//! nothing carries over between attempts.
//!
//! # Stopping
//!
//! Expected work is `16^difficulty` hashes, so every search runs under
//! [`SearchLimits`]: a [`CancelToken`] and a deadline polled every
//! [`CHECK_INTERVAL`] attempts, plus an optional hard iteration cap.
//!
//! # Warning
//!
//! This function is CPU-intensive. Callers in async contexts should
//! use `tokio::task::spawn_blocking` to avoid blocking the runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use etherwallet_crypto::hash::sha256;
use etherwallet_types::config::MAX_POW_DIFFICULTY;
use etherwallet_types::{EtherwalletError, Result};
use serde::Serialize;

/// Attempts between checks of the cancel token and deadline.
pub const CHECK_INTERVAL: u64 = 1024;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared flag that asks a running search to stop.
///
/// Clones share the same flag, so one clone can be handed to the search
/// and another kept by whoever decides to cancel.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the "not cancelled" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`Self::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Stop conditions for [`search`]. The default has none.
#[derive(Clone, Debug, Default)]
pub struct SearchLimits {
    /// Cooperative cancellation flag.
    pub cancel: Option<CancelToken>,
    /// Wall-clock instant after which the search gives up.
    pub deadline: Option<Instant>,
    /// Maximum number of hashes to compute.
    pub max_iterations: Option<u64>,
}

impl SearchLimits {
    /// Limits with only a timeout, measured from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::default()
        }
    }

    fn stop_reason(&self, attempts: u64) -> Option<String> {
        if let Some(max) = self.max_iterations {
            if attempts >= max {
                return Some(format!("iteration cap of {max} reached"));
            }
        }
        if attempts % CHECK_INTERVAL != 0 {
            return None;
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(format!("cancelled after {attempts} attempts"));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(format!("deadline passed after {attempts} attempts"));
        }
        None
    }
}

// ---------------------------------------------------------------------------
// ProofOfWork
// ---------------------------------------------------------------------------

/// Result of a successful search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProofOfWork {
    /// Smallest nonce meeting the difficulty.
    pub nonce: u64,
    /// Lowercase hex SHA-256 digest for `nonce`.
    pub hash_hex: String,
    /// Difficulty the search targeted.
    pub difficulty: u32,
    /// Number of hashes computed, including the accepted one.
    pub attempts: u64,
}

// ---------------------------------------------------------------------------
// Search / verify
// ---------------------------------------------------------------------------

/// Finds the smallest nonce whose hash has `difficulty` leading `'0'`
/// hex characters.
///
/// # Errors
///
/// - [`EtherwalletError::ConfigError`] if `difficulty` exceeds 64.
/// - [`EtherwalletError::Cancelled`] if a stop condition in `limits`
///   fires before a nonce is found.
pub fn search(data: &[u8], difficulty: u32, limits: &SearchLimits) -> Result<ProofOfWork> {
    if difficulty > MAX_POW_DIFFICULTY {
        return Err(EtherwalletError::ConfigError {
            reason: format!("PoW difficulty {difficulty} exceeds maximum {MAX_POW_DIFFICULTY}"),
        });
    }

    let mut attempts: u64 = 0;
    for nonce in 0..=u64::MAX {
        if let Some(reason) = limits.stop_reason(attempts) {
            tracing::debug!(attempts, difficulty, "proof-of-work search stopped");
            return Err(EtherwalletError::Cancelled { reason });
        }

        let hash_hex = pow_hash_hex(data, nonce);
        attempts += 1;

        if leading_zero_chars(&hash_hex) >= difficulty {
            tracing::debug!(nonce, attempts, difficulty, "proof-of-work found");
            return Ok(ProofOfWork {
                nonce,
                hash_hex,
                difficulty,
                attempts,
            });
        }
    }

    Err(EtherwalletError::Cancelled {
        reason: "nonce space exhausted".into(),
    })
}

/// Recomputes the hash for `nonce` and checks it against `difficulty`.
pub fn verify(data: &[u8], nonce: u64, difficulty: u32) -> bool {
    difficulty <= MAX_POW_DIFFICULTY && leading_zero_chars(&pow_hash_hex(data, nonce)) >= difficulty
}

/// `hex(SHA-256(data || decimal(nonce)))`.
pub fn pow_hash_hex(data: &[u8], nonce: u64) -> String {
    let decimal = nonce.to_string();
    let mut preimage = Vec::with_capacity(data.len() + decimal.len());
    preimage.extend_from_slice(data);
    preimage.extend_from_slice(decimal.as_bytes());
    hex::encode(sha256(&preimage))
}

fn leading_zero_chars(hash_hex: &str) -> u32 {
    hash_hex.bytes().take_while(|&c| c == b'0').count() as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_chars_counts_prefix_only() {
        assert_eq!(leading_zero_chars("000a00"), 3);
        assert_eq!(leading_zero_chars("a000"), 0);
        assert_eq!(leading_zero_chars(&"0".repeat(64)), 64);
    }

    #[test]
    fn difficulty_zero_accepts_first_nonce() -> std::result::Result<(), EtherwalletError> {
        let pow = search(b"anything", 0, &SearchLimits::default())?;
        assert_eq!(pow.nonce, 0);
        assert_eq!(pow.attempts, 1);
        Ok(())
    }

    #[test]
    fn found_nonce_verifies() -> std::result::Result<(), EtherwalletError> {
        let pow = search(b"block", 2, &SearchLimits::default())?;
        assert!(verify(b"block", pow.nonce, 2));
        assert!(pow.hash_hex.starts_with("00"));
        assert_eq!(pow.hash_hex, pow_hash_hex(b"block", pow.nonce));
        Ok(())
    }

    #[test]
    fn difficulty_above_max_rejected() {
        assert!(matches!(
            search(b"x", 65, &SearchLimits::default()),
            Err(EtherwalletError::ConfigError { .. })
        ));
        assert!(!verify(b"x", 0, 65));
    }

    #[test]
    fn pre_cancelled_token_stops_immediately() {
        let token = CancelToken::new();
        token.cancel();
        let limits = SearchLimits {
            cancel: Some(token.clone()),
            ..SearchLimits::default()
        };
        assert!(matches!(
            search(b"x", 64, &limits),
            Err(EtherwalletError::Cancelled { .. })
        ));
    }

    #[test]
    fn iteration_cap_stops_search() {
        let limits = SearchLimits {
            max_iterations: Some(10),
            ..SearchLimits::default()
        };
        match search(b"x", 64, &limits) {
            Err(EtherwalletError::Cancelled { reason }) => assert!(reason.contains("10")),
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[test]
    fn past_deadline_stops_search() {
        let limits = SearchLimits::with_timeout(Duration::ZERO);
        assert!(matches!(
            search(b"x", 64, &limits),
            Err(EtherwalletError::Cancelled { .. })
        ));
    }

    #[test]
    fn token_cancelled_from_another_thread() {
        let token = CancelToken::new();
        let limits = SearchLimits {
            cancel: Some(token.clone()),
            ..SearchLimits::default()
        };
        let handle = std::thread::spawn(move || search(b"x", 64, &limits));
        std::thread::sleep(Duration::from_millis(20));
        token.cancel();

        let result = handle.join();
        assert!(matches!(result, Ok(Err(EtherwalletError::Cancelled { .. }))));
    }
}
