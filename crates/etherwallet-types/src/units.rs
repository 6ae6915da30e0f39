//! Conversions between wei and decimal ether strings.

use alloy_primitives::U256;

use crate::{EtherwalletError, Result};

/// Number of decimal places in one ether.
pub const ETHER_DECIMALS: usize = 18;

/// One ether in wei.
pub fn wei_per_ether() -> U256 {
    U256::from(1_000_000_000_000_000_000u64)
}

/// Renders a wei amount as a decimal ether string.
///
/// Up to 18 fractional digits are kept and trailing zeros trimmed, so
/// `1_500_000_000_000_000_000` renders as `"1.5"` and one wei as
/// `"0.000000000000000001"`.
pub fn format_ether(wei: U256) -> String {
    let unit = wei_per_ether();
    let whole = wei / unit;
    let frac = wei % unit;

    if frac.is_zero() {
        return whole.to_string();
    }

    let frac_str = format!("{:0>width$}", frac.to_string(), width = ETHER_DECIMALS);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

/// Parses a decimal ether string (e.g. `"0.1"`, `"2"`) into wei.
///
/// Rejects empty input, signs, exponents, more than 18 fractional
/// digits, and values that overflow 256 bits.
pub fn parse_ether(s: &str) -> Result<U256> {
    let s = s.trim();
    let invalid = |reason: &str| EtherwalletError::EncodingError {
        reason: format!("invalid ether amount {s:?}: {reason}"),
    };

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("empty"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected decimal digits"));
    }
    if frac.len() > ETHER_DECIMALS {
        return Err(invalid("more than 18 fractional digits"));
    }

    let whole_wei = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| invalid("out of range"))?
    };

    let padded = format!("{frac:0<width$}", width = ETHER_DECIMALS);
    let frac_wei = U256::from_str_radix(&padded, 10).map_err(|_| invalid("out of range"))?;

    whole_wei
        .checked_mul(wei_per_ether())
        .and_then(|w| w.checked_add(frac_wei))
        .ok_or_else(|| invalid("out of range"))
}
