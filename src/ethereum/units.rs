//! Token amount conversions
//!
//! Amounts are stored as integers in the token's smallest unit. For display
//! they are converted to whole tokens rounded to two decimals.

use crate::{Error, Result};
use alloy::primitives::U256;

/// EIP-20 decimals of the tokens we handle. Hardcoded since it is the same
/// for every token we use and asking the contract would cost a request per
/// conversion.
pub const TOKEN_DECIMALS: u32 = 18;

const DISPLAY_DECIMALS: u32 = 2;

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Convert a base-unit amount to whole tokens, rounded half-up to two
/// decimals. Trailing zeros are dropped and exponent notation is never used.
pub fn to_base_unit(amount: U256) -> String {
    let step = pow10(TOKEN_DECIMALS - DISPLAY_DECIMALS);
    let mut hundredths = amount / step;
    if amount % step >= step / U256::from(2u64) {
        hundredths += U256::from(1u64);
    }

    let whole = hundredths / U256::from(100u64);
    let fraction = hundredths % U256::from(100u64);
    if fraction.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>2}", fraction.to_string());
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Convert a decimal token amount such as `"12.5"` to base units, rounding
/// half-up to the nearest integer.
pub fn from_base_unit(amount: &str) -> Result<U256> {
    let invalid = || Error::InvalidArgument(format!("Invalid token amount: {}", amount));

    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(invalid());
    }

    let decimals = TOKEN_DECIMALS as usize;
    let (kept, dropped) = if fraction.len() > decimals {
        fraction.split_at(decimals)
    } else {
        (fraction, "")
    };

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| invalid())?
    };
    let kept = if kept.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(kept, 10).map_err(|_| invalid())?
            * pow10((decimals - kept.len()) as u32)
    };

    let mut value = whole
        .checked_mul(pow10(TOKEN_DECIMALS))
        .and_then(|v| v.checked_add(kept))
        .ok_or_else(invalid)?;
    if dropped.as_bytes().first().is_some_and(|d| *d >= b'5') {
        value = value.checked_add(U256::from(1u64)).ok_or_else(invalid)?;
    }
    Ok(value)
}
