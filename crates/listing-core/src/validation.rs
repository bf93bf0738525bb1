//! Input validation for listing forms.
//!
//! Pure functions checking raw user input against the domain constraints
//! before anything touches the execution layer. Price validation is tolerant
//! of in-progress typing: an empty field or a partially typed zero is not an
//! error, it is simply not submittable yet.

use crate::ListingError;
use listing_types::{parse_address, to_base_units, Address};

/// Inclusive price bounds, expressed at 18-decimal precision for exact
/// integer comparison.
const PRICE_DECIMALS: u8 = 18;
const MIN_PRICE_BASE_UNITS: u128 = 10_000_000_000_000_000; // 0.01
const MAX_PRICE_WHOLE: u128 = 999_999_999;

/// Validates a raw price string.
///
/// Accepts the empty string and in-progress zero forms ("0", "0.", "0.00")
/// so the field stays editable while the user types, and otherwise requires
/// a non-negative decimal in the inclusive range [0.01, 999_999_999].
/// Returns the trimmed decimal string on success.
pub fn validate_price(raw: &str) -> Result<String, ListingError> {
	let trimmed = raw.trim();

	if trimmed.is_empty() || is_zero_in_progress(trimmed) {
		return Ok(trimmed.to_string());
	}

	let base_units = to_base_units(trimmed, PRICE_DECIMALS)
		.map_err(|e| ListingError::InvalidAmount(e.to_string()))?;

	let min = alloy_primitives::U256::from(MIN_PRICE_BASE_UNITS);
	let max = alloy_primitives::U256::from(MAX_PRICE_WHOLE)
		* alloy_primitives::U256::from(10u64).pow(alloy_primitives::U256::from(PRICE_DECIMALS));

	if base_units < min || base_units > max {
		return Err(ListingError::InvalidAmount(format!(
			"'{}' is outside the allowed range [0.01, 999999999]",
			trimmed
		)));
	}

	Ok(trimmed.to_string())
}

/// Returns true for a partially typed zero such as "0", "0." or "0.00".
fn is_zero_in_progress(raw: &str) -> bool {
	raw.chars().all(|c| c == '0' || c == '.')
		&& raw.chars().filter(|&c| c == '.').count() <= 1
		&& raw.contains('0')
}

/// Validates a raw address string.
///
/// Valid only as a 0x-prefixed 42-character hexadecimal string.
pub fn validate_address(raw: &str) -> Result<Address, ListingError> {
	if !raw.starts_with("0x") || raw.len() != 42 {
		return Err(ListingError::InvalidAddress(format!(
			"'{}' is not a 0x-prefixed 42-character hex string",
			raw
		)));
	}
	parse_address(raw).map_err(ListingError::InvalidAddress)
}

/// Validates an auction duration against the configured discrete set.
pub fn validate_duration(seconds: u64, allowed: &[u64]) -> Result<u64, ListingError> {
	if allowed.contains(&seconds) {
		Ok(seconds)
	} else {
		Err(ListingError::InvalidDuration(seconds))
	}
}
