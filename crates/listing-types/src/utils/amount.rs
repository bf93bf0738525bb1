//! Decimal string to base-unit conversions for token amounts.
//!
//! Listing prices are entered as decimal strings and submitted on-chain as
//! fixed-point integers scaled by the currency's decimals. Every step here is
//! pure `U256` integer arithmetic: a floating-point intermediate would round
//! user-entered amounts, which is a correctness bug rather than a display
//! nuisance.

use alloy_primitives::U256;
use thiserror::Error;

/// Errors that can occur converting decimal amounts.
#[derive(Debug, Clone, Error)]
pub enum AmountError {
	/// The input is not a non-negative decimal number.
	#[error("Invalid decimal amount '{0}'")]
	InvalidDecimal(String),
	/// The input carries more fractional digits than the currency supports.
	#[error("Amount '{0}' has more than {1} fractional digits")]
	PrecisionLoss(String, u8),
	/// The amount does not fit in a U256 after scaling.
	#[error("Amount '{0}' overflows")]
	Overflow(String),
}

/// Converts a decimal string to base units at the given decimal precision.
///
/// Accepts plain non-negative decimals ("12", "0.5", ".5", "1."). Fractional
/// digits beyond `decimals` are rejected with `PrecisionLoss` unless they are
/// trailing zeros, which carry no information.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
	let invalid = || AmountError::InvalidDecimal(amount.to_string());

	let trimmed = amount.trim();
	let (int_part, frac_part) = match trimmed.split_once('.') {
		Some((int_part, frac_part)) => (int_part, frac_part),
		None => (trimmed, ""),
	};

	if int_part.is_empty() && frac_part.is_empty() {
		return Err(invalid());
	}
	if !int_part.chars().all(|c| c.is_ascii_digit())
		|| !frac_part.chars().all(|c| c.is_ascii_digit())
	{
		return Err(invalid());
	}

	let significant_frac = frac_part.trim_end_matches('0');
	if significant_frac.len() > decimals as usize {
		return Err(AmountError::PrecisionLoss(amount.to_string(), decimals));
	}

	let overflow = || AmountError::Overflow(amount.to_string());
	let scale = U256::from(10).pow(U256::from(decimals));

	let whole = if int_part.is_empty() {
		U256::ZERO
	} else {
		U256::from_str_radix(int_part, 10).map_err(|_| overflow())?
	};

	// Right-pad the significant fractional digits to the full precision.
	let fractional = if significant_frac.is_empty() {
		U256::ZERO
	} else {
		let padded = format!("{:0<width$}", significant_frac, width = decimals as usize);
		U256::from_str_radix(&padded, 10).map_err(|_| overflow())?
	};

	whole
		.checked_mul(scale)
		.and_then(|scaled| scaled.checked_add(fractional))
		.ok_or_else(overflow)
}

/// Formats a base-unit amount as a decimal string at the given precision.
///
/// Trailing fractional zeros are trimmed and whole amounts render without a
/// decimal point, so the output is the canonical form of the amount.
pub fn from_base_units(amount: U256, decimals: u8) -> String {
	if decimals == 0 {
		return amount.to_string();
	}

	let divisor = U256::from(10).pow(U256::from(decimals));
	let whole = amount / divisor;
	let fractional = amount % divisor;

	let fractional_str = format!("{:0>width$}", fractional, width = decimals as usize);
	let trimmed = fractional_str.trim_end_matches('0');

	if trimmed.is_empty() {
		whole.to_string()
	} else {
		format!("{}.{}", whole, trimmed)
	}
}

/// Returns the canonical form of a decimal amount at the given precision.
pub fn normalize_amount(amount: &str, decimals: u8) -> Result<String, AmountError> {
	Ok(from_base_units(to_base_units(amount, decimals)?, decimals))
}
