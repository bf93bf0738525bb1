//! Conversion utilities for addresses.

use crate::Address;
use alloy_primitives::Address as AlloyAddress;

use super::formatting::without_0x_prefix;

/// Parse a hex string address to the listing Address type.
///
/// Accepts hex strings with or without the "0x" prefix and requires exactly
/// 20 bytes.
pub fn parse_address(hex_str: &str) -> Result<Address, String> {
	let hex = without_0x_prefix(hex_str);
	hex::decode(hex)
		.map_err(|e| format!("Invalid hex: {}", e))
		.and_then(|bytes| {
			if bytes.len() != 20 {
				Err(format!(
					"Invalid address length: expected 20 bytes, got {}",
					bytes.len()
				))
			} else {
				Ok(Address(bytes))
			}
		})
}

/// Converts a listing Address to an Alloy `Address`.
///
/// The input must hold at least 20 bytes; addresses built through
/// `parse_address` or deserialization always do.
pub fn to_alloy_address(address: &Address) -> AlloyAddress {
	let mut arr = [0u8; 20];
	arr.copy_from_slice(&address.0[..20]);
	AlloyAddress::from(arr)
}
