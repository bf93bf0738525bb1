//! Formatting helpers for hex strings and log-friendly identifiers.

/// Ensures a hex string carries the "0x" prefix.
pub fn with_0x_prefix(hex: &str) -> String {
	if hex.starts_with("0x") {
		hex.to_string()
	} else {
		format!("0x{}", hex)
	}
}

/// Strips the "0x" prefix from a hex string if present.
pub fn without_0x_prefix(hex: &str) -> &str {
	hex.strip_prefix("0x").unwrap_or(hex)
}

/// Truncates a long identifier (hash, id) for log output.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_prefix_round_trip() {
		assert_eq!(with_0x_prefix("abcd"), "0xabcd");
		assert_eq!(with_0x_prefix("0xabcd"), "0xabcd");
		assert_eq!(without_0x_prefix("0xabcd"), "abcd");
		assert_eq!(without_0x_prefix("abcd"), "abcd");
	}

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("short"), "short");
		assert_eq!(
			truncate_id("0xabcdef0123456789abcdef0123456789"),
			"0xabcdef01.."
		);
	}
}
