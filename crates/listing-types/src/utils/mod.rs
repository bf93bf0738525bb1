//! Utility functions for common type conversions and formatting.

/// Decimal string to base-unit conversions for token amounts.
pub mod amount;
/// Address parsing and alloy type conversions.
pub mod conversion;
/// Hex prefix handling and identifier truncation for logs.
pub mod formatting;
