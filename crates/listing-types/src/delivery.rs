//! Transaction hash and receipt types.
//!
//! This module defines types describing a submitted transaction: its hash,
//! used for explorer links and diagnostics, and the receipt returned once the
//! transaction has been included in a block.

use crate::with_0x_prefix;
use std::fmt;

/// Blockchain transaction hash representation.
///
/// Stores transaction hashes as raw bytes to support different blockchain formats.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionHash(pub Vec<u8>);

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", with_0x_prefix(&hex::encode(&self.0)))
	}
}

/// Transaction receipt containing execution details.
///
/// Provides information about a transaction after it has been included in a
/// block, including its success status and block number.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}
