//! Address and transaction types for the listing system.
//!
//! This module defines the address and transaction representations used when
//! building marketplace calls and handing them to the execution layer.

use crate::with_0x_prefix;
use alloy_primitives::{Address as AlloyAddress, Bytes, U256};
use alloy_rpc_types::TransactionRequest;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Blockchain address representation.
///
/// Stores addresses as raw bytes to support different blockchain formats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(pub Vec<u8>);

/// Custom serialization for Address - serializes as hex string
impl Serialize for Address {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&with_0x_prefix(&hex::encode(&self.0)))
	}
}

/// Custom deserialization for Address - accepts hex strings
impl<'de> Deserialize<'de> for Address {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		let hex_str = s.trim_start_matches("0x");
		let bytes = hex::decode(hex_str)
			.map_err(|e| serde::de::Error::custom(format!("Invalid hex address: {}", e)))?;

		// Validate address length (should be 20 bytes for Ethereum addresses)
		if bytes.len() != 20 {
			return Err(serde::de::Error::custom(format!(
				"Invalid address length: expected 20 bytes, got {}",
				bytes.len()
			)));
		}

		Ok(Address(bytes))
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(&self.0))
	}
}

/// The zero address, used as the "no curator" sentinel in auction calls.
pub const ZERO_ADDRESS: [u8; 20] = [0u8; 20];

impl Address {
	/// Returns the zero address.
	pub fn zero() -> Self {
		Address(ZERO_ADDRESS.to_vec())
	}

	/// Returns true if this is the zero address.
	pub fn is_zero(&self) -> bool {
		self.0.iter().all(|&b| b == 0)
	}
}

/// Blockchain transaction representation.
///
/// Contains the fields necessary for constructing marketplace calls and
/// submitting them through the execution layer. Fee and nonce management is
/// left to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
	/// Recipient contract address.
	pub to: Address,
	/// Transaction data/calldata.
	pub data: Vec<u8>,
	/// Value to transfer in native currency.
	pub value: U256,
	/// Chain ID for replay protection.
	pub chain_id: u64,
	/// Gas limit for transaction execution, filled in after estimation.
	pub gas_limit: Option<u64>,
}

impl Transaction {
	/// Creates a new zero-value call to a contract.
	pub fn new(to: Address, data: Vec<u8>, chain_id: u64) -> Self {
		Self {
			to,
			data,
			value: U256::ZERO,
			chain_id,
			gas_limit: None,
		}
	}

	/// Returns a copy of this transaction with the given gas limit set.
	pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
		self.gas_limit = Some(gas_limit);
		self
	}
}

/// Conversion from our Transaction type to Alloy's TransactionRequest.
impl From<Transaction> for TransactionRequest {
	fn from(tx: Transaction) -> Self {
		let mut addr_bytes = [0u8; 20];
		addr_bytes.copy_from_slice(&tx.to.0[..20]);

		TransactionRequest {
			chain_id: Some(tx.chain_id),
			value: Some(tx.value),
			to: Some(alloy_primitives::TxKind::Call(AlloyAddress::from(addr_bytes))),
			gas: tx.gas_limit,
			input: alloy_rpc_types::TransactionInput {
				input: Some(Bytes::from(tx.data)),
				data: None,
			},
			..Default::default()
		}
	}
}
