//! Currency table mapping (chain id, symbol) pairs to token addresses.
//!
//! Listing prices are denominated in a currency chosen by symbol; the table
//! resolves that symbol to the concrete token contract for the active chain.
//! A wrong currency address prices the listing in the wrong asset with no
//! on-chain way to detect the mistake until bidding occurs, so lookup failure
//! is a hard `UnknownCurrency` error and never falls back to a default.

use crate::{parse_address, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Symbol of the chain family's wrapped native token (wETH on the Ethereum
/// family, wBNB on the BNB family).
pub const NATIVE_WRAPPED: &str = "native-wrapped";

/// Errors that can occur during currency resolution.
#[derive(Debug, Clone, Error)]
pub enum CurrencyError {
	/// The (chain, symbol) combination is not configured.
	#[error("Unknown currency '{symbol}' on chain {chain_id}")]
	UnknownCurrency { chain_id: u64, symbol: String },
}

/// A currency supported on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct CurrencyEntry {
	/// The on-chain address of the token contract.
	pub address: Address,
	/// The token symbol (e.g., "native-wrapped").
	pub symbol: String,
	/// The number of decimal places for the token.
	pub decimals: u8,
}

/// Read-only mapping from (chain id, symbol) to currency entries.
///
/// Built at process start from the built-in wrapped-native table plus any
/// configured platform-token entries; safe for concurrent reads afterwards.
#[derive(Debug, Clone, Default)]
pub struct CurrencyTable {
	entries: HashMap<u64, HashMap<String, CurrencyEntry>>,
}

/// Canonical wrapped-native token addresses per supported chain. The
/// Ethereum family (1, 4) and the BNB family (56, 97) each carry distinct
/// addresses; resolution must never cross families.
const WRAPPED_NATIVE: &[(u64, &str)] = &[
	(1, "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
	(4, "0xc778417E063141139Fce010982780140Aa0cD5Ab"),
	(56, "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
	(97, "0xae13d989daC2f0dEbFf460aC112a837C89BAa7cd"),
];

impl CurrencyTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a table pre-populated with the wrapped-native token of every
	/// supported chain. Platform tokens are added from configuration.
	pub fn builtin() -> Self {
		let mut table = Self::new();
		for (chain_id, address) in WRAPPED_NATIVE {
			let address = parse_address(address).expect("invalid built-in currency address");
			table.insert(
				*chain_id,
				CurrencyEntry {
					address,
					symbol: NATIVE_WRAPPED.to_string(),
					decimals: 18,
				},
			);
		}
		table
	}

	/// Adds a currency entry for a chain, replacing any previous entry with
	/// the same symbol.
	pub fn insert(&mut self, chain_id: u64, entry: CurrencyEntry) {
		self.entries
			.entry(chain_id)
			.or_default()
			.insert(entry.symbol.clone(), entry);
	}

	/// Resolves a currency symbol on a chain to its configured entry.
	///
	/// Unknown chain or unknown symbol both yield `UnknownCurrency`; callers
	/// must not substitute a placeholder address.
	pub fn resolve(&self, chain_id: u64, symbol: &str) -> Result<&CurrencyEntry, CurrencyError> {
		self.entries
			.get(&chain_id)
			.and_then(|by_symbol| by_symbol.get(symbol))
			.ok_or_else(|| CurrencyError::UnknownCurrency {
				chain_id,
				symbol: symbol.to_string(),
			})
	}

	/// Returns the symbols configured for a chain, for populating selection
	/// inputs. Unknown chains yield an empty list.
	pub fn symbols(&self, chain_id: u64) -> Vec<&str> {
		self.entries
			.get(&chain_id)
			.map(|by_symbol| by_symbol.keys().map(String::as_str).collect())
			.unwrap_or_default()
	}
}
