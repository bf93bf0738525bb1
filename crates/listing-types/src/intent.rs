//! Listing intents and their chain-ready resolved form.
//!
//! A `ListingIntent` captures what the user asked for in user-facing terms
//! (decimal amount, currency symbol). Resolution turns it into a
//! `ResolvedIntent` carrying the base-unit amount and the concrete currency
//! address for the active chain. Kind-specific fields live inside
//! `ListingKind` so they are enforced at construction, not at use.

use crate::Address;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Share of future resales granted to the seller. The feature was retired;
/// the contract still takes the field, so it is pinned to zero.
pub const SHARE_OF_RESALE: u8 = 0;

/// The kind of listing being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingKind {
	/// A fixed sale price for direct purchase.
	Ask,
	/// A time-bounded auction with a reserve price.
	Auction {
		/// Auction duration. Must be one of the configured allowed durations.
		duration_seconds: u64,
	},
}

/// A user's request to list an asset, immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingIntent {
	/// Token id of the asset being listed.
	pub asset_id: U256,
	/// Address of the asset owner, which signs the listing transaction.
	pub owner: Address,
	/// The kind of listing, with kind-specific fields.
	pub kind: ListingKind,
	/// Raw decimal amount as entered by the user (ask price or auction
	/// reserve price).
	pub amount: String,
	/// Symbolic currency selection, resolved per active chain.
	pub currency_symbol: String,
}

impl ListingIntent {
	/// Creates an ask-price intent.
	pub fn ask(
		asset_id: U256,
		owner: Address,
		amount: impl Into<String>,
		currency_symbol: impl Into<String>,
	) -> Self {
		Self {
			asset_id,
			owner,
			kind: ListingKind::Ask,
			amount: amount.into(),
			currency_symbol: currency_symbol.into(),
		}
	}

	/// Creates an auction intent with a reserve price and duration.
	pub fn auction(
		asset_id: U256,
		owner: Address,
		amount: impl Into<String>,
		currency_symbol: impl Into<String>,
		duration_seconds: u64,
	) -> Self {
		Self {
			asset_id,
			owner,
			kind: ListingKind::Auction { duration_seconds },
			amount: amount.into(),
			currency_symbol: currency_symbol.into(),
		}
	}
}

/// A validated intent with chain-concrete values, derived from a
/// `ListingIntent` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIntent {
	/// Token id of the asset being listed.
	pub asset_id: U256,
	/// Address of the asset owner.
	pub owner: Address,
	/// The kind of listing, with kind-specific fields.
	pub kind: ListingKind,
	/// Amount in the currency's base units, derived by a
	/// precision-preserving decimal conversion.
	pub amount_base_units: U256,
	/// On-chain address of the listing currency.
	pub currency: Address,
	/// Decimal precision of the listing currency.
	pub currency_decimals: u8,
	/// Pinned to `SHARE_OF_RESALE`.
	pub share_of_resale: u8,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parse_address;

	fn owner() -> Address {
		parse_address("0x1111111111111111111111111111111111111111").unwrap()
	}

	#[test]
	fn test_ask_intent_construction() {
		let intent = ListingIntent::ask(U256::from(7), owner(), "1.5", "native-wrapped");
		assert_eq!(intent.kind, ListingKind::Ask);
		assert_eq!(intent.amount, "1.5");
		assert_eq!(intent.currency_symbol, "native-wrapped");
	}

	#[test]
	fn test_auction_intent_carries_duration() {
		let intent = ListingIntent::auction(U256::from(7), owner(), "2", "native-wrapped", 1800);
		match intent.kind {
			ListingKind::Auction { duration_seconds } => assert_eq!(duration_seconds, 1800),
			ListingKind::Ask => panic!("Expected auction kind"),
		}
	}

	#[test]
	fn test_intent_serialization_round_trip() {
		let intent = ListingIntent::auction(U256::from(42), owner(), "0.5", "native-wrapped", 3600);
		let json = serde_json::to_string(&intent).unwrap();
		let deserialized: ListingIntent = serde_json::from_str(&json).unwrap();
		assert_eq!(intent, deserialized);
	}
}
