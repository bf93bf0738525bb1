//! Common types module for the marketplace listing system.
//!
//! This module defines the core data types and structures shared by the
//! listing orchestrator, the execution layer, and the configuration crate.
//! It provides a centralized location for shared types to ensure consistency
//! across all components.

/// Address and transaction types for blockchain interactions.
pub mod account;
/// Currency table mapping (chain id, symbol) pairs to token addresses.
pub mod currency;
/// Transaction hash and receipt types for submitted transactions.
pub mod delivery;
/// Per-transaction event stream types emitted by the execution layer.
pub mod events;
/// Listing intents and their chain-ready resolved form.
pub mod intent;
/// Orchestrator transaction states and the legal transition table.
pub mod state;
/// Utility functions for amounts, hex formatting, and conversions.
pub mod utils;

// Re-export all types for convenient access
pub use account::{Address, Transaction};
pub use currency::{CurrencyEntry, CurrencyError, CurrencyTable, NATIVE_WRAPPED};
pub use delivery::{TransactionHash, TransactionReceipt};
pub use events::TransactionEvent;
pub use intent::{ListingIntent, ListingKind, ResolvedIntent, SHARE_OF_RESALE};
pub use state::{ApprovalStatus, TransactionState};
pub use utils::{
	amount::{from_base_units, normalize_amount, to_base_units, AmountError},
	conversion::{parse_address, to_alloy_address},
	formatting::{truncate_id, with_0x_prefix, without_0x_prefix},
};
