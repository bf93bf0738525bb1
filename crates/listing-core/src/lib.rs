//! Core listing orchestration for the marketplace.
//!
//! This crate drives a listing action (ask price or auction) from raw user
//! input to a terminal on-chain outcome: input validation, currency
//! resolution, approval gating for auctions, cost estimation, transaction
//! submission, and reconciliation of the execution layer's event stream into
//! a single observable `TransactionState`.

use listing_types::CurrencyError;
use thiserror::Error;

/// Approval gating for auction listings.
pub mod approval;
/// ABI call builders for the media and auction house contracts.
pub mod calls;
/// The listing transaction orchestrator state machine.
pub mod orchestrator;
/// Input validation for prices, addresses, and durations.
pub mod validation;

pub use approval::{ApprovalError, ApprovalGate};
pub use orchestrator::{ChainContext, ListingOrchestrator};

/// Errors surfaced by the listing flow.
///
/// Validation-kind errors (`InvalidAmount`, `InvalidAddress`,
/// `InvalidDuration`, `UnknownCurrency`, `ApprovalRequired`) are returned
/// before any execution-layer contact and leave the input editable.
/// `EstimationFailed` and `Execution` end the run in a `Failed` state that a
/// new submission may retry from.
#[derive(Debug, Clone, Error)]
pub enum ListingError {
	/// The entered price is not a valid amount in the permitted range.
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
	/// The entered address is not a 0x-prefixed 20-byte hex string.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// The requested auction duration is not in the allowed set.
	#[error("Invalid duration: {0}s is not an allowed auction duration")]
	InvalidDuration(u64),
	/// The currency symbol does not resolve on the active chain.
	#[error(transparent)]
	UnknownCurrency(#[from] CurrencyError),
	/// An approval transaction for this asset is already in flight.
	#[error("An approval for this asset is already in flight")]
	ApprovalInFlight,
	/// The auction house is not approved to manage the asset; the approval
	/// action must complete before the auction can be submitted.
	#[error("The auction house is not approved for this asset")]
	ApprovalRequired,
	/// Cost estimation failed; the transaction would not succeed and was
	/// never offered for signature.
	#[error("Cost estimation failed: {0}")]
	EstimationFailed(String),
	/// The transaction failed on submission or on-chain.
	#[error("Transaction failed: {0}")]
	Execution(String),
	/// Another submission is in flight on this orchestrator.
	#[error("A listing transaction is already in flight")]
	OrchestratorBusy,
	/// The transaction already has a hash and is irrevocable on-chain.
	#[error("The transaction can no longer be cancelled")]
	CancelUnavailable,
}
