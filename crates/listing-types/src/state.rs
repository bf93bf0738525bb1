//! Orchestrator transaction states and approval status.
//!
//! The transaction lifecycle moves through:
//! Idle -> Validating -> Estimating -> AwaitingSignature -> Pending ->
//! {Confirmed | Failed}, with Cancelled reachable from every state before
//! Pending. Terminal states are absorbing; a fresh submission restarts the
//! machine at Validating.

use crate::TransactionHash;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Approval status of a (asset, spender) pair.
///
/// Recomputed on demand and after a successful approval transaction; never
/// persisted beyond the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
	/// No approval query has completed yet.
	Unknown,
	/// The spender is not approved for the asset.
	NotApproved,
	/// The spender is approved for the asset.
	Approved,
}

/// Current state of a listing transaction.
///
/// Exactly one submission may be in flight per orchestrator instance; a new
/// submission is only accepted from `Idle` or a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
	/// No submission in progress.
	Idle,
	/// Validating inputs and resolving the intent. No execution-layer contact
	/// has happened yet.
	Validating,
	/// Estimating the transaction cost via the execution layer.
	Estimating,
	/// Waiting for the transaction to be signed and accepted by the network.
	AwaitingSignature,
	/// The transaction has a hash and awaits its on-chain outcome. The hash
	/// is surfaced the instant it arrives, independent of the final outcome.
	Pending(TransactionHash),
	/// The transaction was durably included and succeeded.
	Confirmed,
	/// The submission failed; the reason is user-facing. A new submission may
	/// retry from this state.
	Failed(String),
	/// The submission was cancelled locally before a hash existed.
	Cancelled,
}

impl TransactionState {
	/// Returns true for states that end a submission.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			TransactionState::Confirmed
				| TransactionState::Failed(_)
				| TransactionState::Cancelled
		)
	}

	/// Returns true if a new submission may be accepted from this state.
	pub fn accepts_submit(&self) -> bool {
		matches!(self, TransactionState::Idle) || self.is_terminal()
	}

	/// Checks if a state transition is valid.
	pub fn is_valid_transition(from: &TransactionState, to: &TransactionState) -> bool {
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		enum StateKind {
			Idle,
			Validating,
			Estimating,
			AwaitingSignature,
			Pending,
			Confirmed,
			Failed,
			Cancelled,
		}

		// Static transition table - each state maps to allowed next states.
		// Terminal states allow only Validating (a retry submission).
		static TRANSITIONS: Lazy<HashMap<StateKind, HashSet<StateKind>>> = Lazy::new(|| {
			let mut m = HashMap::new();
			m.insert(StateKind::Idle, HashSet::from([StateKind::Validating]));
			m.insert(
				StateKind::Validating,
				HashSet::from([StateKind::Estimating, StateKind::Failed, StateKind::Cancelled]),
			);
			m.insert(
				StateKind::Estimating,
				HashSet::from([
					StateKind::AwaitingSignature,
					StateKind::Failed,
					StateKind::Cancelled,
				]),
			);
			m.insert(
				StateKind::AwaitingSignature,
				HashSet::from([StateKind::Pending, StateKind::Failed, StateKind::Cancelled]),
			);
			m.insert(
				StateKind::Pending,
				HashSet::from([StateKind::Confirmed, StateKind::Failed]),
			);
			m.insert(StateKind::Confirmed, HashSet::from([StateKind::Validating]));
			m.insert(StateKind::Failed, HashSet::from([StateKind::Validating]));
			m.insert(StateKind::Cancelled, HashSet::from([StateKind::Validating]));
			m
		});

		let state_kind = |state: &TransactionState| -> StateKind {
			match state {
				TransactionState::Idle => StateKind::Idle,
				TransactionState::Validating => StateKind::Validating,
				TransactionState::Estimating => StateKind::Estimating,
				TransactionState::AwaitingSignature => StateKind::AwaitingSignature,
				TransactionState::Pending(_) => StateKind::Pending,
				TransactionState::Confirmed => StateKind::Confirmed,
				TransactionState::Failed(_) => StateKind::Failed,
				TransactionState::Cancelled => StateKind::Cancelled,
			}
		};

		TRANSITIONS
			.get(&state_kind(from))
			.is_some_and(|set| set.contains(&state_kind(to)))
	}
}
