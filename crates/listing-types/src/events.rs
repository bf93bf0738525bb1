//! Per-transaction event stream types.
//!
//! The execution layer reports the lifecycle of each submitted transaction as
//! an ordered stream of events. The orchestrator consumes one stream per
//! submission and folds it into a single transaction state. Network reordering
//! means a `Failed` event may arrive after `HashReceived`; consumers must
//! treat `Failed` and `Confirmed` as terminal regardless of prior events.

use crate::{TransactionHash, TransactionReceipt};
use serde::{Deserialize, Serialize};

/// Events emitted while a submitted transaction is tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransactionEvent {
	/// The network assigned a hash to the transaction. Not terminal: the
	/// transaction is now pending and its outcome is still unknown.
	HashReceived(TransactionHash),
	/// The transaction was durably included and executed.
	Confirmed(TransactionReceipt),
	/// The transaction failed, was rejected, or timed out.
	Failed(String),
}

impl TransactionEvent {
	/// Returns true if this event ends the transaction's lifecycle.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			TransactionEvent::Confirmed(_) | TransactionEvent::Failed(_)
		)
	}
}
