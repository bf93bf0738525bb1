//! Execution layer for the marketplace listing system.
//!
//! This module handles the submission and monitoring of blockchain
//! transactions. It provides the seam between the listing orchestrator and
//! concrete blockchain clients: cost estimation, transaction submission with
//! a per-transaction event stream, and read-only contract calls.

use alloy_primitives::Bytes;
use async_trait::async_trait;
use listing_types::{Address, Transaction, TransactionEvent};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur during execution layer operations.
#[derive(Debug, Error)]
pub enum ExecutionError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when cost estimation fails, typically because the
	/// call would revert.
	#[error("Cost estimation failed: {0}")]
	Estimation(String),
	/// Error that occurs when a transaction cannot be submitted or executed,
	/// including provider disconnects and rejected signatures.
	#[error("Transaction failed: {0}")]
	Execution(String),
	/// Error that occurs when no implementation is configured for a chain.
	#[error("No implementation available for chain {0}")]
	NoImplementationAvailable(u64),
}

/// Trait defining the interface for execution layer implementations.
///
/// This trait must be implemented by any blockchain client that wants to
/// carry listing transactions. Submission returns an event stream rather than
/// a final result: the hash is surfaced the instant it exists, and the
/// terminal outcome follows as its own event.
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ExecutionInterface: Send + Sync {
	/// Estimates gas units for a transaction without submitting it.
	///
	/// Implementations should call the chain's estimateGas RPC with the
	/// provided transaction; a simulated revert surfaces as `Estimation`.
	async fn estimate_gas(&self, tx: Transaction) -> Result<u64, ExecutionError>;

	/// Submits a transaction from the given account and returns its event
	/// stream.
	///
	/// The stream yields `HashReceived` as soon as the network assigns a
	/// hash, followed by exactly one terminal `Confirmed` or `Failed` event.
	async fn submit(
		&self,
		tx: Transaction,
		from: Address,
	) -> Result<mpsc::Receiver<TransactionEvent>, ExecutionError>;

	/// Executes a read-only contract call without sending a transaction.
	async fn call(&self, tx: Transaction) -> Result<Bytes, ExecutionError>;
}

/// Service that routes execution operations to per-chain implementations.
///
/// The ExecutionService selects the implementation matching each
/// transaction's chain id and fails with `NoImplementationAvailable` for
/// unconfigured chains.
pub struct ExecutionService {
	/// Map of chain IDs to their corresponding execution implementations.
	implementations: HashMap<u64, Arc<dyn ExecutionInterface>>,
}

impl ExecutionService {
	/// Creates a new ExecutionService with the specified implementations.
	pub fn new(implementations: HashMap<u64, Arc<dyn ExecutionInterface>>) -> Self {
		Self { implementations }
	}

	fn implementation(&self, chain_id: u64) -> Result<&Arc<dyn ExecutionInterface>, ExecutionError> {
		self.implementations
			.get(&chain_id)
			.ok_or(ExecutionError::NoImplementationAvailable(chain_id))
	}

	/// Estimates gas for a transaction on its chain.
	pub async fn estimate_gas(&self, tx: Transaction) -> Result<u64, ExecutionError> {
		self.implementation(tx.chain_id)?.estimate_gas(tx).await
	}

	/// Submits a transaction on its chain and returns the event stream.
	pub async fn submit(
		&self,
		tx: Transaction,
		from: Address,
	) -> Result<mpsc::Receiver<TransactionEvent>, ExecutionError> {
		self.implementation(tx.chain_id)?.submit(tx, from).await
	}

	/// Executes a read-only contract call on the transaction's chain.
	pub async fn call(&self, tx: Transaction) -> Result<Bytes, ExecutionError> {
		self.implementation(tx.chain_id)?.call(tx).await
	}
}
