//! Approval gating for auction listings.
//!
//! Creating an auction requires the auction house to be approved for the
//! asset on the media contract. The gate answers "is the spender approved"
//! with a read-only query, drives the approval transaction when it is not,
//! and rejects concurrent approval attempts for the same asset.

use crate::calls;
use alloy_primitives::U256;
use listing_execution::{ExecutionError, ExecutionService};
use listing_types::{Address, ApprovalStatus, TransactionEvent};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

/// Errors that can occur while checking or requesting approvals.
#[derive(Debug, Error)]
pub enum ApprovalError {
	/// An approval transaction for this (asset, spender) pair is already
	/// outstanding.
	#[error("Approval already in flight for asset {0}")]
	ApprovalInFlight(U256),
	/// The execution layer failed.
	#[error("Execution error: {0}")]
	Execution(#[from] ExecutionError),
	/// The approval transaction failed or was rejected.
	#[error("Approval transaction failed: {0}")]
	TransactionFailed(String),
	/// The approval confirmed but the re-queried status still does not show
	/// the spender as approved (reverted or reorganized away).
	#[error("Approval not effective after confirmation")]
	NotEffective,
	/// The approval status query returned malformed data.
	#[error("Malformed approval response: {0}")]
	BadResponse(String),
}

impl From<ApprovalError> for crate::ListingError {
	fn from(error: ApprovalError) -> Self {
		match error {
			ApprovalError::ApprovalInFlight(_) => crate::ListingError::ApprovalInFlight,
			other => crate::ListingError::Execution(other.to_string()),
		}
	}
}

/// Gate guarding the auction path behind the prerequisite asset approval.
pub struct ApprovalGate {
	execution: Arc<ExecutionService>,
	chain_id: u64,
	media: Address,
	/// (asset, spender) pairs with an outstanding approval transaction.
	in_flight: Mutex<HashSet<(U256, Address)>>,
}

impl ApprovalGate {
	pub fn new(execution: Arc<ExecutionService>, chain_id: u64, media: Address) -> Self {
		Self {
			execution,
			chain_id,
			media,
			in_flight: Mutex::new(HashSet::new()),
		}
	}

	/// Queries whether the spender is currently approved for the asset.
	///
	/// This is a read-only call against the media contract; the result is
	/// never cached because an approval can be revoked or reorganized away
	/// at any time.
	pub async fn check_approval(
		&self,
		asset_id: U256,
		spender: &Address,
	) -> Result<ApprovalStatus, ApprovalError> {
		let query = calls::get_approved(self.chain_id, &self.media, asset_id);
		let data = self.execution.call(query).await?;
		let approved = calls::decode_approved(&data).map_err(ApprovalError::BadResponse)?;

		if approved == *spender {
			Ok(ApprovalStatus::Approved)
		} else {
			Ok(ApprovalStatus::NotApproved)
		}
	}

	/// Submits an approval transaction and resolves once it is confirmed and
	/// the approval is observable on-chain.
	///
	/// The status is re-queried after confirmation instead of trusting the
	/// local flag, so an approval that was reverted or reorganized away does
	/// not unlock the auction path.
	#[instrument(skip_all, fields(asset_id = %asset_id, spender = %spender))]
	pub async fn request_approval(
		&self,
		asset_id: U256,
		owner: &Address,
		spender: &Address,
	) -> Result<ApprovalStatus, ApprovalError> {
		{
			let mut in_flight = self.in_flight.lock().await;
			if !in_flight.insert((asset_id, spender.clone())) {
				return Err(ApprovalError::ApprovalInFlight(asset_id));
			}
		}

		let result = self.drive_approval(asset_id, owner, spender).await;

		self.in_flight
			.lock()
			.await
			.remove(&(asset_id, spender.clone()));

		result
	}

	async fn drive_approval(
		&self,
		asset_id: U256,
		owner: &Address,
		spender: &Address,
	) -> Result<ApprovalStatus, ApprovalError> {
		let tx = calls::approve(self.chain_id, &self.media, spender, asset_id);
		let mut events = self.execution.submit(tx, owner.clone()).await?;

		while let Some(event) = events.recv().await {
			match event {
				TransactionEvent::HashReceived(hash) => {
					tracing::debug!(tx_hash = %hash, "Approval transaction pending");
				},
				TransactionEvent::Failed(reason) => {
					return Err(ApprovalError::TransactionFailed(reason));
				},
				TransactionEvent::Confirmed(receipt) => {
					if !receipt.success {
						return Err(ApprovalError::TransactionFailed(
							"Transaction reverted".to_string(),
						));
					}
					tracing::info!("Approval transaction confirmed");

					let status = self.check_approval(asset_id, spender).await?;
					if status != ApprovalStatus::Approved {
						return Err(ApprovalError::NotEffective);
					}
					return Ok(status);
				},
			}
		}

		Err(ApprovalError::TransactionFailed(
			"Event stream closed before confirmation".to_string(),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use listing_execution::{ExecutionInterface, MockExecutionInterface};
	use listing_types::{parse_address, TransactionHash, TransactionReceipt};
	use std::collections::HashMap;
	use tokio::sync::mpsc;

	const CHAIN_ID: u64 = 1;

	fn media() -> Address {
		parse_address("0x2222222222222222222222222222222222222222").unwrap()
	}

	fn owner() -> Address {
		parse_address("0x1111111111111111111111111111111111111111").unwrap()
	}

	fn spender() -> Address {
		parse_address("0x3333333333333333333333333333333333333333").unwrap()
	}

	fn approved_word(address: &Address) -> alloy_primitives::Bytes {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(&address.0);
		alloy_primitives::Bytes::from(word.to_vec())
	}

	fn gate_with(mock: MockExecutionInterface) -> ApprovalGate {
		let service = Arc::new(ExecutionService::new(HashMap::from([(
			CHAIN_ID,
			Arc::new(mock) as Arc<dyn ExecutionInterface>,
		)])));
		ApprovalGate::new(service, CHAIN_ID, media())
	}

	fn confirmed_receipt() -> TransactionReceipt {
		TransactionReceipt {
			hash: TransactionHash(vec![0xcd; 32]),
			block_number: 100,
			success: true,
		}
	}

	#[tokio::test]
	async fn test_check_approval_matches_spender() {
		let mut mock = MockExecutionInterface::new();
		mock.expect_call()
			.times(2)
			.returning(|_| Ok(approved_word(&spender())));

		let gate = gate_with(mock);

		assert_eq!(
			gate.check_approval(U256::from(7), &spender()).await.unwrap(),
			ApprovalStatus::Approved
		);
		assert_eq!(
			gate.check_approval(U256::from(7), &owner()).await.unwrap(),
			ApprovalStatus::NotApproved
		);
	}

	#[tokio::test]
	async fn test_request_approval_requeries_after_confirmation() {
		let mut mock = MockExecutionInterface::new();
		mock.expect_submit().times(1).return_once(|_, _| {
			let (events, rx) = mpsc::channel(4);
			events
				.try_send(TransactionEvent::HashReceived(TransactionHash(vec![0xab; 32])))
				.unwrap();
			events
				.try_send(TransactionEvent::Confirmed(confirmed_receipt()))
				.unwrap();
			Ok(rx)
		});
		// The post-confirmation status query.
		mock.expect_call()
			.times(1)
			.returning(|_| Ok(approved_word(&spender())));

		let gate = gate_with(mock);
		let status = gate
			.request_approval(U256::from(7), &owner(), &spender())
			.await
			.unwrap();
		assert_eq!(status, ApprovalStatus::Approved);
	}

	#[tokio::test]
	async fn test_request_approval_detects_ineffective_approval() {
		let mut mock = MockExecutionInterface::new();
		mock.expect_submit().times(1).return_once(|_, _| {
			let (events, rx) = mpsc::channel(4);
			events
				.try_send(TransactionEvent::Confirmed(confirmed_receipt()))
				.unwrap();
			Ok(rx)
		});
		// Confirmed, but the chain still reports nobody approved.
		mock.expect_call()
			.times(1)
			.returning(|_| Ok(approved_word(&Address::zero())));

		let gate = gate_with(mock);
		let err = gate
			.request_approval(U256::from(7), &owner(), &spender())
			.await
			.unwrap_err();
		assert!(matches!(err, ApprovalError::NotEffective));
	}

	#[tokio::test]
	async fn test_request_approval_surfaces_transaction_failure() {
		let mut mock = MockExecutionInterface::new();
		mock.expect_submit().times(1).return_once(|_, _| {
			let (events, rx) = mpsc::channel(4);
			events
				.try_send(TransactionEvent::Failed("user rejected signature".to_string()))
				.unwrap();
			Ok(rx)
		});

		let gate = gate_with(mock);
		let err = gate
			.request_approval(U256::from(7), &owner(), &spender())
			.await
			.unwrap_err();
		assert!(matches!(err, ApprovalError::TransactionFailed(_)));
	}

	#[tokio::test]
	async fn test_concurrent_request_is_rejected() {
		let (release, gate_release) = mpsc::channel::<()>(1);

		let mut mock = MockExecutionInterface::new();
		mock.expect_submit().times(1).return_once(move |_, _| {
			let (events, rx) = mpsc::channel(4);
			// Keep the first request outstanding until the test releases it.
			tokio::spawn(async move {
				let mut gate_release = gate_release;
				gate_release.recv().await;
				events
					.send(TransactionEvent::Failed("released".to_string()))
					.await
					.ok();
			});
			Ok(rx)
		});

		let gate = Arc::new(gate_with(mock));

		let first = {
			let gate = gate.clone();
			tokio::spawn(async move {
				gate.request_approval(U256::from(7), &owner(), &spender())
					.await
			})
		};

		// Wait until the first request holds the in-flight slot.
		tokio::task::yield_now().await;
		while gate.in_flight.lock().await.is_empty() {
			tokio::task::yield_now().await;
		}

		let second = gate
			.request_approval(U256::from(7), &owner(), &spender())
			.await;
		assert!(matches!(second, Err(ApprovalError::ApprovalInFlight(_))));

		release.send(()).await.unwrap();
		let first = first.await.unwrap();
		assert!(matches!(first, Err(ApprovalError::TransactionFailed(_))));

		// The slot is released on failure, so a retry is not blocked.
		assert!(gate.in_flight.lock().await.is_empty());
	}
}
