//! Alloy-backed EVM execution implementation.
//!
//! Submits and monitors listing transactions on EVM-compatible chains using
//! the Alloy provider stack. Signing is delegated to the connected node: the
//! `from` account is expected to be managed by the user's wallet/provider,
//! which is outside this system's scope.

use crate::{ExecutionError, ExecutionInterface};
use alloy_primitives::Bytes;
use alloy_provider::{
	DynProvider, PendingTransactionConfig, Provider, ProviderBuilder,
};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::TransactionRequest;
use alloy_transport::layers::RetryBackoffLayer;
use async_trait::async_trait;
use listing_types::{
	to_alloy_address, Address, Transaction, TransactionEvent, TransactionHash, TransactionReceipt,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// Alloy-based EVM execution implementation.
///
/// Maintains one provider per configured chain. Submission emits
/// `HashReceived` as soon as the provider returns a pending transaction and
/// then watches the transaction until it is included or the watch times out.
pub struct AlloyExecution {
	/// Alloy providers for each supported network.
	providers: HashMap<u64, DynProvider>,
	/// Confirmations required before a transaction counts as confirmed.
	confirmations: u64,
	/// Upper bound on how long a pending transaction is watched.
	watch_timeout: Duration,
}

impl AlloyExecution {
	/// Creates a new AlloyExecution instance from per-chain RPC endpoints.
	pub fn new(
		endpoints: &HashMap<u64, String>,
		confirmations: u64,
		watch_timeout_seconds: u64,
	) -> Result<Self, ExecutionError> {
		if endpoints.is_empty() {
			return Err(ExecutionError::Network(
				"At least one chain endpoint must be configured".to_string(),
			));
		}

		let mut providers = HashMap::new();

		for (chain_id, rpc_url) in endpoints {
			let url = rpc_url.parse().map_err(|e| {
				ExecutionError::Network(format!("Invalid RPC URL for chain {}: {}", chain_id, e))
			})?;

			// Retry layer for network errors and rate limits
			let retry_layer = RetryBackoffLayer::new(5, 1000, 10);
			let client = RpcClient::builder().layer(retry_layer).http(url);

			let provider = ProviderBuilder::new().connect_client(client);
			providers.insert(*chain_id, provider.erased());
		}

		Ok(Self {
			providers,
			confirmations,
			watch_timeout: Duration::from_secs(watch_timeout_seconds),
		})
	}

	/// Gets the provider for a specific chain ID.
	fn get_provider(&self, chain_id: u64) -> Result<&DynProvider, ExecutionError> {
		self.providers.get(&chain_id).ok_or_else(|| {
			ExecutionError::Network(format!("No provider configured for chain ID {}", chain_id))
		})
	}

	/// Watches a pending transaction until inclusion and reports the outcome
	/// on the event channel.
	async fn watch_transaction(
		provider: DynProvider,
		hash: alloy_primitives::FixedBytes<32>,
		confirmations: u64,
		timeout: Duration,
		events: mpsc::Sender<TransactionEvent>,
	) {
		let config = PendingTransactionConfig::new(hash)
			.with_required_confirmations(confirmations)
			.with_timeout(Some(timeout));

		let watch_result = match provider.watch_pending_transaction(config).await {
			Ok(pending) => pending.await,
			Err(e) => {
				events
					.send(TransactionEvent::Failed(format!(
						"Transaction watch failed: {}",
						e
					)))
					.await
					.ok();
				return;
			},
		};

		if let Err(e) = watch_result {
			events
				.send(TransactionEvent::Failed(format!(
					"Failed to confirm transaction: {}",
					e
				)))
				.await
				.ok();
			return;
		}

		match provider.get_transaction_receipt(hash).await {
			Ok(Some(receipt)) => {
				let receipt = TransactionReceipt {
					hash: TransactionHash(receipt.transaction_hash.0.to_vec()),
					block_number: receipt.block_number.unwrap_or(0),
					success: receipt.status(),
				};
				tracing::info!(tx_hash = %receipt.hash, "Transaction confirmed");
				events.send(TransactionEvent::Confirmed(receipt)).await.ok();
			},
			Ok(None) => {
				events
					.send(TransactionEvent::Failed(
						"Transaction not found after confirmation".to_string(),
					))
					.await
					.ok();
			},
			Err(e) => {
				events
					.send(TransactionEvent::Failed(format!(
						"Failed to get receipt: {}",
						e
					)))
					.await
					.ok();
			},
		}
	}
}

#[async_trait]
impl ExecutionInterface for AlloyExecution {
	async fn estimate_gas(&self, tx: Transaction) -> Result<u64, ExecutionError> {
		let provider = self.get_provider(tx.chain_id)?;
		let request: TransactionRequest = tx.into();

		provider
			.estimate_gas(request)
			.await
			.map_err(|e| ExecutionError::Estimation(format!("Failed to estimate gas: {}", e)))
	}

	async fn submit(
		&self,
		tx: Transaction,
		from: Address,
	) -> Result<mpsc::Receiver<TransactionEvent>, ExecutionError> {
		let chain_id = tx.chain_id;
		let provider = self.get_provider(chain_id)?.clone();

		let mut request: TransactionRequest = tx.into();
		request.from = Some(to_alloy_address(&from));

		tracing::debug!(
			chain_id,
			to = ?request.to,
			data_len = request.input.input().map(|d| d.len()).unwrap_or(0),
			"Sending transaction"
		);

		// The connected node holds the signing account; a rejected signature
		// or disconnected provider surfaces here.
		let pending = provider.send_transaction(request).await.map_err(|e| {
			tracing::error!(chain_id, "Transaction submission failed: {}", e);
			ExecutionError::Execution(format!("Failed to send transaction: {}", e))
		})?;

		let tx_hash = *pending.tx_hash();
		let (events, rx) = mpsc::channel(8);

		events
			.send(TransactionEvent::HashReceived(TransactionHash(
				tx_hash.0.to_vec(),
			)))
			.await
			.ok();

		let confirmations = self.confirmations;
		let timeout = self.watch_timeout;
		tokio::spawn(async move {
			Self::watch_transaction(provider, tx_hash, confirmations, timeout, events).await;
		});

		Ok(rx)
	}

	async fn call(&self, tx: Transaction) -> Result<Bytes, ExecutionError> {
		let provider = self.get_provider(tx.chain_id)?;
		let request: TransactionRequest = tx.into();

		provider
			.call(request)
			.await
			.map_err(|e| ExecutionError::Network(format!("Failed to execute eth_call: {}", e)))
	}
}
