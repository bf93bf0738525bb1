//! The listing transaction orchestrator.
//!
//! One orchestrator instance drives one listing action at a time through
//! Idle -> Validating -> Estimating -> AwaitingSignature -> Pending ->
//! {Confirmed | Failed}, publishing every state change to subscribers the
//! moment it happens. Cancellation is a local-state concept honored only
//! until the network assigns a hash; after that the transaction is
//! irrevocable on-chain and the orchestrator can only await its outcome.

use crate::{calls, validation, ApprovalGate, ListingError};
use listing_execution::ExecutionService;
use listing_types::{
	from_base_units, to_base_units, Address, ApprovalStatus, CurrencyTable, ListingIntent,
	ListingKind, ResolvedIntent, Transaction, TransactionEvent, TransactionHash,
	TransactionState, SHARE_OF_RESALE,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::instrument;

/// The marketplace contracts of the active chain.
#[derive(Debug, Clone)]
pub struct ChainContext {
	/// Chain id all transactions are built for.
	pub chain_id: u64,
	/// Media (NFT) contract holding the listed assets.
	pub media: Address,
	/// Auction house contract; the approval spender for auctions.
	pub auction_house: Address,
}

/// Callback invoked exactly once on confirmation with the validated,
/// normalized decimal amount.
pub type ConfirmedCallback = Box<dyn FnOnce(String) + Send>;
/// Callback invoked exactly once when the submission fails.
pub type FailedCallback = Box<dyn FnOnce(ListingError) + Send>;

/// Terminal callbacks with an idempotent fire-once guard.
///
/// Firing either callback consumes both; a second fire is a programming
/// error and is rejected rather than invoked again. When a run is cancelled
/// the callbacks are dropped without firing.
struct TerminalCallbacks {
	on_confirmed: Option<ConfirmedCallback>,
	on_failed: Option<FailedCallback>,
}

impl TerminalCallbacks {
	fn new(on_confirmed: ConfirmedCallback, on_failed: FailedCallback) -> Self {
		Self {
			on_confirmed: Some(on_confirmed),
			on_failed: Some(on_failed),
		}
	}

	fn fire_confirmed(&mut self, amount: String) {
		self.on_failed.take();
		match self.on_confirmed.take() {
			Some(callback) => callback(amount),
			None => tracing::error!("Terminal success callback fired more than once"),
		}
	}

	fn fire_failed(&mut self, error: ListingError) {
		self.on_confirmed.take();
		match self.on_failed.take() {
			Some(callback) => callback(error),
			None => tracing::error!("Terminal failure callback fired more than once"),
		}
	}
}

enum Outcome {
	Confirmed,
	Cancelled,
}

/// Orchestrates a single in-flight listing transaction.
pub struct ListingOrchestrator {
	execution: Arc<ExecutionService>,
	currencies: Arc<CurrencyTable>,
	context: ChainContext,
	allowed_durations: Vec<u64>,
	approvals: ApprovalGate,
	/// Current state, pushed to subscribers on every change.
	state: watch::Sender<TransactionState>,
	/// Cancellation signal observed at every suspension point before a hash
	/// exists.
	cancel: watch::Sender<bool>,
	/// Hash of the current run's transaction, kept after terminal states for
	/// diagnostics and explorer links.
	hash: watch::Sender<Option<TransactionHash>>,
	/// Held for the duration of a run; a second submit finds it taken.
	run: Mutex<()>,
}

impl ListingOrchestrator {
	pub fn new(
		execution: Arc<ExecutionService>,
		currencies: Arc<CurrencyTable>,
		context: ChainContext,
		allowed_durations: Vec<u64>,
	) -> Self {
		let approvals =
			ApprovalGate::new(execution.clone(), context.chain_id, context.media.clone());
		let (state, _) = watch::channel(TransactionState::Idle);
		let (cancel, _) = watch::channel(false);
		let (hash, _) = watch::channel(None);

		Self {
			execution,
			currencies,
			context,
			allowed_durations,
			approvals,
			state,
			cancel,
			hash,
			run: Mutex::new(()),
		}
	}

	/// Subscribes to state changes. The receiver always holds the current
	/// state; changes are pushed as they occur.
	pub fn subscribe(&self) -> watch::Receiver<TransactionState> {
		self.state.subscribe()
	}

	/// Returns the current transaction state.
	pub fn state(&self) -> TransactionState {
		self.state.borrow().clone()
	}

	/// Returns the current run's transaction hash as soon as it is known,
	/// including after the run has failed.
	pub fn transaction_hash(&self) -> Option<TransactionHash> {
		self.hash.borrow().clone()
	}

	/// The approval gate for the active chain's auction house, exposed so
	/// the caller can offer the approve action while an auction is gated.
	pub fn approvals(&self) -> &ApprovalGate {
		&self.approvals
	}

	/// Submits an ask-price listing. See [`Self::submit`].
	pub async fn submit_ask_price(
		&self,
		intent: ListingIntent,
		on_confirmed: impl FnOnce(String) + Send + 'static,
		on_failed: impl FnOnce(ListingError) + Send + 'static,
	) -> Result<(), ListingError> {
		self.submit(intent, on_confirmed, on_failed).await
	}

	/// Submits an auction listing. See [`Self::submit`].
	pub async fn submit_auction(
		&self,
		intent: ListingIntent,
		on_confirmed: impl FnOnce(String) + Send + 'static,
		on_failed: impl FnOnce(ListingError) + Send + 'static,
	) -> Result<(), ListingError> {
		self.submit(intent, on_confirmed, on_failed).await
	}

	/// Drives a listing intent to a terminal state.
	///
	/// At most one intent may be in flight; a concurrent call is rejected
	/// with `OrchestratorBusy` and leaves the running submission untouched.
	/// Exactly one of the terminal callbacks fires, unless the run is
	/// cancelled, in which case neither does.
	#[instrument(skip_all, fields(asset_id = %intent.asset_id, kind = ?intent.kind))]
	pub async fn submit(
		&self,
		intent: ListingIntent,
		on_confirmed: impl FnOnce(String) + Send + 'static,
		on_failed: impl FnOnce(ListingError) + Send + 'static,
	) -> Result<(), ListingError> {
		let _run = self
			.run
			.try_lock()
			.map_err(|_| ListingError::OrchestratorBusy)?;
		if !self.state.borrow().accepts_submit() {
			return Err(ListingError::OrchestratorBusy);
		}

		// Fresh run: clear the previous hash and any stale cancel request.
		self.cancel.send_replace(false);
		self.hash.send_replace(None);

		let mut callbacks =
			TerminalCallbacks::new(Box::new(on_confirmed), Box::new(on_failed));

		match self.drive(intent, &mut callbacks).await {
			Ok(Outcome::Confirmed) => Ok(()),
			Ok(Outcome::Cancelled) => Ok(()),
			Err(error) => {
				tracing::warn!(error = %error, "Listing submission failed");
				self.transition(TransactionState::Failed(error.to_string()));
				callbacks.fire_failed(error.clone());
				Err(error)
			},
		}
	}

	/// Requests cancellation of the in-flight submission.
	///
	/// Permitted only before the transaction has a hash; once one exists the
	/// transaction is irrevocable on-chain and the orchestrator can only
	/// await its outcome.
	pub fn cancel(&self) -> Result<(), ListingError> {
		let state = self.state.borrow().clone();
		match state {
			TransactionState::Validating
			| TransactionState::Estimating
			| TransactionState::AwaitingSignature => {
				self.cancel.send_replace(true);
				Ok(())
			},
			_ => Err(ListingError::CancelUnavailable),
		}
	}

	async fn drive(
		&self,
		intent: ListingIntent,
		callbacks: &mut TerminalCallbacks,
	) -> Result<Outcome, ListingError> {
		let mut cancel = self.cancel.subscribe();

		self.transition(TransactionState::Validating);
		let resolved = self.resolve_intent(&intent)?;

		// Auctions are gated behind the auction house approval; an
		// unapproved asset never reaches estimation.
		if matches!(resolved.kind, ListingKind::Auction { .. }) {
			let status = self
				.approvals
				.check_approval(resolved.asset_id, &self.context.auction_house)
				.await?;
			if status != ApprovalStatus::Approved {
				return Err(ListingError::ApprovalRequired);
			}
		}

		if *cancel.borrow() {
			self.transition(TransactionState::Cancelled);
			return Ok(Outcome::Cancelled);
		}

		self.transition(TransactionState::Estimating);
		let tx = self.build_transaction(&resolved);

		// A failed estimate means the transaction would revert; it is never
		// offered for signature.
		let gas_limit = tokio::select! {
			_ = cancel.wait_for(|cancelled| *cancelled) => {
				self.transition(TransactionState::Cancelled);
				return Ok(Outcome::Cancelled);
			},
			result = self.execution.estimate_gas(tx.clone()) => {
				result.map_err(|e| ListingError::EstimationFailed(e.to_string()))?
			},
		};

		self.transition(TransactionState::AwaitingSignature);
		let tx = tx.with_gas_limit(gas_limit);

		let mut events = tokio::select! {
			_ = cancel.wait_for(|cancelled| *cancelled) => {
				self.transition(TransactionState::Cancelled);
				return Ok(Outcome::Cancelled);
			},
			result = self.execution.submit(tx, resolved.owner.clone()) => {
				result.map_err(|e| ListingError::Execution(e.to_string()))?
			},
		};

		let normalized_amount =
			from_base_units(resolved.amount_base_units, resolved.currency_decimals);
		let mut hash_seen = false;

		// Reconcile the event stream into a terminal state. Events may be
		// reordered by the network; an error is final even after a hash, and
		// nothing resurrects a terminal state.
		loop {
			let event = tokio::select! {
				_ = cancel.wait_for(|cancelled| *cancelled), if !hash_seen => {
					self.transition(TransactionState::Cancelled);
					return Ok(Outcome::Cancelled);
				},
				event = events.recv() => match event {
					Some(event) => event,
					None => {
						return Err(ListingError::Execution(
							"Event stream closed before a terminal event".to_string(),
						));
					},
				},
			};

			match event {
				TransactionEvent::HashReceived(hash) => {
					hash_seen = true;
					self.hash.send_replace(Some(hash.clone()));
					tracing::info!(tx_hash = %hash, "Transaction pending");
					self.transition(TransactionState::Pending(hash));
				},
				TransactionEvent::Failed(reason) => {
					// Final regardless of a previously received hash; the
					// recorded hash stays available for diagnostics.
					return Err(ListingError::Execution(reason));
				},
				TransactionEvent::Confirmed(receipt) => {
					if !receipt.success {
						return Err(ListingError::Execution(
							"Transaction reverted".to_string(),
						));
					}
					if !hash_seen {
						// Confirmation outran the hash event; surface the
						// hash from the receipt before finishing.
						self.hash.send_replace(Some(receipt.hash.clone()));
						self.transition(TransactionState::Pending(receipt.hash.clone()));
					}
					self.transition(TransactionState::Confirmed);
					callbacks.fire_confirmed(normalized_amount.clone());
					return Ok(Outcome::Confirmed);
				},
			}
		}
	}

	/// Validates the intent and resolves it against the active chain.
	fn resolve_intent(&self, intent: &ListingIntent) -> Result<ResolvedIntent, ListingError> {
		let amount = validation::validate_price(&intent.amount)?;
		// An empty in-progress field submits as zero, clearing the ask.
		let amount = if amount.is_empty() { "0" } else { amount.as_str() };

		if let ListingKind::Auction { duration_seconds } = intent.kind {
			validation::validate_duration(duration_seconds, &self.allowed_durations)?;
		}

		let entry = self
			.currencies
			.resolve(self.context.chain_id, &intent.currency_symbol)?;

		let amount_base_units = to_base_units(amount, entry.decimals)
			.map_err(|e| ListingError::InvalidAmount(e.to_string()))?;

		Ok(ResolvedIntent {
			asset_id: intent.asset_id,
			owner: intent.owner.clone(),
			kind: intent.kind,
			amount_base_units,
			currency: entry.address.clone(),
			currency_decimals: entry.decimals,
			share_of_resale: SHARE_OF_RESALE,
		})
	}

	fn build_transaction(&self, resolved: &ResolvedIntent) -> Transaction {
		match resolved.kind {
			ListingKind::Ask => calls::set_ask(self.context.chain_id, &self.context.media, resolved),
			ListingKind::Auction { duration_seconds } => calls::create_auction(
				self.context.chain_id,
				&self.context.auction_house,
				&self.context.media,
				resolved,
				duration_seconds,
			),
		}
	}

	/// Applies a state transition, enforcing the legal transition table.
	fn transition(&self, to: TransactionState) {
		let current = self.state.borrow().clone();
		if !TransactionState::is_valid_transition(&current, &to) {
			tracing::warn!(from = ?current, to = ?to, "Ignoring illegal state transition");
			return;
		}
		tracing::debug!(from = ?current, to = ?to, "Transaction state change");
		self.state.send_replace(to);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::calls::{IAuctionHouse, IMedia};
	use alloy_primitives::U256;
	use alloy_sol_types::SolCall;
	use async_trait::async_trait;
	use listing_execution::{
		ExecutionError, ExecutionInterface, MockExecutionInterface,
	};
	use listing_types::{parse_address, TransactionReceipt, NATIVE_WRAPPED};
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex as StdMutex;
	use tokio::sync::{mpsc, Notify};

	const CHAIN_ID: u64 = 1;

	fn owner() -> Address {
		parse_address("0x1111111111111111111111111111111111111111").unwrap()
	}

	fn context() -> ChainContext {
		ChainContext {
			chain_id: CHAIN_ID,
			media: parse_address("0x2222222222222222222222222222222222222222").unwrap(),
			auction_house: parse_address("0x3333333333333333333333333333333333333333").unwrap(),
		}
	}

	fn orchestrator_with(mock: MockExecutionInterface) -> ListingOrchestrator {
		let service = Arc::new(listing_execution::ExecutionService::new(HashMap::from([(
			CHAIN_ID,
			Arc::new(mock) as Arc<dyn ExecutionInterface>,
		)])));
		ListingOrchestrator::new(
			service,
			Arc::new(CurrencyTable::builtin()),
			context(),
			vec![1800, 3600],
		)
	}

	fn orchestrator_with_impl(implementation: impl ExecutionInterface + 'static) -> ListingOrchestrator {
		let service = Arc::new(listing_execution::ExecutionService::new(HashMap::from([(
			CHAIN_ID,
			Arc::new(implementation) as Arc<dyn ExecutionInterface>,
		)])));
		ListingOrchestrator::new(
			service,
			Arc::new(CurrencyTable::builtin()),
			context(),
			vec![1800, 3600],
		)
	}

	fn ask_intent(amount: &str) -> ListingIntent {
		ListingIntent::ask(U256::from(7), owner(), amount, NATIVE_WRAPPED)
	}

	fn auction_intent(duration_seconds: u64) -> ListingIntent {
		ListingIntent::auction(U256::from(7), owner(), "1.5", NATIVE_WRAPPED, duration_seconds)
	}

	fn receipt(success: bool) -> TransactionReceipt {
		TransactionReceipt {
			hash: TransactionHash(vec![0xcd; 32]),
			block_number: 19_000_000,
			success,
		}
	}

	fn preloaded_stream(events: Vec<TransactionEvent>) -> mpsc::Receiver<TransactionEvent> {
		let (sender, rx) = mpsc::channel(8);
		for event in events {
			sender.try_send(event).unwrap();
		}
		rx
	}

	fn approved_word(address: &Address) -> alloy_primitives::Bytes {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(&address.0);
		alloy_primitives::Bytes::from(word.to_vec())
	}

	/// Records terminal callback invocations for assertions.
	#[derive(Clone, Default)]
	struct CallbackProbe {
		confirmed: Arc<StdMutex<Vec<String>>>,
		failed: Arc<StdMutex<Vec<String>>>,
	}

	impl CallbackProbe {
		fn on_confirmed(&self) -> impl FnOnce(String) + Send + 'static {
			let confirmed = self.confirmed.clone();
			move |amount| confirmed.lock().unwrap().push(amount)
		}

		fn on_failed(&self) -> impl FnOnce(ListingError) + Send + 'static {
			let failed = self.failed.clone();
			move |error| failed.lock().unwrap().push(error.to_string())
		}

		fn confirmed_amounts(&self) -> Vec<String> {
			self.confirmed.lock().unwrap().clone()
		}

		fn failure_count(&self) -> usize {
			self.failed.lock().unwrap().len()
		}
	}

	#[tokio::test]
	async fn test_ask_price_happy_path() {
		let mut mock = MockExecutionInterface::new();
		mock.expect_estimate_gas().times(1).returning(|tx| {
			assert_eq!(&tx.data[..4], IMedia::setAskCall::SELECTOR);
			assert_eq!(tx.chain_id, CHAIN_ID);
			Ok(120_000)
		});
		mock.expect_submit().times(1).return_once(|tx, from| {
			assert_eq!(tx.gas_limit, Some(120_000));
			assert_eq!(from, owner());
			Ok(preloaded_stream(vec![
				TransactionEvent::HashReceived(TransactionHash(vec![0xcd; 32])),
				TransactionEvent::Confirmed(receipt(true)),
			]))
		});

		let orchestrator = orchestrator_with(mock);
		let probe = CallbackProbe::default();

		orchestrator
			.submit_ask_price(ask_intent("1.5"), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap();

		assert_eq!(orchestrator.state(), TransactionState::Confirmed);
		assert_eq!(
			orchestrator.transaction_hash(),
			Some(TransactionHash(vec![0xcd; 32]))
		);
		// Exactly one success callback, carrying the normalized amount.
		assert_eq!(probe.confirmed_amounts(), vec!["1.5".to_string()]);
		assert_eq!(probe.failure_count(), 0);
	}

	#[tokio::test]
	async fn test_validation_failure_never_touches_execution() {
		// No expectations: any execution-layer call panics the mock.
		let orchestrator = orchestrator_with(MockExecutionInterface::new());
		let probe = CallbackProbe::default();

		let err = orchestrator
			.submit_ask_price(ask_intent("0.009"), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap_err();

		assert!(matches!(err, ListingError::InvalidAmount(_)));
		assert!(matches!(orchestrator.state(), TransactionState::Failed(_)));
		assert_eq!(probe.failure_count(), 1);
		assert!(probe.confirmed_amounts().is_empty());
	}

	#[tokio::test]
	async fn test_unknown_currency_is_a_validation_failure() {
		let orchestrator = orchestrator_with(MockExecutionInterface::new());
		let probe = CallbackProbe::default();

		let intent = ListingIntent::ask(U256::from(7), owner(), "1.5", "DOGE");
		let err = orchestrator
			.submit_ask_price(intent, probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap_err();

		assert!(matches!(err, ListingError::UnknownCurrency(_)));
	}

	#[tokio::test]
	async fn test_estimation_failure_is_terminal_and_retryable() {
		let attempts = Arc::new(AtomicUsize::new(0));
		let attempts_in_mock = attempts.clone();

		let mut mock = MockExecutionInterface::new();
		mock.expect_estimate_gas().times(2).returning(move |_| {
			if attempts_in_mock.fetch_add(1, Ordering::SeqCst) == 0 {
				Err(ExecutionError::Estimation("execution reverted".to_string()))
			} else {
				Ok(120_000)
			}
		});
		// The first run must never reach submission.
		mock.expect_submit().times(1).return_once(|_, _| {
			Ok(preloaded_stream(vec![
				TransactionEvent::HashReceived(TransactionHash(vec![0xcd; 32])),
				TransactionEvent::Confirmed(receipt(true)),
			]))
		});

		let orchestrator = orchestrator_with(mock);
		let probe = CallbackProbe::default();

		let err = orchestrator
			.submit_ask_price(ask_intent("1.5"), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap_err();
		assert!(matches!(err, ListingError::EstimationFailed(_)));
		assert!(matches!(orchestrator.state(), TransactionState::Failed(_)));
		assert_eq!(probe.failure_count(), 1);

		// A terminal state accepts a fresh submission.
		orchestrator
			.submit_ask_price(ask_intent("1.5"), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap();
		assert_eq!(orchestrator.state(), TransactionState::Confirmed);
	}

	#[tokio::test]
	async fn test_second_submit_is_rejected_while_first_in_flight() {
		let (events_sender, events_rx) = mpsc::channel(8);

		let mut mock = MockExecutionInterface::new();
		mock.expect_estimate_gas().times(1).returning(|_| Ok(120_000));
		mock.expect_submit().times(1).return_once(move |_, _| Ok(events_rx));

		let orchestrator = Arc::new(orchestrator_with(mock));
		let probe = CallbackProbe::default();

		let first = {
			let orchestrator = orchestrator.clone();
			let probe = probe.clone();
			tokio::spawn(async move {
				orchestrator
					.submit_ask_price(ask_intent("1.5"), probe.on_confirmed(), probe.on_failed())
					.await
			})
		};

		// Wait until the first submission is in flight.
		let mut states = orchestrator.subscribe();
		states
			.wait_for(|state| *state == TransactionState::AwaitingSignature)
			.await
			.unwrap();

		let second_probe = CallbackProbe::default();
		let err = orchestrator
			.submit_ask_price(
				ask_intent("2"),
				second_probe.on_confirmed(),
				second_probe.on_failed(),
			)
			.await
			.unwrap_err();
		assert!(matches!(err, ListingError::OrchestratorBusy));

		// The rejected call did not disturb the first run.
		assert_eq!(orchestrator.state(), TransactionState::AwaitingSignature);
		assert_eq!(second_probe.failure_count(), 0);

		events_sender
			.send(TransactionEvent::HashReceived(TransactionHash(vec![0xcd; 32])))
			.await
			.unwrap();
		events_sender
			.send(TransactionEvent::Confirmed(receipt(true)))
			.await
			.unwrap();

		first.await.unwrap().unwrap();
		assert_eq!(orchestrator.state(), TransactionState::Confirmed);
		assert_eq!(probe.confirmed_amounts().len(), 1);
	}

	#[tokio::test]
	async fn test_error_after_hash_is_final_and_hash_stays_retrievable() {
		let mut mock = MockExecutionInterface::new();
		mock.expect_estimate_gas().times(1).returning(|_| Ok(120_000));
		mock.expect_submit().times(1).return_once(|_, _| {
			Ok(preloaded_stream(vec![
				TransactionEvent::HashReceived(TransactionHash(vec![0xab; 32])),
				TransactionEvent::Failed("out of gas".to_string()),
				// A late confirmation must not resurrect the failed run.
				TransactionEvent::Confirmed(receipt(true)),
			]))
		});

		let orchestrator = orchestrator_with(mock);
		let probe = CallbackProbe::default();

		let err = orchestrator
			.submit_ask_price(ask_intent("1.5"), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap_err();

		assert!(matches!(err, ListingError::Execution(_)));
		assert!(matches!(orchestrator.state(), TransactionState::Failed(_)));
		// The hash remains available for diagnostics.
		assert_eq!(
			orchestrator.transaction_hash(),
			Some(TransactionHash(vec![0xab; 32]))
		);
		// The success callback never fired despite the queued confirmation.
		assert!(probe.confirmed_amounts().is_empty());
		assert_eq!(probe.failure_count(), 1);
	}

	#[tokio::test]
	async fn test_reverted_receipt_fails_the_run() {
		let mut mock = MockExecutionInterface::new();
		mock.expect_estimate_gas().times(1).returning(|_| Ok(120_000));
		mock.expect_submit().times(1).return_once(|_, _| {
			Ok(preloaded_stream(vec![
				TransactionEvent::HashReceived(TransactionHash(vec![0xab; 32])),
				TransactionEvent::Confirmed(receipt(false)),
			]))
		});

		let orchestrator = orchestrator_with(mock);
		let probe = CallbackProbe::default();

		let err = orchestrator
			.submit_ask_price(ask_intent("1.5"), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap_err();
		assert!(matches!(err, ListingError::Execution(_)));
		assert!(probe.confirmed_amounts().is_empty());
	}

	#[tokio::test]
	async fn test_unapproved_auction_never_reaches_estimation() {
		let mut mock = MockExecutionInterface::new();
		// getApproved reports nobody approved. No estimate/submit
		// expectations: reaching them panics the mock.
		mock.expect_call()
			.times(1)
			.returning(|_| Ok(approved_word(&Address::zero())));

		let orchestrator = orchestrator_with(mock);
		let probe = CallbackProbe::default();

		let err = orchestrator
			.submit_auction(auction_intent(1800), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap_err();

		assert!(matches!(err, ListingError::ApprovalRequired));
		assert!(matches!(orchestrator.state(), TransactionState::Failed(_)));
	}

	#[tokio::test]
	async fn test_auction_flow_after_approval() {
		let auction_house = context().auction_house;
		let approval_queries = Arc::new(AtomicUsize::new(0));
		let queries_in_mock = approval_queries.clone();

		let mut mock = MockExecutionInterface::new();
		// First query: not approved. After the approval transaction
		// confirms, every query reports the auction house.
		mock.expect_call().returning(move |tx| {
			assert_eq!(&tx.data[..4], IMedia::getApprovedCall::SELECTOR);
			if queries_in_mock.fetch_add(1, Ordering::SeqCst) == 0 {
				Ok(approved_word(&Address::zero()))
			} else {
				Ok(approved_word(&auction_house))
			}
		});
		mock.expect_submit().times(2).returning(|tx, _| {
			// First the approve transaction, then createAuction.
			assert!(
				&tx.data[..4] == IMedia::approveCall::SELECTOR
					|| &tx.data[..4] == IAuctionHouse::createAuctionCall::SELECTOR
			);
			Ok(preloaded_stream(vec![
				TransactionEvent::HashReceived(TransactionHash(vec![0xcd; 32])),
				TransactionEvent::Confirmed(receipt(true)),
			]))
		});
		mock.expect_estimate_gas().times(1).returning(|tx| {
			assert_eq!(&tx.data[..4], IAuctionHouse::createAuctionCall::SELECTOR);
			Ok(250_000)
		});

		let orchestrator = orchestrator_with(mock);
		let probe = CallbackProbe::default();

		// Gated: the asset is not approved yet.
		let err = orchestrator
			.submit_auction(auction_intent(1800), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap_err();
		assert!(matches!(err, ListingError::ApprovalRequired));

		// The exposed approve action unlocks the gate.
		let status = orchestrator
			.approvals()
			.request_approval(U256::from(7), &owner(), &orchestrator.context.auction_house)
			.await
			.unwrap();
		assert_eq!(status, ApprovalStatus::Approved);

		// A fresh submission now runs to confirmation.
		orchestrator
			.submit_auction(auction_intent(1800), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap();
		assert_eq!(orchestrator.state(), TransactionState::Confirmed);
		assert_eq!(probe.confirmed_amounts(), vec!["1.5".to_string()]);
	}

	#[tokio::test]
	async fn test_auction_duration_must_be_allowed() {
		let orchestrator = orchestrator_with(MockExecutionInterface::new());
		let probe = CallbackProbe::default();

		let err = orchestrator
			.submit_auction(auction_intent(1801), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap_err();
		assert!(matches!(err, ListingError::InvalidDuration(1801)));
	}

	/// Execution stub whose estimate suspends until released, for driving
	/// cancellation while a run is parked in Estimating.
	struct ParkedEstimate {
		release: Arc<Notify>,
	}

	#[async_trait]
	impl ExecutionInterface for ParkedEstimate {
		async fn estimate_gas(&self, _tx: Transaction) -> Result<u64, ExecutionError> {
			self.release.notified().await;
			Ok(120_000)
		}

		async fn submit(
			&self,
			_tx: Transaction,
			_from: Address,
		) -> Result<mpsc::Receiver<TransactionEvent>, ExecutionError> {
			panic!("cancelled run must not submit");
		}

		async fn call(
			&self,
			_tx: Transaction,
		) -> Result<alloy_primitives::Bytes, ExecutionError> {
			panic!("unexpected call");
		}
	}

	#[tokio::test]
	async fn test_cancel_during_estimation() {
		let release = Arc::new(Notify::new());
		let orchestrator = Arc::new(orchestrator_with_impl(ParkedEstimate {
			release: release.clone(),
		}));
		let probe = CallbackProbe::default();

		let submission = {
			let orchestrator = orchestrator.clone();
			let probe = probe.clone();
			tokio::spawn(async move {
				orchestrator
					.submit_ask_price(ask_intent("1.5"), probe.on_confirmed(), probe.on_failed())
					.await
			})
		};

		let mut states = orchestrator.subscribe();
		states
			.wait_for(|state| *state == TransactionState::Estimating)
			.await
			.unwrap();

		orchestrator.cancel().unwrap();
		submission.await.unwrap().unwrap();

		assert_eq!(orchestrator.state(), TransactionState::Cancelled);
		// Neither terminal callback fires on cancellation.
		assert!(probe.confirmed_amounts().is_empty());
		assert_eq!(probe.failure_count(), 0);
	}

	#[tokio::test]
	async fn test_cancel_refused_once_pending() {
		let (events_sender, events_rx) = mpsc::channel(8);

		let mut mock = MockExecutionInterface::new();
		mock.expect_estimate_gas().times(1).returning(|_| Ok(120_000));
		mock.expect_submit().times(1).return_once(move |_, _| Ok(events_rx));

		let orchestrator = Arc::new(orchestrator_with(mock));
		let probe = CallbackProbe::default();

		let submission = {
			let orchestrator = orchestrator.clone();
			let probe = probe.clone();
			tokio::spawn(async move {
				orchestrator
					.submit_ask_price(ask_intent("1.5"), probe.on_confirmed(), probe.on_failed())
					.await
			})
		};

		events_sender
			.send(TransactionEvent::HashReceived(TransactionHash(vec![0xab; 32])))
			.await
			.unwrap();

		let mut states = orchestrator.subscribe();
		states
			.wait_for(|state| matches!(state, TransactionState::Pending(_)))
			.await
			.unwrap();

		// A hash exists: the transaction is irrevocable on-chain.
		let err = orchestrator.cancel().unwrap_err();
		assert!(matches!(err, ListingError::CancelUnavailable));

		events_sender
			.send(TransactionEvent::Confirmed(receipt(true)))
			.await
			.unwrap();
		submission.await.unwrap().unwrap();
		assert_eq!(orchestrator.state(), TransactionState::Confirmed);
	}

	#[tokio::test]
	async fn test_empty_amount_submits_as_zero() {
		let mut mock = MockExecutionInterface::new();
		mock.expect_estimate_gas().times(1).returning(|tx| {
			let decoded = IMedia::setAskCall::abi_decode(&tx.data, true).unwrap();
			assert_eq!(decoded.ask.amount, U256::ZERO);
			Ok(120_000)
		});
		mock.expect_submit().times(1).return_once(|_, _| {
			Ok(preloaded_stream(vec![
				TransactionEvent::HashReceived(TransactionHash(vec![0xcd; 32])),
				TransactionEvent::Confirmed(receipt(true)),
			]))
		});

		let orchestrator = orchestrator_with(mock);
		let probe = CallbackProbe::default();

		orchestrator
			.submit_ask_price(ask_intent(""), probe.on_confirmed(), probe.on_failed())
			.await
			.unwrap();
		assert_eq!(probe.confirmed_amounts(), vec!["0".to_string()]);
	}
}
