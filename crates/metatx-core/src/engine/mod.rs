//! The gate engine.
//!
//! [`MetaGate`] owns the state every operation mutates and the components
//! that guard it. Calls are processed one at a time through `&mut self`; a
//! host that serves concurrent relayers serializes them before they reach
//! the gate.

pub mod event_bus;

use crate::dispatch::handlers;
use crate::{
	AllowList, AuthorizationGate, Caller, DispatchExecutor, ExecutionReceipt, GateError,
	MetaTransactionProcessor, NonceRegistry, SignatureVerifier, StepMeter,
};
use event_bus::EventBus;
use metatx_config::{GateConfig, DEFAULT_DISPATCH_STEP_LIMIT, DEFAULT_EVENT_CAPACITY};
use metatx_ledger::LedgerService;
use metatx_types::{
	Address, GateEvent, Hash256, OperationKind, Selector, SignatureEnvelope, TransactionCodec,
	TransactionDescription, U256,
};
use tokio::sync::broadcast;
use tracing::instrument;

/// Mutable state guarded by the gate.
pub struct GateState {
	pub(crate) ledger: LedgerService,
	pub(crate) authorization: AuthorizationGate,
	pub(crate) nonces: NonceRegistry,
}

impl GateState {
	pub fn new(ledger: LedgerService) -> Self {
		Self {
			ledger,
			authorization: AuthorizationGate::new(),
			nonces: NonceRegistry::new(),
		}
	}
}

/// Policy a gate is built with.
#[derive(Debug, Clone)]
pub struct GateSettings {
	pub address: Address,
	pub dispatch_step_limit: u64,
	pub replay_protection: bool,
	pub allowed_operations: Vec<OperationKind>,
	pub event_capacity: usize,
}

impl GateSettings {
	/// Default policy for a gate deployed at `address`.
	pub fn new(address: Address) -> Self {
		Self {
			address,
			dispatch_step_limit: DEFAULT_DISPATCH_STEP_LIMIT,
			replay_protection: true,
			allowed_operations: OperationKind::ALL.to_vec(),
			event_capacity: DEFAULT_EVENT_CAPACITY,
		}
	}

	pub fn with_step_limit(mut self, limit: u64) -> Self {
		self.dispatch_step_limit = limit;
		self
	}

	pub fn with_replay_protection(mut self, enabled: bool) -> Self {
		self.replay_protection = enabled;
		self
	}

	pub fn with_event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity;
		self
	}

	pub fn with_allowed_operations(mut self, operations: impl Into<Vec<OperationKind>>) -> Self {
		self.allowed_operations = operations.into();
		self
	}
}

impl From<&GateConfig> for GateSettings {
	fn from(config: &GateConfig) -> Self {
		Self {
			address: config.address,
			dispatch_step_limit: config.dispatch_step_limit,
			replay_protection: config.replay_protection,
			allowed_operations: config.allowed_operations.clone(),
			event_capacity: config.event_capacity,
		}
	}
}

/// Signature-authorized execution gate.
pub struct MetaGate {
	codec: TransactionCodec,
	verifier: SignatureVerifier,
	executor: DispatchExecutor,
	replay_protection: bool,
	state: GateState,
	event_bus: EventBus,
}

impl MetaGate {
	/// Creates a gate over `ledger` with the given policy.
	pub fn new(settings: GateSettings, ledger: LedgerService) -> Self {
		let allow_list = AllowList::new(settings.allowed_operations.iter().copied());
		Self {
			codec: TransactionCodec::new(settings.address),
			verifier: SignatureVerifier::new(),
			executor: DispatchExecutor::new(allow_list, settings.dispatch_step_limit),
			replay_protection: settings.replay_protection,
			state: GateState::new(ledger),
			event_bus: EventBus::new(settings.event_capacity),
		}
	}

	/// The gate's own address, which domain-separates its digests.
	pub fn address(&self) -> Address {
		self.codec.gate()
	}

	/// Codec owners must hash with to sign for this gate.
	pub fn codec(&self) -> &TransactionCodec {
		&self.codec
	}

	pub fn hash_transaction(&self, tx: &TransactionDescription) -> Hash256 {
		self.codec.hash(tx)
	}

	/// Recovers the signer of an arbitrary hash.
	pub fn recover_signer(
		&self,
		hash: &Hash256,
		sig: &SignatureEnvelope,
	) -> Result<Address, GateError> {
		self.verifier.recover(hash, sig)
	}

	/// Executes a signed meta-transaction submitted by a relayer.
	///
	/// On success the operation's events and a `MetaTransactionExecuted`
	/// event are published. On failure nothing is published and state is
	/// unchanged.
	#[instrument(skip_all, fields(gate = %self.address()))]
	pub fn execute(
		&mut self,
		tx: &TransactionDescription,
		sig: &SignatureEnvelope,
	) -> Result<ExecutionReceipt, GateError> {
		let processor = MetaTransactionProcessor::new(
			&self.codec,
			&self.verifier,
			&self.executor,
			self.replay_protection,
		);
		let receipt = processor.execute(&mut self.state, tx, sig)?;
		self.publish_all(&receipt.events);
		Ok(receipt)
	}

	/// Transfers `amount` from `owner` to `to`, called directly by `caller`.
	///
	/// `caller` must be the owner or an operator the owner approved.
	pub fn transfer_on_behalf(
		&mut self,
		caller: Address,
		owner: Address,
		to: Address,
		amount: U256,
	) -> Result<(), GateError> {
		let event = handlers::transfer_on_behalf(
			&mut self.state,
			&Caller::Account(caller),
			&mut StepMeter::unlimited(),
			owner,
			to,
			amount,
		)
		.map_err(|failure| failure.into_gate_error())?;
		self.publish_all(&[event]);
		Ok(())
	}

	/// Grants or revokes `operator` for `owner`, called directly by `caller`.
	///
	/// Only the owner may change its own approvals this way.
	pub fn set_approval(
		&mut self,
		caller: Address,
		owner: Address,
		operator: Address,
		approved: bool,
	) -> Result<(), GateError> {
		let event = handlers::set_operator_approval(
			&mut self.state,
			&Caller::Account(caller),
			&mut StepMeter::unlimited(),
			owner,
			operator,
			approved,
		)
		.map_err(|failure| failure.into_gate_error())?;
		self.publish_all(&[event]);
		Ok(())
	}

	pub fn is_approved(&self, owner: Address, operator: Address) -> bool {
		self.state.authorization.is_approved(owner, operator)
	}

	/// Returns whether `caller` may act for `owner`.
	pub fn authorize_actor(&self, caller: &Caller, owner: Address) -> bool {
		self.state.authorization.authorize_actor(caller, owner)
	}

	pub fn is_allowed(&self, selector: Selector) -> bool {
		self.executor.allow_list().is_allowed(selector)
	}

	/// Whether `owner` has already spent `nonce`. Always false with replay
	/// protection disabled.
	pub fn is_nonce_used(&self, owner: Address, nonce: U256) -> bool {
		self.state.nonces.is_used(owner, nonce)
	}

	pub fn balance_of(&self, account: &Address) -> U256 {
		self.state.ledger.balance_of(account)
	}

	/// Subscribes to events published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
		self.event_bus.subscribe()
	}

	fn publish_all(&self, events: &[GateEvent]) {
		for event in events {
			self.event_bus.publish(event.clone());
		}
	}
}
