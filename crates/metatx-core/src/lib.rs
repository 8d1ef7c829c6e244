//! Core gate for signature-authorized meta-transactions.
//!
//! An owner signs a [`TransactionDescription`] off-chain; a relayer submits
//! it together with the [`SignatureEnvelope`]. The gate recomputes the
//! domain-separated hash, recovers the signer, checks it against the owner
//! embedded in the payload, fences the operation through the allow list and
//! finally dispatches it against its own state under a step ceiling.
//!
//! Every call is all-or-nothing: a rejected request leaves balances,
//! approvals and used nonces exactly as they were and publishes no events.
//!
//! [`TransactionDescription`]: metatx_types::TransactionDescription
//! [`SignatureEnvelope`]: metatx_types::SignatureEnvelope

use metatx_ledger::LedgerError;
use metatx_types::{Address, PayloadError, Selector, U256};
use thiserror::Error;

pub mod allow_list;
pub mod authorization;
pub mod builder;
pub mod dispatch;
pub mod engine;
pub mod nonce;
pub mod processor;
pub mod signature;

pub use allow_list::AllowList;
pub use authorization::{AuthorizationGate, Caller};
pub use builder::{BuilderError, GateBuilder};
pub use dispatch::{meter::StepMeter, DispatchExecutor, DispatchFailure, Dispatched};
pub use engine::{event_bus::EventBus, GateSettings, GateState, MetaGate};
pub use nonce::NonceRegistry;
pub use processor::{ExecutionReceipt, MetaTransactionProcessor};
pub use signature::{recover_signer, SignatureVerifier};

/// Errors reported by the gate.
///
/// Every error is terminal for the call that produced it. No state changes
/// are retained when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
	/// The target of a transfer is the zero address.
	#[error("Invalid recipient: the zero address cannot receive value")]
	InvalidRecipient,
	/// The caller may not act for the claimed owner.
	#[error("Invalid sender: caller is not authorized for this owner")]
	InvalidSender,
	/// The signature does not recover to the claimed owner.
	#[error("Invalid signature")]
	InvalidSignature,
	/// The operation payload is malformed.
	#[error("Invalid payload: {0}")]
	InvalidPayload(#[from] PayloadError),
	/// The operation selector is not reachable through dispatch.
	#[error("Operation {selector} is not allowed")]
	OperationNotAllowed { selector: Selector },
	/// The dispatched operation reported failure.
	#[error("Execution failed: {0}")]
	ExecutionFailed(DispatchFailure),
	/// The owner already spent this nonce.
	#[error("Nonce {nonce} already used by {owner}")]
	NonceAlreadyUsed { owner: Address, nonce: U256 },
	/// The ledger refused a direct transfer.
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
}

impl GateError {
	/// Returns the innermost error, unwrapping operations rejected during dispatch.
	///
	/// A meta-transaction whose transfer targets the zero address fails with
	/// `ExecutionFailed`, and its root cause is `InvalidRecipient`.
	pub fn root_cause(&self) -> &GateError {
		match self {
			GateError::ExecutionFailed(DispatchFailure::Rejected(inner)) => inner.root_cause(),
			other => other,
		}
	}
}
