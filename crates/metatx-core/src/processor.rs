//! Meta-transaction processing.
//!
//! Validation runs strictly in order: payload header, hash, signer recovery,
//! owner binding, nonce, allow list, dispatch. The first failure ends the
//! call. State is only touched by the dispatched operation itself, which
//! checks before it mutates, so a failure at any step leaves nothing behind.

use crate::{DispatchExecutor, GateError, GateState, SignatureVerifier};
use metatx_types::{
	Address, GateEvent, Hash256, OperationKind, PayloadHeader, SignatureEnvelope, TransactionCodec,
	TransactionDescription, U256,
};
use tracing::instrument;

/// Outcome of a committed meta-transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReceipt {
	pub owner: Address,
	pub operation: OperationKind,
	pub nonce: U256,
	pub tx_hash: Hash256,
	pub steps_used: u64,
	/// Events in emission order, ending with `MetaTransactionExecuted`.
	pub events: Vec<GateEvent>,
}

/// Orchestrates hashing, recovery, allow-list fencing and dispatch.
pub struct MetaTransactionProcessor<'a> {
	codec: &'a TransactionCodec,
	verifier: &'a SignatureVerifier,
	executor: &'a DispatchExecutor,
	replay_protection: bool,
}

impl<'a> MetaTransactionProcessor<'a> {
	pub fn new(
		codec: &'a TransactionCodec,
		verifier: &'a SignatureVerifier,
		executor: &'a DispatchExecutor,
		replay_protection: bool,
	) -> Self {
		Self {
			codec,
			verifier,
			executor,
			replay_protection,
		}
	}

	/// Verifies `sig` over `tx` and executes the embedded operation for its owner.
	#[instrument(skip_all, fields(nonce = %tx.nonce))]
	pub fn execute(
		&self,
		state: &mut GateState,
		tx: &TransactionDescription,
		sig: &SignatureEnvelope,
	) -> Result<ExecutionReceipt, GateError> {
		let header = PayloadHeader::parse(&tx.payload)?;
		let owner = header.owner;

		let tx_hash = self.codec.hash(tx);
		let signer = self.verifier.recover(&tx_hash, sig)?;
		if signer != owner {
			tracing::warn!(owner = %owner, signer = %signer, "Signer does not match payload owner");
			return Err(GateError::InvalidSignature);
		}

		if self.replay_protection && state.nonces.is_used(owner, tx.nonce) {
			return Err(GateError::NonceAlreadyUsed {
				owner,
				nonce: tx.nonce,
			});
		}

		if !self.executor.allow_list().is_allowed(header.selector) {
			tracing::warn!(owner = %owner, selector = %header.selector, "Operation not allowed");
			return Err(GateError::OperationNotAllowed {
				selector: header.selector,
			});
		}

		let dispatched = self
			.executor
			.dispatch(state, &tx.payload)
			.map_err(|failure| {
				tracing::warn!(owner = %owner, error = %failure, "Dispatch failed");
				GateError::ExecutionFailed(failure)
			})?;

		if self.replay_protection {
			state.nonces.mark_used(owner, tx.nonce);
		}

		let operation = dispatched.operation.kind();
		let mut events = dispatched.events;
		events.push(GateEvent::MetaTransactionExecuted {
			owner,
			operation,
			nonce: tx.nonce,
			tx_hash,
		});

		tracing::info!(
			owner = %owner,
			operation = %operation,
			tx_hash = %tx_hash,
			steps_used = dispatched.steps_used,
			"Meta-transaction executed"
		);

		Ok(ExecutionReceipt {
			owner,
			operation,
			nonce: tx.nonce,
			tx_hash,
			steps_used: dispatched.steps_used,
			events,
		})
	}
}
