//! Controlled dispatch of allow-listed operations against the gate's state.
//!
//! The executor decodes a payload into a typed [`Operation`] and calls the
//! handler for that variant with the gate as caller, bound to the owner the
//! payload names. Failures come back as [`DispatchFailure`] values; nothing
//! the payload does can panic the executor.

pub(crate) mod handlers;
pub mod meter;

use crate::{AllowList, Caller, GateError, GateState};
use meter::{costs, StepMeter};
use metatx_types::{GateEvent, Operation, PayloadError, PayloadHeader, Selector};
use thiserror::Error;

/// Why a dispatched operation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchFailure {
	/// The payload does not decode as a known operation.
	#[error("Payload could not be decoded: {0}")]
	Decode(PayloadError),
	/// The selector is not on the allow list.
	#[error("Operation {0} is not allow-listed")]
	NotAllowed(Selector),
	/// The operation needs more steps than the dispatch ceiling.
	#[error("Step limit {limit} exceeded, {required} required")]
	OutOfSteps { limit: u64, required: u64 },
	/// The operation body refused the request.
	#[error("Operation rejected: {0}")]
	Rejected(Box<GateError>),
}

impl From<GateError> for DispatchFailure {
	fn from(err: GateError) -> Self {
		DispatchFailure::Rejected(Box::new(err))
	}
}

impl DispatchFailure {
	/// Converts a failure from an unbounded direct call back into a gate error.
	pub(crate) fn into_gate_error(self) -> GateError {
		match self {
			DispatchFailure::Rejected(inner) => *inner,
			other => GateError::ExecutionFailed(other),
		}
	}
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
	pub operation: Operation,
	/// Events produced by the operation, not yet published.
	pub events: Vec<GateEvent>,
	pub steps_used: u64,
}

/// Runs allow-listed operations under a fixed step ceiling.
#[derive(Debug, Clone)]
pub struct DispatchExecutor {
	allow_list: AllowList,
	step_limit: u64,
}

impl DispatchExecutor {
	pub fn new(allow_list: AllowList, step_limit: u64) -> Self {
		Self {
			allow_list,
			step_limit,
		}
	}

	pub fn allow_list(&self) -> &AllowList {
		&self.allow_list
	}

	pub fn step_limit(&self) -> u64 {
		self.step_limit
	}

	/// Invokes the operation encoded in `payload` as the gate itself.
	///
	/// The allow list is consulted again here so the executor fails closed
	/// even if a caller skipped the check. Only the processor may call this,
	/// after it has verified the owner's signature over `payload`.
	pub(crate) fn dispatch(
		&self,
		state: &mut GateState,
		payload: &[u8],
	) -> Result<Dispatched, DispatchFailure> {
		let mut meter = StepMeter::new(self.step_limit);
		meter.charge(costs::CALL_BASE)?;
		meter.charge_payload(payload.len())?;

		let header = PayloadHeader::parse(payload).map_err(DispatchFailure::Decode)?;
		if !self.allow_list.is_allowed(header.selector) {
			return Err(DispatchFailure::NotAllowed(header.selector));
		}

		let operation = Operation::decode(payload).map_err(DispatchFailure::Decode)?;
		let caller = Caller::Dispatch {
			owner: operation.owner(),
		};

		let event = match operation {
			Operation::TransferOnBehalf { owner, to, amount } => {
				handlers::transfer_on_behalf(state, &caller, &mut meter, owner, to, amount)?
			},
			Operation::SetOperatorApproval {
				owner,
				operator,
				approved,
			} => handlers::set_operator_approval(
				state, &caller, &mut meter, owner, operator, approved,
			)?,
		};

		tracing::debug!(
			operation = %operation.kind(),
			steps_used = meter.used(),
			step_limit = self.step_limit,
			"Dispatch completed"
		);

		Ok(Dispatched {
			operation,
			events: vec![event],
			steps_used: meter.used(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use metatx_ledger::implementations::memory::MemoryLedger;
	use metatx_ledger::LedgerService;
	use metatx_types::{Address, OperationKind, U256};

	fn addr(byte: u8) -> Address {
		Address::repeat_byte(byte)
	}

	fn state() -> GateState {
		GateState::new(LedgerService::new(Box::new(MemoryLedger::with_balances([(
			addr(0xa),
			U256::from(500),
		)]))))
	}

	fn transfer(to: Address, amount: u64) -> Vec<u8> {
		Operation::TransferOnBehalf {
			owner: addr(0xa),
			to,
			amount: U256::from(amount),
		}
		.encode()
		.to_vec()
	}

	#[test]
	fn test_dispatch_transfer() {
		let executor = DispatchExecutor::new(AllowList::default(), 100_000);
		let mut state = state();

		let dispatched = executor
			.dispatch(&mut state, &transfer(addr(0xb), 100))
			.unwrap();

		assert_eq!(dispatched.operation.kind(), OperationKind::TransferOnBehalf);
		assert_eq!(
			dispatched.events,
			vec![GateEvent::Transfer {
				from: addr(0xa),
				to: addr(0xb),
				amount: U256::from(100)
			}]
		);
		assert!(dispatched.steps_used > 0);
		assert_eq!(state.ledger.balance_of(&addr(0xb)), U256::from(100));
	}

	#[test]
	fn test_dispatch_fails_closed_on_allow_list() {
		let allow_list = AllowList::new([OperationKind::SetOperatorApproval]);
		let executor = DispatchExecutor::new(allow_list, 100_000);
		let mut state = state();

		let result = executor.dispatch(&mut state, &transfer(addr(0xb), 100));
		assert_eq!(
			result,
			Err(DispatchFailure::NotAllowed(OperationKind::TransferOnBehalf.selector()))
		);
		assert_eq!(state.ledger.balance_of(&addr(0xa)), U256::from(500));
	}

	#[test]
	fn test_rejections_are_reported_not_raised() {
		let executor = DispatchExecutor::new(AllowList::default(), 100_000);
		let mut state = state();

		let result = executor.dispatch(&mut state, &transfer(Address::ZERO, 1));
		assert_eq!(result, Err(GateError::InvalidRecipient.into()));

		let result = executor.dispatch(&mut state, &transfer(addr(0xb), 1_000));
		assert!(matches!(
			result,
			Err(DispatchFailure::Rejected(inner)) if matches!(*inner, GateError::Ledger(_))
		));

		let result = executor.dispatch(&mut state, &[0x01, 0x02]);
		assert!(matches!(result, Err(DispatchFailure::Decode(_))));
	}

	#[test]
	fn test_out_of_steps_leaves_state_untouched() {
		let executor = DispatchExecutor::new(AllowList::default(), 5_000);
		let mut state = state();

		let result = executor.dispatch(&mut state, &transfer(addr(0xb), 100));
		assert!(matches!(result, Err(DispatchFailure::OutOfSteps { limit: 5_000, .. })));
		assert_eq!(state.ledger.balance_of(&addr(0xa)), U256::from(500));
		assert_eq!(state.ledger.balance_of(&addr(0xb)), U256::ZERO);
	}
}
