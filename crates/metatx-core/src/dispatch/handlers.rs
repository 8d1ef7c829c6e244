//! Operation bodies.
//!
//! Direct calls and dispatched meta-transactions run the same handlers; they
//! differ only in the [`Caller`] and the meter they pass in. Handlers check,
//! then charge, then mutate.

use super::meter::{costs, StepMeter};
use super::DispatchFailure;
use crate::{Caller, GateError, GateState};
use metatx_types::{Address, GateEvent, U256};

/// Moves `amount` from `owner` to `to` if `caller` may act for `owner`.
pub(crate) fn transfer_on_behalf(
	state: &mut GateState,
	caller: &Caller,
	meter: &mut StepMeter,
	owner: Address,
	to: Address,
	amount: U256,
) -> Result<GateEvent, DispatchFailure> {
	if to == Address::ZERO {
		return Err(GateError::InvalidRecipient.into());
	}

	meter.charge(costs::STORAGE_READ)?;
	if !state.authorization.authorize_actor(caller, owner) {
		return Err(GateError::InvalidSender.into());
	}

	meter.charge(2 * costs::STORAGE_READ + 2 * costs::STORAGE_WRITE + costs::EVENT)?;
	state
		.ledger
		.transfer(owner, to, amount)
		.map_err(GateError::Ledger)?;
	tracing::info!(from = %owner, to = %to, amount = %amount, caller = ?caller, "Transfer applied");

	Ok(GateEvent::Transfer {
		from: owner,
		to,
		amount,
	})
}

/// Grants or revokes `operator` for `owner` if `caller` holds the owner's authority.
pub(crate) fn set_operator_approval(
	state: &mut GateState,
	caller: &Caller,
	meter: &mut StepMeter,
	owner: Address,
	operator: Address,
	approved: bool,
) -> Result<GateEvent, DispatchFailure> {
	state.authorization.ensure_can_manage(caller, owner)?;

	meter.charge(costs::STORAGE_WRITE + costs::EVENT)?;
	let event = state.authorization.apply(owner, operator, approved);
	tracing::info!(owner = %owner, operator = %operator, approved, caller = ?caller, "Approval changed");
	Ok(event)
}
