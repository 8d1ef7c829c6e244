//! Operator approvals and the actor predicate every mutation consults.

use crate::GateError;
use metatx_types::{Address, GateEvent};
use std::collections::HashSet;

/// Identity on whose authority an operation body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
	/// An account calling the gate directly.
	Account(Address),
	/// The gate dispatching a verified meta-transaction.
	///
	/// Carries the owner whose signature was verified. Outside the processor
	/// nothing can construct a dispatch caller that reaches the handlers.
	Dispatch { owner: Address },
}

impl Caller {
	/// Whether this caller holds `owner`'s own authority: the owner itself,
	/// or dispatch on a verified signature from `owner`.
	fn acts_as_owner(&self, owner: Address) -> bool {
		match *self {
			Caller::Account(account) => account == owner,
			Caller::Dispatch { owner: bound } => bound == owner,
		}
	}
}

/// Per-owner operator approvals.
///
/// Entries persist until revoked by the owner, directly or through a signed
/// meta-transaction. Operators can never change approvals themselves.
#[derive(Debug, Default, Clone)]
pub struct AuthorizationGate {
	approvals: HashSet<(Address, Address)>,
}

impl AuthorizationGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns whether `operator` is approved to act for `owner`.
	pub fn is_approved(&self, owner: Address, operator: Address) -> bool {
		self.approvals.contains(&(owner, operator))
	}

	/// Returns whether `caller` may mutate state on `owner`'s behalf.
	///
	/// True for the owner, for an approved operator and for dispatch bound
	/// to that owner.
	pub fn authorize_actor(&self, caller: &Caller, owner: Address) -> bool {
		if caller.acts_as_owner(owner) {
			return true;
		}
		match *caller {
			Caller::Account(operator) => self.is_approved(owner, operator),
			Caller::Dispatch { .. } => false,
		}
	}

	/// Fails with `InvalidSender` unless `caller` may change `owner`'s approvals.
	pub fn ensure_can_manage(&self, caller: &Caller, owner: Address) -> Result<(), GateError> {
		if caller.acts_as_owner(owner) {
			Ok(())
		} else {
			Err(GateError::InvalidSender)
		}
	}

	/// Sets or clears the (owner, operator) relation after checking `caller`.
	pub fn set_approval(
		&mut self,
		caller: &Caller,
		owner: Address,
		operator: Address,
		approved: bool,
	) -> Result<GateEvent, GateError> {
		self.ensure_can_manage(caller, owner)?;
		Ok(self.apply(owner, operator, approved))
	}

	/// Writes the relation unconditionally. Callers check authority first.
	pub(crate) fn apply(&mut self, owner: Address, operator: Address, approved: bool) -> GateEvent {
		if approved {
			self.approvals.insert((owner, operator));
		} else {
			self.approvals.remove(&(owner, operator));
		}
		GateEvent::ApprovalChanged {
			owner,
			operator,
			approved,
		}
	}
}
