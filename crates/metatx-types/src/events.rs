//! Event types for external observers.
//!
//! Events are only published once the call that produced them has fully
//! succeeded. Observers never see events from a rejected request.

use crate::{Address, Hash256, OperationKind, U256};
use serde::{Deserialize, Serialize};

/// Main event type emitted by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateEvent {
	/// An operator approval was granted or revoked.
	ApprovalChanged {
		owner: Address,
		operator: Address,
		approved: bool,
	},
	/// Value moved between two accounts.
	Transfer {
		from: Address,
		to: Address,
		amount: U256,
	},
	/// A signed meta-transaction was executed on the owner's behalf.
	MetaTransactionExecuted {
		owner: Address,
		operation: OperationKind,
		nonce: U256,
		tx_hash: Hash256,
	},
}
