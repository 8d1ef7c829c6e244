//! Transaction description types.
//!
//! A transaction description is the structured request an owner signs off-chain.
//! The gate never stores it; it lives for exactly one authorization-and-dispatch
//! cycle.

use crate::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Structured description of a state-changing operation authorized by signature.
///
/// The `payload` encodes an operation selector followed by its ABI arguments.
/// By convention the first argument is the owner on whose behalf the
/// operation executes.
///
/// # Fields
///
/// * `value` - Native amount attached to the request
/// * `payload` - Selector plus ABI-encoded arguments
/// * `nonce` - Replay-protection counter chosen by the owner
/// * `fee_price` - Relayer fee price, carried but not settled by the gate
/// * `fee_token` - Fee token, `None` for the native asset
/// * `extra_data` - Opaque bytes reserved for future authenticated fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDescription {
	pub value: U256,
	pub payload: Bytes,
	pub nonce: U256,
	pub fee_price: U256,
	pub fee_token: Option<Address>,
	pub extra_data: Bytes,
}

impl TransactionDescription {
	/// Creates a description for the given payload with every other field zeroed.
	pub fn new(payload: impl Into<Bytes>) -> Self {
		Self {
			payload: payload.into(),
			..Default::default()
		}
	}

	/// Sets the nonce.
	pub fn with_nonce(mut self, nonce: U256) -> Self {
		self.nonce = nonce;
		self
	}

	/// Sets the attached native value.
	pub fn with_value(mut self, value: U256) -> Self {
		self.value = value;
		self
	}

	/// Sets the relayer fee terms.
	pub fn with_fee(mut self, fee_price: U256, fee_token: Option<Address>) -> Self {
		self.fee_price = fee_price;
		self.fee_token = fee_token;
		self
	}

	/// Sets the reserved extra data.
	pub fn with_extra_data(mut self, extra_data: impl Into<Bytes>) -> Self {
		self.extra_data = extra_data.into();
		self
	}
}
