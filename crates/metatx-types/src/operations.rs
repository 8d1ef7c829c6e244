//! Typed operation payloads.
//!
//! Every payload starts with a four-byte selector followed by ABI-encoded
//! arguments whose first word is the acting owner. The operations the gate
//! understands are declared once as a Solidity interface and decoded into the
//! [`Operation`] enum, so handlers never look at raw bytes.

use crate::{Address, Bytes, Selector, U256};
use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

sol! {
	/// Operations reachable through signature-authorized dispatch.
	interface IMetaGate {
		/// Moves `amount` from `owner` to `to`.
		function transferOnBehalf(address owner, address to, uint256 amount) external;
		/// Grants or revokes `operator`'s right to act for `owner`.
		function setOperatorApproval(address owner, address operator, bool approved) external;
	}
}

/// Length of the selector prefix.
pub const SELECTOR_LEN: usize = 4;
/// Length of one ABI word.
pub const WORD_LEN: usize = 32;

/// Errors that can occur while parsing an operation payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
	/// Payload is too short to hold a selector and the owner argument.
	#[error("Payload too short: {length} bytes")]
	TooShort { length: usize },
	/// The owner word carries non-zero bytes above the 20-byte address.
	#[error("Owner argument is not a valid address word")]
	DirtyOwnerWord,
	/// The selector does not name a known operation.
	#[error("Unknown operation selector {0}")]
	UnknownSelector(Selector),
	/// The arguments do not decode as the selected operation.
	#[error("ABI decoding failed: {0}")]
	Abi(String),
}

/// Selector and owner binding shared by every payload.
///
/// Parsing the header does not require the selector to be known, which lets
/// the gate bind a signature to its owner before deciding whether the
/// operation is allowed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadHeader {
	pub selector: Selector,
	pub owner: Address,
}

impl PayloadHeader {
	/// Parses the selector and the leading owner argument.
	pub fn parse(payload: &[u8]) -> Result<Self, PayloadError> {
		if payload.len() < SELECTOR_LEN + WORD_LEN {
			return Err(PayloadError::TooShort {
				length: payload.len(),
			});
		}

		let selector = Selector::from_slice(&payload[..SELECTOR_LEN]);
		let word = &payload[SELECTOR_LEN..SELECTOR_LEN + WORD_LEN];
		if word[..12].iter().any(|&b| b != 0) {
			return Err(PayloadError::DirtyOwnerWord);
		}

		Ok(Self {
			selector,
			owner: Address::from_slice(&word[12..]),
		})
	}
}

/// Kinds of operation the gate knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
	/// Balance transfer out of the owner's account.
	TransferOnBehalf,
	/// Operator approval toggle for the owner.
	SetOperatorApproval,
}

impl OperationKind {
	/// Every known operation kind.
	pub const ALL: [OperationKind; 2] = [
		OperationKind::TransferOnBehalf,
		OperationKind::SetOperatorApproval,
	];

	/// Returns the ABI selector of this operation.
	pub fn selector(&self) -> Selector {
		match self {
			OperationKind::TransferOnBehalf => {
				Selector::from(IMetaGate::transferOnBehalfCall::SELECTOR)
			},
			OperationKind::SetOperatorApproval => {
				Selector::from(IMetaGate::setOperatorApprovalCall::SELECTOR)
			},
		}
	}

	/// Looks up the operation kind for a selector.
	pub fn from_selector(selector: Selector) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.selector() == selector)
	}

	/// Returns the configuration name of this operation.
	pub fn as_str(&self) -> &'static str {
		match self {
			OperationKind::TransferOnBehalf => "transfer_on_behalf",
			OperationKind::SetOperatorApproval => "set_operator_approval",
		}
	}
}

impl fmt::Display for OperationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OperationKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| format!("Unknown operation '{}'", s))
	}
}

/// A fully decoded operation with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	TransferOnBehalf {
		owner: Address,
		to: Address,
		amount: U256,
	},
	SetOperatorApproval {
		owner: Address,
		operator: Address,
		approved: bool,
	},
}

impl Operation {
	/// Decodes a payload into a typed operation.
	///
	/// The ABI decoder runs in validating mode, so trailing garbage or
	/// non-canonical words are rejected.
	pub fn decode(payload: &[u8]) -> Result<Self, PayloadError> {
		let header = PayloadHeader::parse(payload)?;
		let kind = OperationKind::from_selector(header.selector)
			.ok_or(PayloadError::UnknownSelector(header.selector))?;

		match kind {
			OperationKind::TransferOnBehalf => {
				let call = IMetaGate::transferOnBehalfCall::abi_decode(payload, true)
					.map_err(|e| PayloadError::Abi(e.to_string()))?;
				Ok(Operation::TransferOnBehalf {
					owner: call.owner,
					to: call.to,
					amount: call.amount,
				})
			},
			OperationKind::SetOperatorApproval => {
				let call = IMetaGate::setOperatorApprovalCall::abi_decode(payload, true)
					.map_err(|e| PayloadError::Abi(e.to_string()))?;
				Ok(Operation::SetOperatorApproval {
					owner: call.owner,
					operator: call.operator,
					approved: call.approved,
				})
			},
		}
	}

	/// Encodes the operation as selector plus ABI arguments.
	pub fn encode(&self) -> Bytes {
		match self {
			Operation::TransferOnBehalf { owner, to, amount } => IMetaGate::transferOnBehalfCall {
				owner: *owner,
				to: *to,
				amount: *amount,
			}
			.abi_encode()
			.into(),
			Operation::SetOperatorApproval {
				owner,
				operator,
				approved,
			} => IMetaGate::setOperatorApprovalCall {
				owner: *owner,
				operator: *operator,
				approved: *approved,
			}
			.abi_encode()
			.into(),
		}
	}

	/// Returns the kind of this operation.
	pub fn kind(&self) -> OperationKind {
		match self {
			Operation::TransferOnBehalf { .. } => OperationKind::TransferOnBehalf,
			Operation::SetOperatorApproval { .. } => OperationKind::SetOperatorApproval,
		}
	}

	/// Returns the owner the operation acts for.
	pub fn owner(&self) -> Address {
		match self {
			Operation::TransferOnBehalf { owner, .. } => *owner,
			Operation::SetOperatorApproval { owner, .. } => *owner,
		}
	}
}
