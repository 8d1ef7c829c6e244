//! Allow list of operations reachable through signature-authorized dispatch.
//!
//! The list is fixed when the gate is built. There is no registration path
//! afterwards, so a signature can never reach an operation that was not
//! allowed when the gate it was signed for came up.

use metatx_types::{OperationKind, Selector};
use std::collections::HashMap;

/// Selector to permission table.
#[derive(Debug, Clone)]
pub struct AllowList {
	entries: HashMap<Selector, bool>,
}

impl AllowList {
	/// Builds the table with `allowed` set to true.
	///
	/// Every known operation gets an entry. Selectors without one are denied.
	pub fn new(allowed: impl IntoIterator<Item = OperationKind>) -> Self {
		let mut entries: HashMap<Selector, bool> = OperationKind::ALL
			.iter()
			.map(|kind| (kind.selector(), false))
			.collect();
		for kind in allowed {
			entries.insert(kind.selector(), true);
		}
		Self { entries }
	}

	/// Returns whether `selector` may be dispatched. Unknown selectors are denied.
	pub fn is_allowed(&self, selector: Selector) -> bool {
		self.entries.get(&selector).copied().unwrap_or(false)
	}

	/// Operations currently allowed, in catalogue order.
	pub fn allowed_operations(&self) -> Vec<OperationKind> {
		OperationKind::ALL
			.into_iter()
			.filter(|kind| self.is_allowed(kind.selector()))
			.collect()
	}
}

impl Default for AllowList {
	fn default() -> Self {
		Self::new(OperationKind::ALL)
	}
}
