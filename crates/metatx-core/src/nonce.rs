//! Per-owner record of spent nonces.

use metatx_types::{Address, U256};
use std::collections::{HashMap, HashSet};

/// Nonces already consumed by successful meta-transactions, keyed by owner.
///
/// Nonces need not be sequential. Each (owner, nonce) pair executes at most
/// once.
#[derive(Debug, Default, Clone)]
pub struct NonceRegistry {
	used: HashMap<Address, HashSet<U256>>,
}

impl NonceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_used(&self, owner: Address, nonce: U256) -> bool {
		self.used
			.get(&owner)
			.is_some_and(|nonces| nonces.contains(&nonce))
	}

	/// Records `nonce` for `owner`, returning false if it was already spent.
	pub fn mark_used(&mut self, owner: Address, nonce: U256) -> bool {
		self.used.entry(owner).or_default().insert(nonce)
	}
}
