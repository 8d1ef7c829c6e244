//! In-memory ledger implementation.
//!
//! Balances live in a HashMap and are lost on restart. Genesis balances can be
//! seeded from configuration, which makes this backend suitable for tests and
//! local development.

use crate::{LedgerError, LedgerFactory, LedgerInterface, LedgerRegistry};
use metatx_types::{
	Address, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError, U256,
};
use std::collections::HashMap;
use std::str::FromStr;

/// In-memory ledger implementation.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
	balances: HashMap<Address, U256>,
}

impl MemoryLedger {
	/// Creates an empty ledger.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a ledger with the given starting balances.
	pub fn with_balances(balances: impl IntoIterator<Item = (Address, U256)>) -> Self {
		Self {
			balances: balances.into_iter().collect(),
		}
	}
}

impl LedgerInterface for MemoryLedger {
	fn balance_of(&self, account: &Address) -> U256 {
		self.balances.get(account).copied().unwrap_or(U256::ZERO)
	}

	fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
		let available = self.balance_of(&from);
		let new_from = available
			.checked_sub(amount)
			.ok_or(LedgerError::InsufficientBalance {
				account: from,
				available,
				required: amount,
			})?;

		if from == to {
			return Ok(());
		}

		let new_to = self
			.balance_of(&to)
			.checked_add(amount)
			.ok_or(LedgerError::Overflow(to))?;

		// Both balances are computed before either is written
		self.balances.insert(from, new_from);
		self.balances.insert(to, new_to);
		Ok(())
	}
}

/// Parses a balance given as a decimal or 0x-prefixed hex string.
fn parse_balance(raw: &str) -> Result<U256, String> {
	U256::from_str(raw).map_err(|e| format!("invalid amount '{}': {}", raw, e))
}

/// Configuration schema for MemoryLedger.
pub struct MemoryLedgerSchema;

impl ConfigSchema for MemoryLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("balances", FieldType::Map(Box::new(FieldType::String)))
				.with_validator(|value| {
					if let Some(table) = value.as_table() {
						for (account, amount) in table {
							Address::from_str(account)
								.map_err(|e| format!("invalid account '{}': {}", account, e))?;
							parse_balance(amount.as_str().unwrap_or_default())?;
						}
					}
					Ok(())
				})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a memory ledger from configuration.
///
/// Configuration parameters:
/// - `balances` (optional): table of account address to amount string
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError> {
	MemoryLedgerSchema
		.validate(config)
		.map_err(|e| LedgerError::Configuration(e.to_string()))?;

	let mut balances = HashMap::new();
	if let Some(table) = config.get("balances").and_then(|v| v.as_table()) {
		for (account, amount) in table {
			let account = Address::from_str(account)
				.map_err(|e| LedgerError::Configuration(e.to_string()))?;
			let amount = parse_balance(amount.as_str().unwrap_or_default())
				.map_err(LedgerError::Configuration)?;
			balances.insert(account, amount);
		}
	}

	tracing::info!(accounts = balances.len(), "Seeded memory ledger");
	Ok(Box::new(MemoryLedger::with_balances(balances)))
}

/// Registry for the memory ledger implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl LedgerRegistry for Registry {}
