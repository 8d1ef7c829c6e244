//! Ledger module for the meta-transaction gate.
//!
//! The ledger is the external collaborator that owns balance bookkeeping.
//! The gate only asks it to move value once authorization has succeeded; how
//! balances are stored is up to the implementation.

use metatx_types::{Address, ImplementationRegistry, U256};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
	/// The source account cannot cover the transfer.
	#[error("Insufficient balance for {account}: have {available}, need {required}")]
	InsufficientBalance {
		account: Address,
		available: U256,
		required: U256,
	},
	/// Crediting the destination would overflow its balance.
	#[error("Balance overflow for {0}")]
	Overflow(Address),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for ledger implementations.
///
/// `transfer` must be all-or-nothing: when it returns an error no balance may
/// have changed.
pub trait LedgerInterface: Send + Sync {
	/// Returns the balance held by `account`.
	fn balance_of(&self, account: &Address) -> U256;

	/// Moves `amount` from `from` to `to`.
	fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError>;
}

/// Type alias for ledger factory functions.
pub type LedgerFactory = fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>;

/// Registry trait for ledger implementations.
pub trait LedgerRegistry: ImplementationRegistry<Factory = LedgerFactory> {}

/// Get all registered ledger implementations.
///
/// Returns a vector of (name, factory) tuples, used by the gate builder to map
/// `[ledger.implementations.<name>]` sections to constructors.
pub fn get_all_implementations() -> Vec<(&'static str, LedgerFactory)> {
	use implementations::memory;

	vec![(memory::Registry::NAME, memory::Registry::factory())]
}

/// Service wrapping the configured ledger implementation.
pub struct LedgerService {
	/// The underlying ledger implementation.
	implementation: Box<dyn LedgerInterface>,
}

impl LedgerService {
	/// Creates a new LedgerService with the specified implementation.
	pub fn new(implementation: Box<dyn LedgerInterface>) -> Self {
		Self { implementation }
	}

	/// Returns the balance held by `account`.
	pub fn balance_of(&self, account: &Address) -> U256 {
		self.implementation.balance_of(account)
	}

	/// Moves `amount` from `from` to `to`.
	pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
		self.implementation.transfer(from, to, amount)?;
		tracing::debug!(from = %from, to = %to, amount = %amount, "Ledger transfer applied");
		Ok(())
	}
}
