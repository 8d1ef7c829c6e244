//! Account management module for meta-transaction owners.
//!
//! Owners never submit transactions themselves. They sign a transaction
//! description off-chain and hand the resulting [`SignatureEnvelope`] to a
//! relayer. This module provides the signing side of that exchange.

use metatx_types::{
	prefixed_hash, Address, Hash256, SignatureEnvelope, TransactionCodec, TransactionDescription,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// Trait defining the interface for account implementations.
pub trait AccountInterface: Send + Sync {
	/// Returns the address controlled by this account.
	fn address(&self) -> Address;

	/// Signs a 32-byte digest as-is, returning an envelope without prefix.
	fn sign_hash(&self, hash: &Hash256) -> Result<SignatureEnvelope, AccountError>;
}

/// Service that produces signed authorizations for an owner.
pub struct AccountService {
	/// The underlying account implementation.
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation.
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Returns the owner address of the managed account.
	pub fn get_address(&self) -> Address {
		self.implementation.address()
	}

	/// Signs a raw digest, optionally under a wallet prefix.
	///
	/// With a prefix the signature covers `keccak256(prefix || hash)` and the
	/// prefix is recorded in the envelope so the verifier can reproduce it.
	pub fn sign_hash(
		&self,
		hash: &Hash256,
		prefix: Option<&str>,
	) -> Result<SignatureEnvelope, AccountError> {
		match prefix {
			Some(prefix) if !prefix.is_empty() => {
				let digest = prefixed_hash(prefix, hash);
				Ok(self.implementation.sign_hash(&digest)?.with_prefix(prefix))
			},
			_ => self.implementation.sign_hash(hash),
		}
	}

	/// Signs a transaction description for submission to the gate `codec` is bound to.
	pub fn sign_transaction(
		&self,
		codec: &TransactionCodec,
		tx: &TransactionDescription,
		prefix: Option<&str>,
	) -> Result<SignatureEnvelope, AccountError> {
		self.sign_hash(&codec.hash(tx), prefix)
	}
}
