//! Local secp256k1 account implementation.
//!
//! Holds the owner's private key in memory and signs digests directly,
//! producing envelopes with the recovery id in the 27/28 encoding.

use crate::{AccountError, AccountInterface};
use k256::ecdsa::{SigningKey, VerifyingKey};
use metatx_types::{keccak256, Address, Hash256, SignatureEnvelope, B256, LEGACY_RECOVERY_OFFSET};

/// Derives the account address of a secp256k1 public key.
///
/// The address is the last 20 bytes of the keccak256 hash of the uncompressed
/// point without its 0x04 tag.
pub fn public_key_address(key: &VerifyingKey) -> Address {
	let point = key.to_encoded_point(false);
	let hash = keccak256(&point.as_bytes()[1..]);
	Address::from_slice(&hash[12..])
}

/// Account backed by an in-memory private key.
pub struct LocalAccount {
	signing_key: SigningKey,
	address: Address,
}

impl LocalAccount {
	/// Creates an account from a hex private key, with or without 0x prefix.
	///
	/// The key must be exactly 32 bytes.
	pub fn from_private_key(private_key: &str) -> Result<Self, AccountError> {
		let key_hex = private_key.strip_prefix("0x").unwrap_or(private_key);
		if key_hex.len() != 64 {
			return Err(AccountError::InvalidKey(
				"Private key must be 64 hex characters (32 bytes)".to_string(),
			));
		}
		let key_bytes = hex::decode(key_hex).map_err(|e| AccountError::InvalidKey(e.to_string()))?;
		let signing_key =
			SigningKey::from_slice(&key_bytes).map_err(|e| AccountError::InvalidKey(e.to_string()))?;
		let address = public_key_address(signing_key.verifying_key());

		Ok(Self {
			signing_key,
			address,
		})
	}
}

impl AccountInterface for LocalAccount {
	fn address(&self) -> Address {
		self.address
	}

	fn sign_hash(&self, hash: &Hash256) -> Result<SignatureEnvelope, AccountError> {
		let (signature, recovery_id) = self
			.signing_key
			.sign_prehash_recoverable(hash.as_slice())
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		let bytes = signature.to_bytes();
		Ok(SignatureEnvelope::new(
			recovery_id.to_byte() + LEGACY_RECOVERY_OFFSET,
			B256::from_slice(&bytes[..32]),
			B256::from_slice(&bytes[32..]),
		))
	}
}
