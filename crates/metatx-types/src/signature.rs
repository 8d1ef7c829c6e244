//! Signature envelope types.

use crate::B256;
use serde::{Deserialize, Serialize};

/// Lowest canonical recovery id under the legacy `v` encoding.
pub const LEGACY_RECOVERY_OFFSET: u8 = 27;

/// ECDSA signature triple submitted by a relayer together with its signing convention.
///
/// `recovery_id` may be supplied either as `0`/`1` or as `27`/`28`; both are
/// accepted. When `sig_prefix` is non-empty the signer is assumed to have
/// signed `keccak256(sig_prefix || hash)` instead of the raw hash, which is
/// how most wallets sign personal messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
	pub recovery_id: u8,
	pub r: B256,
	pub s: B256,
	#[serde(default)]
	pub sig_prefix: String,
}

impl SignatureEnvelope {
	/// Creates an envelope for a signature over the raw hash.
	pub fn new(recovery_id: u8, r: B256, s: B256) -> Self {
		Self {
			recovery_id,
			r,
			s,
			sig_prefix: String::new(),
		}
	}

	/// Declares the human-readable prefix the signer applied before signing.
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.sig_prefix = prefix.into();
		self
	}

	/// Returns the recovery id shifted into the 27/28 range.
	///
	/// Values below 27 are treated as raw parities and offset; anything else
	/// is returned untouched so out-of-range ids still fail recovery.
	pub fn normalized_recovery_id(&self) -> u8 {
		if self.recovery_id < LEGACY_RECOVERY_OFFSET {
			self.recovery_id.saturating_add(LEGACY_RECOVERY_OFFSET)
		} else {
			self.recovery_id
		}
	}

	/// Returns true if the signer used a message prefix.
	pub fn has_prefix(&self) -> bool {
		!self.sig_prefix.is_empty()
	}
}
