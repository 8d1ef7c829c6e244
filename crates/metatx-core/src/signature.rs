//! Signer recovery for signature envelopes.

use crate::GateError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use metatx_account::implementations::local::public_key_address;
use metatx_types::{
	prefixed_hash, Address, Hash256, SignatureEnvelope, B256, LEGACY_RECOVERY_OFFSET, U256,
};

/// Order `n` of the secp256k1 group.
pub const SECP256K1_ORDER: U256 = U256::from_limbs([
	0xBFD2_5E8C_D036_4141,
	0xBAAE_DCE6_AF48_A03B,
	0xFFFF_FFFF_FFFF_FFFE,
	0xFFFF_FFFF_FFFF_FFFF,
]);

/// Maps a high-s signature onto its low-s twin `(r, n - s)` with flipped parity.
///
/// Both forms recover the same key. Scalars outside `(0, n)` are returned
/// untouched for the decoder to reject.
fn normalize_s(s: B256, parity: u8) -> (B256, u8) {
	let value = U256::from_be_bytes(s.0);
	if value > SECP256K1_ORDER >> 1usize && value < SECP256K1_ORDER {
		(B256::from((SECP256K1_ORDER - value).to_be_bytes::<32>()), parity ^ 1)
	} else {
		(s, parity)
	}
}

/// Recovers signing addresses from hashes and signature envelopes.
///
/// Recovery ids are accepted in both the raw 0/1 and the legacy 27/28
/// encodings, and `s` in either half of the group order. A non-empty `sig_prefix` is hashed in front of the digest before
/// recovery, matching what wallet software signs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignatureVerifier;

impl SignatureVerifier {
	pub fn new() -> Self {
		Self
	}

	/// Recovers the address that signed `hash`.
	///
	/// Never returns the zero address: malformed or unrecoverable signature
	/// data yields `InvalidSignature`.
	pub fn recover(&self, hash: &Hash256, sig: &SignatureEnvelope) -> Result<Address, GateError> {
		let digest = if sig.has_prefix() {
			prefixed_hash(&sig.sig_prefix, hash)
		} else {
			*hash
		};

		let parity = match sig.normalized_recovery_id().checked_sub(LEGACY_RECOVERY_OFFSET) {
			Some(parity @ (0 | 1)) => parity,
			_ => return Err(GateError::InvalidSignature),
		};
		let (s, parity) = normalize_s(sig.s, parity);
		let recovery_id = RecoveryId::from_byte(parity).ok_or(GateError::InvalidSignature)?;

		let mut compact = [0u8; 64];
		compact[..32].copy_from_slice(sig.r.as_slice());
		compact[32..].copy_from_slice(s.as_slice());
		let signature = Signature::from_slice(&compact).map_err(|_| GateError::InvalidSignature)?;

		let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
			.map_err(|_| GateError::InvalidSignature)?;

		let signer = public_key_address(&key);
		if signer == Address::ZERO {
			return Err(GateError::InvalidSignature);
		}
		Ok(signer)
	}
}

/// Recovers the signer of `hash` without going through a gate.
pub fn recover_signer(hash: &Hash256, sig: &SignatureEnvelope) -> Result<Address, GateError> {
	SignatureVerifier.recover(hash, sig)
}
