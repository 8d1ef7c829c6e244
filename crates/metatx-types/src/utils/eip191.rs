//! EIP-191 style transaction hashing.
//!
//! These helpers provide:
//! - The canonical digest of a transaction description, domain-separated by
//!   a version byte, a reserved byte and the gate's own address
//! - Wallet-prefixed digests (`keccak256(prefix || hash)`)
//! - A minimal packed encoder for the fixed-width fields involved

use crate::{keccak256, Address, Hash256, TransactionDescription, B256, U256};

/// Leading byte of every signed-data digest.
pub const EIP191_VERSION_BYTE: u8 = 0x19;
/// Reserved discriminant following the version byte.
pub const EIP191_RESERVED_BYTE: u8 = 0x00;
/// Prefix applied by wallets when signing a 32-byte message.
pub const ETH_SIGNED_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n32";

/// Computes the digest a wallet actually signed: `keccak256(prefix || hash)`.
pub fn prefixed_hash(prefix: &str, hash: &Hash256) -> Hash256 {
	let mut buf = Vec::with_capacity(prefix.len() + 32);
	buf.extend_from_slice(prefix.as_bytes());
	buf.extend_from_slice(hash.as_slice());
	keccak256(buf)
}

/// Canonicalizes transaction descriptions into digests bound to one gate instance.
///
/// The gate's address fills both the origin and the destination slot of the
/// domain prefix, since the gate only ever authorizes calls against itself.
/// A signature produced for one gate therefore never verifies on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionCodec {
	gate: Address,
}

impl TransactionCodec {
	/// Creates a codec bound to the given gate address.
	pub fn new(gate: Address) -> Self {
		Self { gate }
	}

	/// Returns the gate address the codec binds digests to.
	pub fn gate(&self) -> Address {
		self.gate
	}

	/// Returns the packed pre-image of a transaction description.
	///
	/// Variable-length fields are committed to by their keccak256 hash so the
	/// pre-image has a fixed 222-byte layout.
	pub fn encode(&self, tx: &TransactionDescription) -> Vec<u8> {
		let mut enc = PackedEncoder::new();
		enc.push_u8(EIP191_VERSION_BYTE);
		enc.push_u8(EIP191_RESERVED_BYTE);
		enc.push_address(&self.gate);
		enc.push_address(&self.gate);
		enc.push_u256(tx.value);
		enc.push_b256(&keccak256(&tx.payload));
		enc.push_u256(tx.nonce);
		enc.push_u256(tx.fee_price);
		enc.push_address(&tx.fee_token.unwrap_or(Address::ZERO));
		enc.push_b256(&keccak256(&tx.extra_data));
		enc.finish()
	}

	/// Computes the digest an owner signs for a transaction description.
	pub fn hash(&self, tx: &TransactionDescription) -> Hash256 {
		keccak256(self.encode(tx))
	}
}

/// Minimal packed encoder: fields are concatenated without padding.
pub struct PackedEncoder {
	buf: Vec<u8>,
}

impl Default for PackedEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl PackedEncoder {
	pub fn new() -> Self {
		Self { buf: Vec::new() }
	}

	pub fn push_u8(&mut self, v: u8) {
		self.buf.push(v);
	}

	pub fn push_address(&mut self, addr: &Address) {
		self.buf.extend_from_slice(addr.as_slice());
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	pub fn push_u256(&mut self, v: U256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}
