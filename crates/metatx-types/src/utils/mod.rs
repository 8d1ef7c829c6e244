//! Hashing and encoding helpers shared by signers and verifiers.

pub mod eip191;

pub use eip191::{
	prefixed_hash, PackedEncoder, TransactionCodec, EIP191_RESERVED_BYTE, EIP191_VERSION_BYTE,
	ETH_SIGNED_MESSAGE_PREFIX,
};
