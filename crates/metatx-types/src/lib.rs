//! Common types module for the meta-transaction gate.
//!
//! This module defines the data model shared by every gate component: the
//! transaction description an owner signs, the signature envelope a relayer
//! submits, the typed operation payloads and the events observers receive.

/// Events emitted by the gate for external observers.
pub mod events;
/// Typed operation payloads and their ABI encoding.
pub mod operations;
/// Registry trait for configurable implementations.
pub mod registry;
/// Signature envelope submitted alongside a transaction description.
pub mod signature;
/// Transaction description signed by an owner.
pub mod transaction;
/// Hashing and encoding helpers.
pub mod utils;
/// Configuration validation types for implementation-specific settings.
pub mod validation;

pub use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};

/// 32-byte digest produced by the transaction codec.
pub type Hash256 = B256;

/// Four-byte operation selector leading every payload.
pub type Selector = FixedBytes<4>;

// Re-export all types for convenient access
pub use events::*;
pub use operations::*;
pub use registry::ImplementationRegistry;
pub use signature::*;
pub use transaction::*;
pub use utils::{prefixed_hash, PackedEncoder, TransactionCodec, ETH_SIGNED_MESSAGE_PREFIX};
pub use validation::*;
