//! Registry trait for self-registering implementations.
//!
//! Pluggable collaborators (ledgers, accounts) declare the name they are
//! configured under together with a factory function.

/// Base trait for implementation registries.
///
/// Each implementation module must provide a Registry struct implementing this
/// trait, so the builder can map configuration keys to constructors.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "memory" for `ledger.implementations.memory`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
