//! Builder constructing a [`MetaGate`] from configuration.
//!
//! Ledger implementations are created through factory functions keyed by the
//! names used under `[ledger.implementations]`.

use crate::{GateSettings, MetaGate};
use metatx_config::Config;
use metatx_ledger::{LedgerError, LedgerFactory, LedgerInterface, LedgerService};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during gate construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factories for every ledger implementation compiled into this crate.
pub fn default_ledger_factories() -> HashMap<String, LedgerFactory> {
	metatx_ledger::get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect()
}

/// Builder for constructing a MetaGate with a pluggable ledger.
pub struct GateBuilder {
	config: Config,
}

impl GateBuilder {
	/// Creates a new GateBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the gate, instantiating every configured ledger and using the primary.
	pub fn build<LF>(self, ledger_factories: HashMap<String, LF>) -> Result<MetaGate, BuilderError>
	where
		LF: Fn(&toml::Value) -> Result<Box<dyn LedgerInterface>, LedgerError>,
	{
		let mut ledger_impls = HashMap::new();
		for (name, config) in &self.config.ledger.implementations {
			let Some(factory) = ledger_factories.get(name) else {
				tracing::warn!(component = "ledger", implementation = %name, "No factory registered");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					let is_primary = &self.config.ledger.primary == name;
					tracing::info!(component = "ledger", implementation = %name, enabled = %is_primary, "Loaded");
					ledger_impls.insert(name.clone(), implementation);
				},
				Err(e) => {
					tracing::error!(
						component = "ledger",
						implementation = %name,
						error = %e,
						"Failed to create ledger implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create ledger implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary = &self.config.ledger.primary;
		let ledger = ledger_impls.remove(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!("Primary ledger '{}' is not available", primary))
		})?;

		let settings = GateSettings::from(&self.config.gate);
		tracing::info!(
			component = "gate",
			address = %settings.address,
			step_limit = settings.dispatch_step_limit,
			replay_protection = settings.replay_protection,
			allowed = ?settings.allowed_operations,
			"Gate ready"
		);

		Ok(MetaGate::new(settings, LedgerService::new(ledger)))
	}
}

impl MetaGate {
	/// Builds a gate from configuration using the bundled ledger implementations.
	pub fn from_config(config: Config) -> Result<Self, BuilderError> {
		GateBuilder::new(config).build(default_ledger_factories())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use metatx_types::{Address, OperationKind, U256};

	const CONFIG: &str = r#"
[gate]
address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
dispatch_step_limit = 50000
allowed_operations = ["set_operator_approval"]

[ledger]
primary = "memory"
[ledger.implementations.memory]
balances = { "0x1111111111111111111111111111111111111111" = "1000" }
"#;

	#[test]
	fn test_build_from_config() {
		let config: Config = CONFIG.parse().unwrap();
		let gate = MetaGate::from_config(config).unwrap();

		assert_eq!(gate.balance_of(&Address::repeat_byte(0x11)), U256::from(1000));
		assert!(gate.is_allowed(OperationKind::SetOperatorApproval.selector()));
		assert!(!gate.is_allowed(OperationKind::TransferOnBehalf.selector()));
		assert_eq!(
			gate.address(),
			"0x5fbdb2315678afecb367f032d93f642f64180aa3"
				.parse::<Address>()
				.unwrap()
		);
	}

	#[test]
	fn test_missing_factory_is_reported() {
		let config: Config = CONFIG.parse().unwrap();
		let result = GateBuilder::new(config).build(HashMap::<String, LedgerFactory>::new());

		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	#[test]
	fn test_factory_error_is_reported() {
		let config: Config = CONFIG
			.replace("\"1000\"", "\"a lot\"")
			.parse()
			.unwrap();
		let result = MetaGate::from_config(config);

		assert!(matches!(result, Err(BuilderError::Config(_))));
	}
}
