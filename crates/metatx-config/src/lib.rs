//! Configuration module for the meta-transaction gate.
//!
//! Configuration is loaded from TOML, with `${VAR}` and `${VAR:-default}`
//! environment interpolation and validation of every section.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use metatx_types::{Address, OperationKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Step ceiling applied when `gate.dispatch_step_limit` is not set.
pub const DEFAULT_DISPATCH_STEP_LIMIT: u64 = 100_000;
/// Upper bound accepted for `gate.dispatch_step_limit`.
pub const MAX_DISPATCH_STEP_LIMIT: u64 = 10_000_000;
/// Event buffer size applied when `gate.event_capacity` is not set.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Gate identity and dispatch policy.
	pub gate: GateConfig,
	/// Ledger collaborator selection.
	pub ledger: LedgerConfig,
}

/// Configuration of the gate itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateConfig {
	/// The gate's own address. It only domain-separates transaction digests
	/// and grants no authority to accounts calling from it.
	pub address: Address,
	/// Step ceiling applied to every dispatched operation.
	#[serde(default = "default_dispatch_step_limit")]
	pub dispatch_step_limit: u64,
	/// Whether each (owner, nonce) pair may be executed only once.
	#[serde(default = "default_replay_protection")]
	pub replay_protection: bool,
	/// Operations reachable through signature-authorized dispatch.
	/// Fixed when the gate is built.
	#[serde(default = "default_allowed_operations")]
	pub allowed_operations: Vec<OperationKind>,
	/// Number of events buffered for slow subscribers.
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

fn default_dispatch_step_limit() -> u64 {
	DEFAULT_DISPATCH_STEP_LIMIT
}

fn default_replay_protection() -> bool {
	true
}

fn default_allowed_operations() -> Vec<OperationKind> {
	OperationKind::ALL.to_vec()
}

fn default_event_capacity() -> usize {
	DEFAULT_EVENT_CAPACITY
}

/// Configuration for the ledger collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of ledger implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to bound regex work.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};
		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration.
	///
	/// - The gate address must not be the zero address
	/// - The dispatch step limit must be within `1..=MAX_DISPATCH_STEP_LIMIT`
	/// - At least one operation must be allowed, without duplicates
	/// - The event buffer must hold at least one event
	/// - The primary ledger must be among the configured implementations
	fn validate(&self) -> Result<(), ConfigError> {
		if self.gate.address == Address::ZERO {
			return Err(ConfigError::Validation(
				"Gate address cannot be the zero address".into(),
			));
		}

		if self.gate.dispatch_step_limit == 0 {
			return Err(ConfigError::Validation(
				"dispatch_step_limit must be at least 1".into(),
			));
		}
		if self.gate.dispatch_step_limit > MAX_DISPATCH_STEP_LIMIT {
			return Err(ConfigError::Validation(format!(
				"dispatch_step_limit cannot exceed {}",
				MAX_DISPATCH_STEP_LIMIT
			)));
		}

		if self.gate.allowed_operations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one allowed operation must be configured".into(),
			));
		}
		let mut seen = HashSet::new();
		for operation in &self.gate.allowed_operations {
			if !seen.insert(operation) {
				return Err(ConfigError::Validation(format!(
					"Operation '{}' is listed more than once in allowed_operations",
					operation
				)));
			}
		}

		if self.gate.event_capacity == 0 {
			return Err(ConfigError::Validation(
				"event_capacity must be greater than 0".into(),
			));
		}

		if self.ledger.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Ledger primary implementation cannot be empty".into(),
			));
		}
		if !self.ledger.implementations.contains_key(&self.ledger.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary ledger '{}' not found in implementations",
				self.ledger.primary
			)));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
