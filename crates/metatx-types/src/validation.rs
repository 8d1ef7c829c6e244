//! Configuration validation utilities.
//!
//! Implementation-specific configuration sections (for example
//! `[ledger.implementations.memory]`) arrive as raw TOML. Each implementation
//! describes the shape it expects with a [`Schema`] and validates its section
//! before construction.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Represents the type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// A table with arbitrary keys whose values all share one type.
	Map(Box<FieldType>),
}

/// Custom validation run after the type check succeeds.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field with a type and an optional custom validator.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Validation schema made of required and optional fields.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Required fields must be present; optional fields are checked only when
	/// present. Unknown keys are ignored.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(field_name, "string", value));
			}
		},
		FieldType::Map(inner_type) => {
			let table = value
				.as_table()
				.ok_or_else(|| type_mismatch(field_name, "table", value))?;
			for (key, item) in table {
				validate_field_type(&format!("{}.{}", field_name, key), item, inner_type)?;
			}
		},
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_map_field_checks_every_value() {
		let schema = Schema::new(
			vec![],
			vec![Field::new("balances", FieldType::Map(Box::new(FieldType::String)))],
		);

		let ok: toml::Value = toml::from_str(r#"balances = { a = "1", b = "2" }"#).unwrap();
		assert!(schema.validate(&ok).is_ok());

		let bad: toml::Value = toml::from_str(r#"balances = { a = "1", b = 2 }"#).unwrap();
		let err = schema.validate(&bad).unwrap_err();
		assert!(err.to_string().contains("balances.b"));
	}

	#[test]
	fn test_required_field_and_validator() {
		let schema = Schema::new(
			vec![Field::new("name", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some(name) if !name.trim().is_empty() => Ok(()),
					_ => Err("must not be empty".to_string()),
				}
			})],
			vec![],
		);

		let missing: toml::Value = toml::from_str("other = 1").unwrap();
		assert!(matches!(
			schema.validate(&missing),
			Err(ValidationError::MissingField(_))
		));

		let blank: toml::Value = toml::from_str(r#"name = "  ""#).unwrap();
		assert!(matches!(
			schema.validate(&blank),
			Err(ValidationError::InvalidValue { .. })
		));

		let wrong_type: toml::Value = toml::from_str("name = 3").unwrap();
		assert!(matches!(
			schema.validate(&wrong_type),
			Err(ValidationError::TypeMismatch { .. })
		));

		let good: toml::Value = toml::from_str(r#"name = "memory""#).unwrap();
		assert!(schema.validate(&good).is_ok());
	}

	#[test]
	fn test_root_must_be_table() {
		let schema = Schema::new(vec![], vec![]);
		let err = schema
			.validate(&toml::Value::String("flat".into()))
			.unwrap_err();
		assert!(err.to_string().contains("root"));
	}
}
