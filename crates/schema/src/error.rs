use serde_json::Value;

use crate::ValuePath;

/// Result alias for schema parsing.
pub type Result<T> = std::result::Result<T, SchemaValidationError>;

/// A value did not match the shape a schema expects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at {path}: expected {expected}, found {found}")]
pub struct SchemaValidationError {
	/// Location of the offending value inside the parsed document.
	pub path: ValuePath,
	/// Description of the expected shape.
	pub expected: String,
	/// Description of what was actually present.
	pub found: String,
}

impl SchemaValidationError {
	/// Creates an error at `path`.
	pub fn new(path: &ValuePath, expected: impl Into<String>, found: impl Into<String>) -> Self {
		Self {
			path: path.clone(),
			expected: expected.into(),
			found: found.into(),
		}
	}

	/// Creates a type mismatch error, describing `value` by its JSON kind.
	pub fn mismatch(path: &ValuePath, expected: impl Into<String>, value: &Value) -> Self {
		Self::new(path, expected, kind_of(value))
	}

	/// Creates an error for a required field that is absent.
	pub fn missing(path: &ValuePath, expected: impl Into<String>) -> Self {
		Self::new(path, expected, "missing")
	}
}

/// Names the JSON kind of `value` the way errors report it.
pub fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
