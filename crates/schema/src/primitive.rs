use serde_json::Value;

use crate::{Result, Schema, SchemaValidationError, ValuePath};

/// Accepts JSON strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

/// Accepts JSON booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

/// Accepts integral JSON numbers that fit in `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int;

/// Accepts integral JSON numbers that fit in `u64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UInt;

/// Accepts any JSON number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Number;

/// Accepts only `null`; the shape of commands that return nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unit;

/// Accepts every value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyValue;

/// Schema for a string.
pub const fn string() -> Str {
	Str
}

/// Schema for a boolean.
pub const fn boolean() -> Bool {
	Bool
}

/// Schema for a signed integer.
pub const fn integer() -> Int {
	Int
}

/// Schema for an unsigned integer.
pub const fn unsigned() -> UInt {
	UInt
}

/// Schema for any number.
pub const fn number() -> Number {
	Number
}

/// Schema for `null`.
pub const fn unit() -> Unit {
	Unit
}

/// Schema accepting any value.
pub const fn any() -> AnyValue {
	AnyValue
}

impl Schema for Str {
	type Output = String;

	fn describe(&self) -> String {
		"string".into()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<String> {
		match value {
			Value::String(s) => Ok(s.clone()),
			other => Err(SchemaValidationError::mismatch(path, self.describe(), other)),
		}
	}
}

impl Schema for Bool {
	type Output = bool;

	fn describe(&self) -> String {
		"bool".into()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<bool> {
		value
			.as_bool()
			.ok_or_else(|| SchemaValidationError::mismatch(path, self.describe(), value))
	}
}

impl Schema for Int {
	type Output = i64;

	fn describe(&self) -> String {
		"integer".into()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<i64> {
		match value {
			Value::Number(n) if n.is_u64() && n.as_i64().is_none() => Err(SchemaValidationError::new(path, self.describe(), "integer out of range")),
			Value::Number(n) => n
				.as_i64()
				.ok_or_else(|| SchemaValidationError::mismatch(path, self.describe(), value)),
			other => Err(SchemaValidationError::mismatch(path, self.describe(), other)),
		}
	}
}

impl Schema for UInt {
	type Output = u64;

	fn describe(&self) -> String {
		"unsigned integer".into()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<u64> {
		match value {
			Value::Number(n) if n.is_i64() && n.as_u64().is_none() => Err(SchemaValidationError::new(path, self.describe(), "negative integer")),
			Value::Number(n) => n
				.as_u64()
				.ok_or_else(|| SchemaValidationError::mismatch(path, self.describe(), value)),
			other => Err(SchemaValidationError::mismatch(path, self.describe(), other)),
		}
	}
}

impl Schema for Number {
	type Output = f64;

	fn describe(&self) -> String {
		"number".into()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<f64> {
		value
			.as_f64()
			.ok_or_else(|| SchemaValidationError::mismatch(path, self.describe(), value))
	}
}

impl Schema for Unit {
	type Output = ();

	fn describe(&self) -> String {
		"null".into()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<()> {
		match value {
			Value::Null => Ok(()),
			other => Err(SchemaValidationError::mismatch(path, self.describe(), other)),
		}
	}
}

impl Schema for AnyValue {
	type Output = Value;

	fn describe(&self) -> String {
		"any".into()
	}

	fn parse_at(&self, value: &Value, _path: &ValuePath) -> Result<Value> {
		Ok(value.clone())
	}
}
