//! Structural schemas for untyped backend data.
//!
//! Every value that crosses the bridge from the backend (command replies and
//! event payloads) arrives as an untyped [`serde_json::Value`]. A [`Schema`]
//! turns such a value into a typed output or rejects it with a
//! [`SchemaValidationError`] naming the offending path:
//!
//! * primitives: [`string`], [`boolean`], [`integer`], [`unsigned`], [`number`], [`unit`], [`any`]
//! * containers: [`list`], [`dict`], [`optional`], [`pair`]
//! * literals: [`one_of`]
//! * shapes: [`record`] for objects, [`tagged`] for externally tagged unions
//! * conversions: [`map`]
//!
//! Schemas never coerce. A string holding digits is not an integer, `1.5` is
//! not an integer, and `null` only satisfies [`unit`], [`optional`] and [`any`].
//!
//! ```ignore
//! use kaboom_schema::{Schema, list, string};
//!
//! let names = list(string()).parse(&serde_json::json!(["alpha", "beta"]))?;
//! assert_eq!(names, vec!["alpha".to_string(), "beta".to_string()]);
//! ```

#![warn(missing_docs)]

mod error;
mod path;
mod primitive;
mod record;
mod structure;
mod tagged;

use std::sync::Arc;

pub use error::{Result, SchemaValidationError, kind_of};
pub use path::{Segment, ValuePath};
pub use primitive::{AnyValue, Bool, Int, Number, Str, UInt, Unit, any, boolean, integer, number, string, unit, unsigned};
pub use record::{Fields, Record, record};
pub use structure::{Dict, List, Map, OneOf, Optional, Pair, dict, list, map, one_of, optional, pair};
pub use tagged::{Tagged, Variant, tagged};
use serde_json::Value;

/// A pure validator from untyped JSON into a typed value.
///
/// Implementations must not have side effects; two schemas with the same
/// structure accept exactly the same values.
pub trait Schema: Send + Sync {
	/// The typed value produced by a successful parse.
	type Output;

	/// Short human readable description of the accepted shape, used in errors.
	fn describe(&self) -> String;

	/// Parses `value`, reporting failures relative to `path`.
	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<Self::Output>;

	/// Parses `value` from the document root.
	fn parse(&self, value: &Value) -> Result<Self::Output> {
		self.parse_at(value, &ValuePath::root())
	}
}

impl<S: Schema + ?Sized> Schema for &S {
	type Output = S::Output;

	fn describe(&self) -> String {
		(**self).describe()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<Self::Output> {
		(**self).parse_at(value, path)
	}
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
	type Output = S::Output;

	fn describe(&self) -> String {
		(**self).describe()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<Self::Output> {
		(**self).parse_at(value, path)
	}
}

impl<S: Schema + ?Sized> Schema for Box<S> {
	type Output = S::Output;

	fn describe(&self) -> String {
		(**self).describe()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<Self::Output> {
		(**self).parse_at(value, path)
	}
}

/// Shared, type-erased schema handle.
pub type SharedSchema<T> = Arc<dyn Schema<Output = T>>;

/// Erases a schema into a [`SharedSchema`].
pub fn shared<S>(schema: S) -> SharedSchema<S::Output>
where
	S: Schema + 'static,
{
	Arc::new(schema)
}

#[cfg(test)]
mod tests;
