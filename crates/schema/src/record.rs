use std::marker::PhantomData;

use serde_json::{Map as JsonMap, Value};

use crate::{Result, Schema, SchemaValidationError, ValuePath};

/// Read access to the members of an object being parsed by a [`Record`].
///
/// Unknown members are ignored; only the fields a record asks for are checked.
pub struct Fields<'a> {
	members: &'a JsonMap<String, Value>,
	path: &'a ValuePath,
}

impl<'a> Fields<'a> {
	/// Wraps an object's members located at `path`.
	pub fn new(members: &'a JsonMap<String, Value>, path: &'a ValuePath) -> Self {
		Self { members, path }
	}

	/// Path of the object itself.
	pub fn path(&self) -> &ValuePath {
		self.path
	}

	/// Parses a field that must be present.
	///
	/// An explicit `null` is handed to `schema`, so `optional(..)` schemas may
	/// still accept it.
	pub fn required<S: Schema>(&self, name: &str, schema: &S) -> Result<S::Output> {
		let path = self.path.field(name);
		match self.members.get(name) {
			Some(value) => schema.parse_at(value, &path),
			None => Err(SchemaValidationError::missing(&path, schema.describe())),
		}
	}

	/// Parses a field that may be absent or `null`.
	pub fn optional<S: Schema>(&self, name: &str, schema: &S) -> Result<Option<S::Output>> {
		match self.members.get(name) {
			None | Some(Value::Null) => Ok(None),
			Some(value) => schema.parse_at(value, &self.path.field(name)).map(Some),
		}
	}

	/// Parses a field that falls back to `Default` when absent or `null`.
	pub fn or_default<S>(&self, name: &str, schema: &S) -> Result<S::Output>
	where
		S: Schema,
		S::Output: Default,
	{
		Ok(self.optional(name, schema)?.unwrap_or_default())
	}
}

/// Object schema assembled by a closure over [`Fields`].
pub struct Record<F, T> {
	name: &'static str,
	build: F,
	_out: PhantomData<fn() -> T>,
}

/// Schema for a JSON object named `name`, built field by field.
///
/// ```ignore
/// let schema = record("Autosave", |f| {
///     Ok(Autosave {
///         name: f.required("name", &string())?,
///         timestamp: f.required("timestamp", &string())?,
///     })
/// });
/// ```
pub fn record<F, T>(name: &'static str, build: F) -> Record<F, T>
where
	F: Fn(&Fields<'_>) -> Result<T> + Send + Sync,
{
	Record {
		name,
		build,
		_out: PhantomData,
	}
}

impl<F, T> Schema for Record<F, T>
where
	F: Fn(&Fields<'_>) -> Result<T> + Send + Sync,
{
	type Output = T;

	fn describe(&self) -> String {
		self.name.to_string()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<T> {
		let Value::Object(members) = value else {
			return Err(SchemaValidationError::mismatch(path, format!("{} (object)", self.name), value));
		};
		(self.build)(&Fields::new(members, path))
	}
}
