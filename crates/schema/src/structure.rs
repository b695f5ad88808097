use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde_json::Value;

use crate::{Result, Schema, SchemaValidationError, ValuePath};

/// Homogeneous array whose elements all satisfy `S`.
#[derive(Debug, Clone, Copy)]
pub struct List<S>(S);

/// Object with arbitrary string keys whose values all satisfy `S`.
#[derive(Debug, Clone, Copy)]
pub struct Dict<S>(S);

/// `null` or a value satisfying `S`.
#[derive(Debug, Clone, Copy)]
pub struct Optional<S>(S);

/// Two-element array `[A, B]`.
#[derive(Debug, Clone, Copy)]
pub struct Pair<A, B>(A, B);

/// String literal drawn from a fixed set, each mapped to a typed value.
#[derive(Debug, Clone)]
pub struct OneOf<T> {
	name: &'static str,
	options: Vec<(&'static str, T)>,
}

/// Post-parse conversion of a schema's output.
pub struct Map<S, F, U> {
	inner: S,
	convert: F,
	_out: PhantomData<fn() -> U>,
}

/// Schema for a list of `inner`.
pub fn list<S: Schema>(inner: S) -> List<S> {
	List(inner)
}

/// Schema for a string-keyed dictionary of `inner`.
pub fn dict<S: Schema>(inner: S) -> Dict<S> {
	Dict(inner)
}

/// Schema for an optional `inner`.
pub fn optional<S: Schema>(inner: S) -> Optional<S> {
	Optional(inner)
}

/// Schema for a two-element tuple.
pub fn pair<A: Schema, B: Schema>(first: A, second: B) -> Pair<A, B> {
	Pair(first, second)
}

/// Schema for one of the given string literals.
///
/// `name` labels the literal set in error messages.
pub fn one_of<T: Clone + Send + Sync>(name: &'static str, options: &[(&'static str, T)]) -> OneOf<T> {
	OneOf {
		name,
		options: options.to_vec(),
	}
}

/// Schema that parses with `inner` and then applies a fallible conversion.
///
/// A conversion error is reported at the value's path with the message as
/// the `found` description.
pub fn map<S, F, U>(inner: S, convert: F) -> Map<S, F, U>
where
	S: Schema,
	F: Fn(S::Output) -> std::result::Result<U, String> + Send + Sync,
{
	Map {
		inner,
		convert,
		_out: PhantomData,
	}
}

impl<S: Schema> Schema for List<S> {
	type Output = Vec<S::Output>;

	fn describe(&self) -> String {
		format!("list<{}>", self.0.describe())
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<Self::Output> {
		let Value::Array(items) = value else {
			return Err(SchemaValidationError::mismatch(path, self.describe(), value));
		};
		items
			.iter()
			.enumerate()
			.map(|(i, item)| self.0.parse_at(item, &path.index(i)))
			.collect()
	}
}

impl<S: Schema> Schema for Dict<S> {
	type Output = BTreeMap<String, S::Output>;

	fn describe(&self) -> String {
		format!("dict<{}>", self.0.describe())
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<Self::Output> {
		let Value::Object(members) = value else {
			return Err(SchemaValidationError::mismatch(path, self.describe(), value));
		};
		members
			.iter()
			.map(|(key, item)| Ok((key.clone(), self.0.parse_at(item, &path.field(key))?)))
			.collect()
	}
}

impl<S: Schema> Schema for Optional<S> {
	type Output = Option<S::Output>;

	fn describe(&self) -> String {
		format!("optional<{}>", self.0.describe())
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<Self::Output> {
		match value {
			Value::Null => Ok(None),
			other => self.0.parse_at(other, path).map(Some),
		}
	}
}

impl<A: Schema, B: Schema> Schema for Pair<A, B> {
	type Output = (A::Output, B::Output);

	fn describe(&self) -> String {
		format!("[{}, {}]", self.0.describe(), self.1.describe())
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<Self::Output> {
		match value {
			Value::Array(items) if items.len() == 2 => Ok((self.0.parse_at(&items[0], &path.index(0))?, self.1.parse_at(&items[1], &path.index(1))?)),
			Value::Array(items) => Err(SchemaValidationError::new(path, self.describe(), format!("array of length {}", items.len()))),
			other => Err(SchemaValidationError::mismatch(path, self.describe(), other)),
		}
	}
}

impl<T: Clone + Send + Sync> Schema for OneOf<T> {
	type Output = T;

	fn describe(&self) -> String {
		let names: Vec<&str> = self.options.iter().map(|(name, _)| *name).collect();
		format!("{} ({})", self.name, names.join(" | "))
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<T> {
		let Value::String(s) = value else {
			return Err(SchemaValidationError::mismatch(path, self.describe(), value));
		};
		self.options
			.iter()
			.find(|(name, _)| name == s)
			.map(|(_, out)| out.clone())
			.ok_or_else(|| SchemaValidationError::new(path, self.describe(), format!("string {s:?}")))
	}
}

impl<S, F, U> Schema for Map<S, F, U>
where
	S: Schema,
	F: Fn(S::Output) -> std::result::Result<U, String> + Send + Sync,
{
	type Output = U;

	fn describe(&self) -> String {
		self.inner.describe()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<U> {
		let parsed = self.inner.parse_at(value, path)?;
		(self.convert)(parsed).map_err(|reason| SchemaValidationError::new(path, self.describe(), reason))
	}
}
