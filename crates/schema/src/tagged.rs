use std::marker::PhantomData;

use serde_json::Value;

use crate::{Fields, Result, Schema, SchemaValidationError, ValuePath};

/// The selected variant of a tagged union, handed to the union's builder.
pub struct Variant<'a> {
	tag: &'a str,
	content: Option<&'a Value>,
	path: ValuePath,
}

impl<'a> Variant<'a> {
	/// The variant tag.
	pub fn tag(&self) -> &str {
		self.tag
	}

	/// Path of the variant content.
	pub fn path(&self) -> &ValuePath {
		&self.path
	}

	/// Accepts a variant without payload: a bare tag string, or a `null` payload.
	pub fn unit(&self) -> Result<()> {
		match self.content {
			None | Some(Value::Null) => Ok(()),
			Some(other) => Err(SchemaValidationError::mismatch(&self.path, format!("{} without payload", self.tag), other)),
		}
	}

	/// Parses a struct-like payload through [`Fields`].
	pub fn fields<T>(&self, build: impl FnOnce(&Fields<'_>) -> Result<T>) -> Result<T> {
		match self.content {
			Some(Value::Object(members)) => build(&Fields::new(members, &self.path)),
			Some(other) => Err(SchemaValidationError::mismatch(&self.path, format!("{} (object)", self.tag), other)),
			None => Err(SchemaValidationError::missing(&self.path, format!("{} (object)", self.tag))),
		}
	}

	/// Parses a newtype-like payload with `schema`.
	pub fn content<S: Schema>(&self, schema: &S) -> Result<S::Output> {
		match self.content {
			Some(value) => schema.parse_at(value, &self.path),
			None => Err(SchemaValidationError::missing(&self.path, schema.describe())),
		}
	}

	/// Error for a tag the builder does not handle.
	pub fn unknown(&self) -> SchemaValidationError {
		SchemaValidationError::new(&self.path, "known variant", format!("tag {:?}", self.tag))
	}
}

/// Externally tagged union, matching serde's default enum representation.
///
/// Unit variants appear as a bare string (`"Null"`); variants with data
/// appear as an object with exactly one member named after the tag
/// (`{"Plosive": {...}}`).
pub struct Tagged<F, T> {
	name: &'static str,
	variants: &'static [&'static str],
	build: F,
	_out: PhantomData<fn() -> T>,
}

/// Schema for a tagged union named `name` with the listed variant tags.
///
/// Tags outside `variants` are rejected before `build` runs.
pub fn tagged<F, T>(name: &'static str, variants: &'static [&'static str], build: F) -> Tagged<F, T>
where
	F: Fn(Variant<'_>) -> Result<T> + Send + Sync,
{
	Tagged {
		name,
		variants,
		build,
		_out: PhantomData,
	}
}

impl<F, T> Schema for Tagged<F, T>
where
	F: Fn(Variant<'_>) -> Result<T> + Send + Sync,
{
	type Output = T;

	fn describe(&self) -> String {
		format!("{} ({})", self.name, self.variants.join(" | "))
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> Result<T> {
		let (tag, content) = match value {
			Value::String(tag) => (tag.as_str(), None),
			Value::Object(members) if members.len() == 1 => {
				let Some((tag, content)) = members.iter().next() else {
					return Err(SchemaValidationError::mismatch(path, self.describe(), value));
				};
				(tag.as_str(), Some(content))
			}
			Value::Object(members) => {
				return Err(SchemaValidationError::new(path, self.describe(), format!("object with {} members", members.len())));
			}
			other => return Err(SchemaValidationError::mismatch(path, self.describe(), other)),
		};

		if !self.variants.contains(&tag) {
			return Err(SchemaValidationError::new(path, self.describe(), format!("tag {tag:?}")));
		}

		let content_path = if content.is_some() { path.field(tag) } else { path.clone() };
		(self.build)(Variant {
			tag,
			content,
			path: content_path,
		})
	}
}
