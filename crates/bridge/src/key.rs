//! Cache identities.

use std::fmt;

use serde_json::{Map, Value};

/// A backend command together with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
	name: String,
	args: Value,
}

impl CommandDescriptor {
	/// Command without arguments.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			args: Value::Object(Map::new()),
		}
	}

	/// Command with an argument object.
	pub fn with_args(name: impl Into<String>, args: Value) -> Self {
		Self { name: name.into(), args }
	}

	/// Command name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Argument payload as passed to the backend.
	pub fn args(&self) -> &Value {
		&self.args
	}

	/// Identity of this command in the cache.
	pub fn key(&self) -> CacheKey {
		CacheKey::Command {
			name: self.name.clone(),
			args: canonical_json(&self.args),
		}
	}
}

/// Identity of a cache entry.
///
/// Command keys compare arguments in canonical form, so `{"a":1,"b":2}` and
/// `{"b":2,"a":1}` name the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
	/// Result of a backend command.
	Command {
		/// Command name.
		name: String,
		/// Canonical JSON of the arguments.
		args: String,
	},
	/// Latest payload of a backend event.
	Event(String),
}

impl CacheKey {
	/// Key of the command `name` invoked with `args`.
	pub fn command(name: impl Into<String>, args: &Value) -> Self {
		Self::Command {
			name: name.into(),
			args: canonical_json(args),
		}
	}

	/// Key of the event stream `name`.
	pub fn event(name: impl Into<String>) -> Self {
		Self::Event(name.into())
	}
}

impl From<&CommandDescriptor> for CacheKey {
	fn from(descriptor: &CommandDescriptor) -> Self {
		descriptor.key()
	}
}

impl fmt::Display for CacheKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Command { name, args } => write!(f, "cmd:{name}{args}"),
			Self::Event(name) => write!(f, "event:{name}"),
		}
	}
}

/// Serializes `value` with object members sorted by key at every depth.
pub fn canonical_json(value: &Value) -> String {
	let mut out = String::new();
	write_canonical(value, &mut out);
	out
}

fn write_canonical(value: &Value, out: &mut String) {
	match value {
		Value::Object(members) => {
			let mut sorted: Vec<_> = members.iter().collect();
			sorted.sort_by(|a, b| a.0.cmp(b.0));
			out.push('{');
			for (i, (key, member)) in sorted.into_iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				out.push_str(&Value::String(key.clone()).to_string());
				out.push(':');
				write_canonical(member, out);
			}
			out.push('}');
		}
		Value::Array(items) => {
			out.push('[');
			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}
				write_canonical(item, out);
			}
			out.push(']');
		}
		scalar => out.push_str(&scalar.to_string()),
	}
}
