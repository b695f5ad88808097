//! Typed command invocation.

use std::fmt;
use std::sync::Arc;

use kaboom_schema::{Schema, kind_of, unit};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{BridgeError, CommandDescriptor, Result, Transport};

/// Invokes backend commands and validates their replies.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct Invoker {
	transport: Arc<dyn Transport>,
}

impl fmt::Debug for Invoker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Invoker").finish_non_exhaustive()
	}
}

impl Invoker {
	/// Creates an invoker over `transport`.
	pub fn new(transport: Arc<dyn Transport>) -> Self {
		Self { transport }
	}

	/// The underlying transport.
	pub fn transport(&self) -> &Arc<dyn Transport> {
		&self.transport
	}

	/// Sends `command` with `args` and parses the reply with `schema`.
	///
	/// `args` must be a JSON object; `null` is sent as `{}`. A backend
	/// rejection surfaces as [`BridgeError::BackendInvocation`] carrying the
	/// backend's message, a reply of the wrong shape as
	/// [`BridgeError::SchemaValidation`]. No result is produced in either case.
	pub async fn invoke<S: Schema>(&self, command: &str, schema: &S, args: Value) -> Result<S::Output> {
		let args = match args {
			Value::Null => Value::Object(Map::new()),
			Value::Object(members) => Value::Object(members),
			other => {
				return Err(BridgeError::InvalidArguments {
					command: command.to_string(),
					found: kind_of(&other),
				});
			}
		};

		let reply = self
			.transport
			.invoke(command, args)
			.await
			.map_err(|err| {
				debug!(command, error = %err, "bridge.invoke.failed");
				BridgeError::invocation(command, err)
			})?;

		schema.parse(&reply).map_err(|source| {
			warn!(command, path = %source.path, expected = %source.expected, found = %source.found, "bridge.invoke.malformed_reply");
			BridgeError::SchemaValidation {
				context: command.to_string(),
				source,
			}
		})
	}

	/// Invokes the command named by `descriptor`.
	pub async fn call<S: Schema>(&self, descriptor: &CommandDescriptor, schema: &S) -> Result<S::Output> {
		self.invoke(descriptor.name(), schema, descriptor.args().clone()).await
	}

	/// Invokes a command whose reply carries no data.
	pub async fn invoke_unit(&self, command: &str, args: Value) -> Result<()> {
		self.invoke(command, &unit(), args).await
	}
}
