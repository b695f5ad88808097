//! Failure taxonomy of the bridge.

use kaboom_schema::SchemaValidationError;

/// Failures raised by a [`crate::Transport`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
	/// The backend ran the command and rejected it.
	#[error("{0}")]
	Backend(String),
	/// The backend is gone; no reply will ever arrive.
	#[error("backend disconnected")]
	Disconnected,
	/// Input/output errors from the underlying channel.
	#[error("{0}")]
	Io(#[from] std::io::Error),
	/// The backend sent something the wire protocol does not allow.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// A listener for `event` could not be registered.
	#[error("cannot listen for `{event}`: {reason}")]
	ListenerSetup {
		/// Event name.
		event: String,
		/// Transport supplied reason.
		reason: String,
	},
}

/// Failures surfaced to callers of the invoker and to cache entries.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
	/// The backend command failed: rejected by the backend or never answered.
	///
	/// Displays as the backend's message alone so it can be shown verbatim.
	#[error("{message}")]
	BackendInvocation {
		/// Command name.
		command: String,
		/// Message from the backend or transport.
		message: String,
	},
	/// The backend answered with data that does not match the expected shape.
	#[error("`{context}` returned malformed data: {source}")]
	SchemaValidation {
		/// Command or event name that produced the value.
		context: String,
		/// Where and how the value diverged.
		#[source]
		source: SchemaValidationError,
	},
	/// The event transport refused to register a listener.
	#[error("cannot listen for `{event}`: {reason}")]
	ListenerSetup {
		/// Event name.
		event: String,
		/// Transport supplied reason.
		reason: String,
	},
	/// Command arguments were not a JSON object.
	#[error("arguments for `{command}` must be an object, found {found}")]
	InvalidArguments {
		/// Command name.
		command: String,
		/// JSON kind that was passed instead.
		found: &'static str,
	},
	/// A cache key was requested with a value type different from the one it holds.
	#[error("cache key {key} is already bound to a different value type")]
	KeyTypeMismatch {
		/// Rendered cache key.
		key: String,
	},
}

impl BridgeError {
	/// Wraps a transport failure of `command`.
	pub fn invocation(command: &str, err: TransportError) -> Self {
		Self::BackendInvocation {
			command: command.to_string(),
			message: err.to_string(),
		}
	}

	/// Returns the schema failure if this is a contract break with the backend.
	pub fn as_schema_error(&self) -> Option<&SchemaValidationError> {
		match self {
			Self::SchemaValidation { source, .. } => Some(source),
			_ => None,
		}
	}
}

/// Result alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
