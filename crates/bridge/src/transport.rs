//! The seam between the client and the backend process.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::TransportError;

/// Command and event channel to the backend.
///
/// Implementations deliver untyped JSON; validation is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	/// Sends `command` with an object payload and waits for its single reply.
	async fn invoke(&self, command: &str, args: Value) -> Result<Value, TransportError>;

	/// Registers a listener for `event`.
	///
	/// The registration lives as long as the returned [`Listener`] (or its
	/// [`Registration`] half, see [`Listener::into_parts`]).
	async fn listen(&self, event: &str) -> Result<Listener, TransportError>;
}

/// Scoped registration of a backend listener; dropping it deregisters.
pub struct Registration {
	release: Option<Box<dyn FnOnce() + Send>>,
}

impl Registration {
	/// Creates a registration that runs `release` exactly once when dropped.
	pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
		Self {
			release: Some(Box::new(release)),
		}
	}
}

impl fmt::Debug for Registration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registration")
			.field("active", &self.release.is_some())
			.finish()
	}
}

impl Drop for Registration {
	fn drop(&mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}
}

/// Stream of raw payloads for one event name.
#[derive(Debug)]
pub struct Listener {
	event: String,
	payloads: mpsc::UnboundedReceiver<Value>,
	registration: Registration,
}

impl Listener {
	/// Creates a listener from a payload receiver and its registration guard.
	pub fn new(event: impl Into<String>, payloads: mpsc::UnboundedReceiver<Value>, registration: Registration) -> Self {
		Self {
			event: event.into(),
			payloads,
			registration,
		}
	}

	/// Event name this listener is registered for.
	pub fn event(&self) -> &str {
		&self.event
	}

	/// Next payload in delivery order; `None` once the transport closed the stream.
	pub async fn recv(&mut self) -> Option<Value> {
		self.payloads.recv().await
	}

	/// Splits into the registration guard and the payload receiver.
	pub fn into_parts(self) -> (Registration, mpsc::UnboundedReceiver<Value>) {
		(self.registration, self.payloads)
	}
}
