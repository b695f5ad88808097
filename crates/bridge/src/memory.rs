//! In-process transport.
//!
//! Commands are answered by registered async handlers and events are pushed
//! with [`MemoryTransport::emit`]. Besides embedding a backend in the same
//! process, it records every invocation so callers can assert on traffic.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::fanout::Fanout;
use crate::{Listener, Registration, Transport, TransportError};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>;
type Handler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// Transport backed by in-process command handlers.
pub struct MemoryTransport {
	handlers: Mutex<HashMap<String, Handler>>,
	listeners: Arc<Mutex<Fanout>>,
	listen_failures: Mutex<HashMap<String, String>>,
	invocations: Mutex<Vec<(String, Value)>>,
	listener_changes: Arc<watch::Sender<u64>>,
}

impl MemoryTransport {
	/// Creates a transport with no handlers.
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			handlers: Mutex::new(HashMap::new()),
			listeners: Arc::new(Mutex::new(Fanout::default())),
			listen_failures: Mutex::new(HashMap::new()),
			invocations: Mutex::new(Vec::new()),
			listener_changes: Arc::new(watch::Sender::new(0)),
		})
	}

	/// Registers the async handler for `command`, replacing any previous one.
	///
	/// An `Err` from the handler is delivered as a backend rejection.
	pub fn handle<F, Fut>(&self, command: impl Into<String>, handler: F)
	where
		F: Fn(Value) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Value, String>> + Send + 'static,
	{
		let handler: Handler = Arc::new(move |args| Box::pin(handler(args)));
		self.handlers.lock().insert(command.into(), handler);
	}

	/// Registers a handler that always replies with `value`.
	pub fn reply(&self, command: impl Into<String>, value: Value) {
		self.handle(command, move |_| {
			let value = value.clone();
			async move { Ok(value) }
		});
	}

	/// Registers a handler that always rejects with `message`.
	pub fn reject(&self, command: impl Into<String>, message: impl Into<String>) {
		let message = message.into();
		self.handle(command, move |_| {
			let message = message.clone();
			async move { Err(message) }
		});
	}

	/// Makes every future `listen` for `event` fail with `reason`.
	pub fn fail_listen(&self, event: impl Into<String>, reason: impl Into<String>) {
		self.listen_failures.lock().insert(event.into(), reason.into());
	}

	/// Undoes [`Self::fail_listen`] for `event`.
	pub fn allow_listen(&self, event: &str) {
		self.listen_failures.lock().remove(event);
	}

	/// Pushes `payload` to every listener of `event`; returns how many received it.
	pub fn emit(&self, event: &str, payload: Value) -> usize {
		self.listeners.lock().deliver(event, &payload)
	}

	/// Number of live listeners for `event`.
	pub fn listener_count(&self, event: &str) -> usize {
		self.listeners.lock().count(event)
	}

	/// Waits until `event` has at least one listener.
	pub async fn listening(&self, event: &str) {
		let mut changes = self.listener_changes.subscribe();
		let _ = changes.wait_for(|_| self.listener_count(event) > 0).await;
	}

	/// Number of times `command` was invoked.
	pub fn calls(&self, command: &str) -> usize {
		self.invocations
			.lock()
			.iter()
			.filter(|(name, _)| name == command)
			.count()
	}

	/// Every invocation so far, in call order.
	pub fn invocations(&self) -> Vec<(String, Value)> {
		self.invocations.lock().clone()
	}
}

#[async_trait]
impl Transport for MemoryTransport {
	async fn invoke(&self, command: &str, args: Value) -> Result<Value, TransportError> {
		self.invocations.lock().push((command.to_string(), args.clone()));
		let handler = self.handlers.lock().get(command).cloned();
		let Some(handler) = handler else {
			return Err(TransportError::Backend(format!("unknown command `{command}`")));
		};
		debug!(command, "bridge.memory.invoke");
		handler(args).await.map_err(TransportError::Backend)
	}

	async fn listen(&self, event: &str) -> Result<Listener, TransportError> {
		if let Some(reason) = self.listen_failures.lock().get(event).cloned() {
			return Err(TransportError::ListenerSetup {
				event: event.to_string(),
				reason,
			});
		}

		let (id, rx, _) = self.listeners.lock().add(event);
		self.listener_changes.send_modify(|n| *n += 1);

		let listeners: Weak<Mutex<Fanout>> = Arc::downgrade(&self.listeners);
		let changes = Arc::clone(&self.listener_changes);
		let name = event.to_string();
		let registration = Registration::new(move || {
			if let Some(listeners) = listeners.upgrade() {
				listeners.lock().remove(&name, id);
			}
			changes.send_modify(|n| *n += 1);
		});

		Ok(Listener::new(event, rx, registration))
	}
}
