//! Per-event listener bookkeeping shared by the transports.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Default)]
pub(crate) struct Fanout {
	next_id: u64,
	by_event: HashMap<String, Vec<(u64, mpsc::UnboundedSender<Value>)>>,
}

impl Fanout {
	/// Adds a listener; the flag is true when it is the first for `event`.
	pub fn add(&mut self, event: &str) -> (u64, mpsc::UnboundedReceiver<Value>, bool) {
		let id = self.next_id;
		self.next_id += 1;
		let (tx, rx) = mpsc::unbounded_channel();
		let sinks = self.by_event.entry(event.to_string()).or_default();
		sinks.push((id, tx));
		(id, rx, sinks.len() == 1)
	}

	/// Removes a listener; returns true when `event` has no listeners left.
	pub fn remove(&mut self, event: &str, id: u64) -> bool {
		let Some(sinks) = self.by_event.get_mut(event) else {
			return false;
		};
		let before = sinks.len();
		sinks.retain(|(sink_id, _)| *sink_id != id);
		let removed = sinks.len() != before;
		if sinks.is_empty() {
			self.by_event.remove(event);
		}
		removed && !self.by_event.contains_key(event)
	}

	/// Delivers `payload` to every live listener of `event`, in registration order.
	pub fn deliver(&mut self, event: &str, payload: &Value) -> usize {
		let Some(sinks) = self.by_event.get_mut(event) else {
			return 0;
		};
		sinks.retain(|(_, tx)| tx.send(payload.clone()).is_ok());
		sinks.len()
	}

	pub fn count(&self, event: &str) -> usize {
		self.by_event.get(event).map_or(0, Vec::len)
	}

	/// Drops every sink, ending all listener streams.
	pub fn clear(&mut self) {
		self.by_event.clear();
	}
}
