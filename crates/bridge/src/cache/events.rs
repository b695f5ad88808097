//! Pushes backend event payloads into event cache entries.

use std::sync::{Arc, Weak};

use kaboom_schema::{Schema, SharedSchema};
use tracing::{debug, warn};

use super::slot::{ActivePump, CacheValue, Core, Slot, Source};
use crate::{BridgeError, Transport, TransportError};

/// Starts the pump of an event entry; no-op for command entries or when already running.
pub(crate) fn activate<T: CacheValue>(slot: &Arc<Slot<T>>, core: &mut Core) {
	let Source::Event { event, schema } = &slot.source else {
		return;
	};
	if core.pump.is_some() {
		return;
	}

	core.pump_generation += 1;
	let generation = core.pump_generation;
	let transport = Arc::clone(slot.invoker.transport());
	let task = tokio::spawn(pump(Arc::downgrade(slot), transport, event.clone(), Arc::clone(schema), generation));
	core.pump = Some(ActivePump {
		generation,
		task,
		registration: None,
	});
	debug!(event = %event, generation, "bridge.events.activated");
}

async fn pump<T: CacheValue>(slot: Weak<Slot<T>>, transport: Arc<dyn Transport>, event: String, schema: SharedSchema<T>, generation: u64) {
	let listener = match transport.listen(&event).await {
		Ok(listener) => listener,
		Err(err) => {
			let reason = match err {
				TransportError::ListenerSetup { reason, .. } => reason,
				other => other.to_string(),
			};
			warn!(event = %event, reason = %reason, "bridge.events.listen_failed");
			if let Some(slot) = slot.upgrade() {
				// Lets the next subscriber start a fresh pump.
				{
					let mut core = slot.core.lock();
					if core.pump.as_ref().is_some_and(|active| active.generation == generation) {
						core.pump = None;
					}
				}
				slot.publish_error(BridgeError::ListenerSetup { event, reason });
			}
			return;
		}
	};

	let (registration, mut payloads) = listener.into_parts();
	{
		let Some(slot) = slot.upgrade() else {
			return;
		};
		let mut core = slot.core.lock();
		match core.pump.as_mut() {
			Some(active) if active.generation == generation => active.registration = Some(registration),
			_ => {
				drop(core);
				drop(registration);
				debug!(event = %event, generation, "bridge.events.superseded");
				return;
			}
		}
	}

	while let Some(payload) = payloads.recv().await {
		let Some(slot) = slot.upgrade() else {
			break;
		};
		match schema.parse(&payload) {
			Ok(value) => slot.publish(value),
			Err(source) => {
				warn!(event = %event, path = %source.path, expected = %source.expected, found = %source.found, "bridge.events.malformed_payload");
				slot.publish_error(BridgeError::SchemaValidation {
					context: event.clone(),
					source,
				});
			}
		}
	}
	debug!(event = %event, "bridge.events.stream_closed");
}
