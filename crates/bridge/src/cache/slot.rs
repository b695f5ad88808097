//! One shared cache entry and its revalidation state machine.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kaboom_schema::SharedSchema;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::EntryState;
use crate::{BridgeError, CacheKey, CommandDescriptor, Invoker, Registration, Result};

/// Values a cache entry can hold.
pub trait CacheValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> CacheValue for T {}

pub(crate) enum Source<T> {
	Command {
		descriptor: CommandDescriptor,
		schema: SharedSchema<T>,
	},
	Event {
		event: String,
		schema: SharedSchema<T>,
	},
}

pub(crate) struct InFlight {
	id: u64,
	epoch: u64,
	done: watch::Receiver<bool>,
}

pub(crate) struct ActivePump {
	pub generation: u64,
	pub task: JoinHandle<()>,
	pub registration: Option<Registration>,
}

#[derive(Default)]
pub(crate) struct Core {
	/// Bumped by every local write; fetches started under an older epoch are discarded.
	pub epoch: u64,
	pub inflight: Option<InFlight>,
	pub next_flight: u64,
	/// Set by a successful fetch or write, cleared by failures so the next subscriber refetches.
	pub fetched_at: Option<Instant>,
	pub subscribers: usize,
	pub pump: Option<ActivePump>,
	pub pump_generation: u64,
}

pub(crate) struct Slot<T> {
	pub key: CacheKey,
	pub source: Source<T>,
	pub state: watch::Sender<EntryState<T>>,
	pub core: Mutex<Core>,
	pub invoker: Invoker,
	dedupe_interval: Duration,
}

impl<T: CacheValue> Slot<T> {
	pub fn new(key: CacheKey, source: Source<T>, invoker: Invoker, dedupe_interval: Duration) -> Self {
		Self {
			key,
			source,
			state: watch::Sender::new(EntryState::default()),
			core: Mutex::new(Core::default()),
			invoker,
			dedupe_interval,
		}
	}

	pub fn is_event(&self) -> bool {
		matches!(self.source, Source::Event { .. })
	}

	pub fn snapshot(&self) -> EntryState<T> {
		self.state.borrow().clone()
	}

	/// Starts a fetch unless one is running or the entry is still fresh.
	pub fn ensure_fresh(self: &Arc<Self>, core: &mut Core) {
		if self.is_event() || core.inflight.is_some() {
			return;
		}
		let fresh = core.fetched_at.is_some_and(|at| at.elapsed() < self.dedupe_interval);
		if fresh {
			debug!(key = %self.key, "bridge.cache.deduped");
			return;
		}
		self.begin_flight(core);
	}

	/// Joins the running fetch or starts a new one, then waits for it.
	pub async fn revalidate(self: &Arc<Self>) -> EntryState<T> {
		if !self.is_event() {
			let mut done = {
				let mut core = self.core.lock();
				match &core.inflight {
					Some(flight) => flight.done.clone(),
					None => self.begin_flight(&mut core),
				}
			};
			let _ = done.wait_for(|finished| *finished).await;
		}
		self.snapshot()
	}

	/// Detaches any running fetch, starts a new one and waits for it.
	///
	/// Used after a backend write: a fetch that began before the write may
	/// hold pre-write data, so it must not be joined.
	pub async fn refresh(self: &Arc<Self>) -> EntryState<T> {
		if !self.is_event() {
			let mut done = {
				let mut core = self.core.lock();
				self.detach(&mut core);
				self.begin_flight(&mut core)
			};
			let _ = done.wait_for(|finished| *finished).await;
		}
		self.snapshot()
	}

	fn begin_flight(self: &Arc<Self>, core: &mut Core) -> watch::Receiver<bool> {
		let id = core.next_flight;
		core.next_flight += 1;
		let (done_tx, done_rx) = watch::channel(false);
		core.inflight = Some(InFlight {
			id,
			epoch: core.epoch,
			done: done_rx.clone(),
		});
		self.state.send_modify(|state| state.loading = true);
		debug!(key = %self.key, flight = id, epoch = core.epoch, "bridge.cache.fetch_start");

		let Source::Command { descriptor, schema } = &self.source else {
			return done_rx;
		};
		let descriptor = descriptor.clone();
		let schema = Arc::clone(schema);
		let invoker = self.invoker.clone();
		let key = self.key.clone();
		let slot = Arc::downgrade(self);

		tokio::spawn(async move {
			let result = invoker.call(&descriptor, &schema).await;
			match slot.upgrade() {
				Some(slot) => slot.complete(id, result),
				None => debug!(key = %key, "bridge.cache.fetch_for_evicted_entry"),
			}
			let _ = done_tx.send(true);
		});

		done_rx
	}

	fn complete(&self, flight: u64, result: Result<T>) {
		let mut core = self.core.lock();
		let current = core
			.inflight
			.as_ref()
			.is_some_and(|running| running.id == flight && running.epoch == core.epoch);
		if !current {
			debug!(key = %self.key, flight, "bridge.cache.stale_fetch_discarded");
			return;
		}
		core.inflight = None;

		match result {
			Ok(value) => {
				core.fetched_at = Some(Instant::now());
				self.state.send_modify(|state| {
					state.data = Some(value);
					state.error = None;
					state.loading = false;
				});
			}
			Err(err) => {
				debug!(key = %self.key, error = %err, "bridge.cache.fetch_failed");
				core.fetched_at = None;
				self.publish_error(err);
			}
		}
	}

	/// Replaces the data and detaches any running fetch.
	pub fn write(&self, value: T) {
		let mut core = self.core.lock();
		self.detach(&mut core);
		core.fetched_at = Some(Instant::now());
		self.state.send_modify(|state| {
			state.data = Some(value);
			state.error = None;
			state.loading = false;
		});
	}

	/// Drops data and error; the next subscriber refetches.
	pub fn clear(&self) {
		let mut core = self.core.lock();
		self.detach(&mut core);
		core.fetched_at = None;
		self.state.send_replace(EntryState::default());
	}

	fn detach(&self, core: &mut Core) {
		core.epoch += 1;
		if let Some(flight) = core.inflight.take() {
			debug!(key = %self.key, flight = flight.id, "bridge.cache.fetch_detached");
		}
	}

	/// Publishes an event payload as the new value.
	pub fn publish(&self, value: T) {
		self.state.send_modify(|state| {
			state.data = Some(value);
			state.error = None;
			state.loading = false;
		});
	}

	/// Attaches `err` to the entry, keeping whatever data it holds.
	pub fn publish_error(&self, err: BridgeError) {
		let err = Arc::new(err);
		self.state.send_modify(|state| {
			state.error = Some(err);
			state.loading = false;
		});
	}

	/// Stops the event pump and drops its listener registration.
	pub fn deactivate(&self, core: &mut Core) {
		if let Some(pump) = core.pump.take() {
			pump.task.abort();
			drop(pump.registration);
			debug!(key = %self.key, generation = pump.generation, "bridge.events.deactivated");
		}
	}
}

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Type-erased view of a slot for operations that do not know `T`.
pub(crate) trait ErasedSlot: Send + Sync {
	fn revalidate_erased(self: Arc<Self>) -> BoxFuture;
	fn refresh_erased(self: Arc<Self>) -> BoxFuture;
}

impl<T: CacheValue> ErasedSlot for Slot<T> {
	fn revalidate_erased(self: Arc<Self>) -> BoxFuture {
		Box::pin(async move {
			self.revalidate().await;
		})
	}

	fn refresh_erased(self: Arc<Self>) -> BoxFuture {
		Box::pin(async move {
			self.refresh().await;
		})
	}
}
