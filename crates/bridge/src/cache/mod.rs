//! Shared, keyed cache of backend data.
//!
//! Each [`CacheKey`] maps to one entry shared by every [`Subscription`] to
//! it. Command entries are filled by invoking the command; concurrent
//! revalidations of one key share a single backend call, and an entry
//! fetched less than [`CacheConfig::dedupe_interval`] ago is served without
//! a call. Event entries are filled by the backend's event stream, with the
//! listener registered while at least one subscription exists.
//!
//! Every local write bumps the entry's epoch. A fetch that started under an
//! older epoch is detached and its result discarded, so a completed
//! [`Subscription::mutate`] is never overwritten by an earlier read.

mod events;
mod slot;
mod subscription;

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use kaboom_schema::{Schema, shared};
use parking_lot::Mutex;
use tracing::debug;

pub use self::slot::CacheValue;
use self::slot::{ErasedSlot, Slot, Source};
pub use self::subscription::Subscription;
use crate::{BridgeError, CacheKey, CommandDescriptor, Invoker, Result};

/// Snapshot of one cache entry.
#[derive(Debug, Clone)]
pub struct EntryState<T> {
	/// Latest good value; kept when a later revalidation fails.
	pub data: Option<T>,
	/// Failure of the latest revalidation or event.
	pub error: Option<Arc<BridgeError>>,
	/// A backend fetch is running.
	pub loading: bool,
}

impl<T> Default for EntryState<T> {
	fn default() -> Self {
		Self {
			data: None,
			error: None,
			loading: false,
		}
	}
}

/// Cache tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
	/// A successful fetch younger than this satisfies new subscribers without a call.
	pub dedupe_interval: Duration,
	/// How long an entry outlives its last subscription. Zero evicts immediately.
	pub keep_alive: Duration,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			dedupe_interval: Duration::from_secs(2),
			keep_alive: Duration::ZERO,
		}
	}
}

struct SlotRef {
	any: Arc<dyn Any + Send + Sync>,
	erased: Arc<dyn ErasedSlot>,
}

pub(crate) struct CacheInner {
	invoker: Invoker,
	config: CacheConfig,
	entries: Mutex<HashMap<CacheKey, SlotRef>>,
}

/// Keyed cache of command results and event payloads.
///
/// Cloning is cheap; clones share entries.
#[derive(Clone)]
pub struct Cache {
	inner: Arc<CacheInner>,
}

impl Cache {
	/// Creates a cache with the default configuration.
	pub fn new(invoker: Invoker) -> Self {
		Self::with_config(invoker, CacheConfig::default())
	}

	/// Creates a cache with `config`.
	pub fn with_config(invoker: Invoker, config: CacheConfig) -> Self {
		Self {
			inner: Arc::new(CacheInner {
				invoker,
				config,
				entries: Mutex::new(HashMap::new()),
			}),
		}
	}

	/// Invoker used for command entries.
	pub fn invoker(&self) -> &Invoker {
		&self.inner.invoker
	}

	/// Active configuration.
	pub fn config(&self) -> &CacheConfig {
		&self.inner.config
	}

	/// Subscribes to the result of `descriptor`, parsed with `schema`.
	///
	/// Starts a fetch when the entry is new, failed or older than the dedupe
	/// interval, unless one is already running. Must be called inside a Tokio
	/// runtime.
	pub fn subscribe<T, S>(&self, descriptor: CommandDescriptor, schema: S) -> Result<Subscription<T>>
	where
		T: CacheValue,
		S: Schema<Output = T> + 'static,
	{
		let key = descriptor.key();
		self.inner.acquire(key, move || Source::Command {
			descriptor,
			schema: shared(schema),
		})
	}

	/// Subscribes to the latest payload of `event`, parsed with `schema`.
	///
	/// The first subscription registers a backend listener, the last one to
	/// drop deregisters it. No command is ever invoked for event entries.
	/// Must be called inside a Tokio runtime.
	pub fn subscribe_event<T, S>(&self, event: &str, schema: S) -> Result<Subscription<T>>
	where
		T: CacheValue,
		S: Schema<Output = T> + 'static,
	{
		let event = event.to_string();
		self.inner.acquire(CacheKey::event(event.clone()), move || Source::Event {
			event,
			schema: shared(schema),
		})
	}

	/// Writes `value` into the entry at `key`, if anyone subscribes to it.
	///
	/// Returns whether an entry was written.
	pub async fn mutate_key<T: CacheValue>(&self, key: &CacheKey, value: T) -> Result<bool> {
		let Some(slot) = self.inner.lookup::<T>(key)? else {
			return Ok(false);
		};
		slot.write(value);
		Ok(true)
	}

	/// Refetches the entry at `key`, if anyone subscribes to it.
	///
	/// Returns whether an entry was revalidated.
	pub async fn revalidate_key(&self, key: &CacheKey) -> bool {
		let erased = self.inner.entries.lock().get(key).map(|entry| Arc::clone(&entry.erased));
		match erased {
			Some(slot) => {
				slot.revalidate_erased().await;
				true
			}
			None => {
				debug!(key = %key, "bridge.cache.revalidate_without_entry");
				false
			}
		}
	}

	/// Refetches the entry at `key` after a backend write, if anyone
	/// subscribes to it. A fetch already running is detached, not joined.
	///
	/// Returns whether an entry was refreshed.
	pub async fn refresh_key(&self, key: &CacheKey) -> bool {
		let erased = self.inner.entries.lock().get(key).map(|entry| Arc::clone(&entry.erased));
		match erased {
			Some(slot) => {
				slot.refresh_erased().await;
				true
			}
			None => {
				debug!(key = %key, "bridge.cache.refresh_without_entry");
				false
			}
		}
	}

	/// Whether an entry exists for `key`.
	pub fn contains(&self, key: &CacheKey) -> bool {
		self.inner.entries.lock().contains_key(key)
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		self.inner.entries.lock().len()
	}

	/// True when no entry is live.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl CacheInner {
	// Lock order: `entries` before any slot's `core`.

	fn acquire<T: CacheValue>(self: &Arc<Self>, key: CacheKey, source: impl FnOnce() -> Source<T>) -> Result<Subscription<T>> {
		let slot = {
			let mut entries = self.entries.lock();
			let slot = match entries.get(&key) {
				Some(entry) => downcast::<T>(&key, entry)?,
				None => {
					let slot = Arc::new(Slot::new(key.clone(), source(), self.invoker.clone(), self.config.dedupe_interval));
					entries.insert(
						key,
						SlotRef {
							any: Arc::clone(&slot) as Arc<dyn Any + Send + Sync>,
							erased: Arc::clone(&slot) as Arc<dyn ErasedSlot>,
						},
					);
					slot
				}
			};

			let mut core = slot.core.lock();
			core.subscribers += 1;
			if slot.is_event() {
				events::activate(&slot, &mut core);
			} else {
				slot.ensure_fresh(&mut core);
			}
			drop(core);
			slot
		};
		Ok(Subscription::new(Arc::clone(self), slot))
	}

	fn lookup<T: CacheValue>(&self, key: &CacheKey) -> Result<Option<Arc<Slot<T>>>> {
		let entries = self.entries.lock();
		entries.get(key).map(|entry| downcast::<T>(key, entry)).transpose()
	}

	pub(crate) fn release<T: CacheValue>(self: &Arc<Self>, slot: &Arc<Slot<T>>) {
		let mut entries = self.entries.lock();
		let mut core = slot.core.lock();
		core.subscribers = core.subscribers.saturating_sub(1);
		if core.subscribers > 0 {
			return;
		}
		slot.deactivate(&mut core);
		drop(core);

		let keep_alive = self.config.keep_alive;
		if keep_alive.is_zero() {
			evict(&mut entries, slot);
			return;
		}
		drop(entries);

		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			evict(&mut self.entries.lock(), slot);
			return;
		};
		let cache: Weak<Self> = Arc::downgrade(self);
		let idle: Weak<Slot<T>> = Arc::downgrade(slot);
		runtime.spawn(async move {
			tokio::time::sleep(keep_alive).await;
			let (Some(cache), Some(slot)) = (cache.upgrade(), idle.upgrade()) else {
				return;
			};
			let mut entries = cache.entries.lock();
			if slot.core.lock().subscribers == 0 {
				evict(&mut entries, &slot);
			}
		});
	}
}

fn downcast<T: CacheValue>(key: &CacheKey, entry: &SlotRef) -> Result<Arc<Slot<T>>> {
	Arc::clone(&entry.any)
		.downcast::<Slot<T>>()
		.map_err(|_| BridgeError::KeyTypeMismatch { key: key.to_string() })
}

/// Removes `slot` from `entries` unless the key was already rebound to a newer entry.
fn evict<T: CacheValue>(entries: &mut HashMap<CacheKey, SlotRef>, slot: &Arc<Slot<T>>) {
	let same = entries
		.get(&slot.key)
		.is_some_and(|entry| std::ptr::addr_eq(Arc::as_ptr(&entry.any), Arc::as_ptr(slot)));
	if same {
		entries.remove(&slot.key);
		debug!(key = %slot.key, "bridge.cache.evicted");
	}
}
