use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use super::slot::{CacheValue, Slot};
use super::{CacheInner, EntryState};
use crate::{BridgeError, CacheKey};

/// Live read handle on one cache entry.
///
/// Every subscription to the same key observes the same state. Dropping the
/// last subscription releases the entry (and the backend listener of an event
/// entry).
pub struct Subscription<T: CacheValue> {
	cache: Arc<CacheInner>,
	slot: Arc<Slot<T>>,
	state: watch::Receiver<EntryState<T>>,
}

impl<T: CacheValue> Subscription<T> {
	pub(crate) fn new(cache: Arc<CacheInner>, slot: Arc<Slot<T>>) -> Self {
		let state = slot.state.subscribe();
		Self { cache, slot, state }
	}

	/// Key of the shared entry.
	pub fn key(&self) -> &CacheKey {
		&self.slot.key
	}

	/// Current entry state.
	pub fn state(&self) -> EntryState<T> {
		self.state.borrow().clone()
	}

	/// Current data, possibly stale.
	pub fn data(&self) -> Option<T> {
		self.state.borrow().data.clone()
	}

	/// Error of the latest revalidation or event, if it failed.
	pub fn error(&self) -> Option<Arc<BridgeError>> {
		self.state.borrow().error.clone()
	}

	/// True while a backend fetch for this entry is running.
	pub fn is_loading(&self) -> bool {
		self.state.borrow().loading
	}

	/// Waits for the next state change and returns the new state.
	pub async fn changed(&mut self) -> EntryState<T> {
		// The sender lives in the slot this handle keeps alive.
		let _ = self.state.changed().await;
		self.state.borrow_and_update().clone()
	}

	/// Waits until no fetch is running and returns the state at that point.
	pub async fn settled(&self) -> EntryState<T> {
		let mut state = self.state.clone();
		let settled = match state.wait_for(|state| !state.loading).await {
			Ok(current) => current.clone(),
			Err(_) => self.state(),
		};
		settled
	}

	/// Refetches the entry, sharing a fetch that is already running.
	///
	/// Event entries are never fetched; their current state is returned as is.
	pub async fn revalidate(&self) -> EntryState<T> {
		self.slot.revalidate().await
	}

	/// Refetches the entry after a backend write.
	///
	/// Unlike [`Self::revalidate`] this never joins a fetch that is already
	/// running; that fetch is detached and its result discarded.
	pub async fn refresh(&self) -> EntryState<T> {
		self.slot.refresh().await
	}

	/// Replaces the entry's data for every subscriber.
	///
	/// A fetch still running when this is called can no longer overwrite
	/// the value.
	pub async fn mutate(&self, value: T) {
		self.slot.write(value);
	}

	/// Awaits `update` and stores its value; on failure the entry is untouched.
	pub async fn mutate_with<F, E>(&self, update: F) -> Result<T, E>
	where
		F: Future<Output = Result<T, E>>,
	{
		let value = update.await?;
		self.slot.write(value.clone());
		Ok(value)
	}

	/// Drops data and error.
	pub async fn clear(&self) {
		self.slot.clear();
	}
}

impl<T: CacheValue + fmt::Debug> fmt::Debug for Subscription<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("key", &self.slot.key)
			.field("state", &*self.state.borrow())
			.finish()
	}
}

impl<T: CacheValue> Drop for Subscription<T> {
	fn drop(&mut self) {
		self.cache.release(&self.slot);
	}
}
