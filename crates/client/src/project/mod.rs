//! The open project: its name, family and the saved projects next to it.

use kaboom_bridge::{Cache, Subscription};
use kaboom_schema::string;
use tracing::debug;

use crate::data::{self, AutosaveRecord};
use crate::notify::{Notification, NotificationAction, NotificationCenter};
use crate::{Backend, Result, keys};

/// Home view controller.
///
/// Holds subscriptions to the project name, the family id and the saved
/// project list for as long as it lives. Failed actions are reported to the
/// notification center and returned.
pub struct ProjectController {
	cache: Cache,
	backend: Backend,
	notifications: NotificationCenter,
	name: Subscription<String>,
	family_id: Subscription<String>,
	groups: Subscription<Vec<String>>,
}

impl ProjectController {
	/// Subscribes to the project keys. Must be called inside a Tokio runtime.
	pub fn new(cache: Cache, notifications: NotificationCenter) -> Result<Self> {
		let backend = Backend::new(cache.invoker().clone());
		let name = cache.subscribe(keys::project_name(), string())?;
		let family_id = cache.subscribe(keys::family_id(), data::family_id())?;
		let groups = cache.subscribe(keys::language_groups(), data::names())?;
		Ok(Self {
			cache,
			backend,
			notifications,
			name,
			family_id,
			groups,
		})
	}

	pub fn name(&self) -> &Subscription<String> {
		&self.name
	}

	pub fn family_id(&self) -> &Subscription<String> {
		&self.family_id
	}

	/// Names of the saved projects.
	pub fn groups(&self) -> &Subscription<Vec<String>> {
		&self.groups
	}

	/// Latest autosave reported by the backend.
	pub fn autosaves(&self) -> Result<Subscription<AutosaveRecord>> {
		Ok(self.cache.subscribe_event(keys::AUTOSAVED, data::autosave_record())?)
	}

	fn report<T>(&self, result: kaboom_bridge::Result<T>) -> Result<T> {
		result.map_err(|err| {
			self.notifications.show(Notification::error(err.to_string()));
			err.into()
		})
	}

	/// Renames the open project.
	pub async fn set_project_name(&self, name: &str) -> Result<()> {
		self.backend.set_project_name(name).await?;
		self.name.mutate(name.to_string()).await;
		Ok(())
	}

	/// Saves the open project under its name and refreshes the saved list.
	pub async fn save(&self) -> Result<()> {
		let name = self.name.data().unwrap_or_default();
		self.report(self.backend.save_language_group(&name).await)?;
		self.notifications.show(Notification::info(format!("Saved project {name}")));
		self.groups.refresh().await;
		Ok(())
	}

	/// Starts an empty, unnamed project in a new family.
	pub async fn new_project(&self) -> Result<()> {
		self.report(self.backend.new_language_group().await)?;
		self.report(self.family_id.mutate_with(self.backend.get_family_id()).await)?;
		self.report(self.backend.set_project_name("").await)?;
		self.name.mutate(String::new()).await;
		Ok(())
	}

	/// Freezes the project as an epoch; the backend renames it.
	pub async fn epoch(&self) -> Result<()> {
		self.report(self.backend.epoch_language_group().await)?;
		self.report(self.name.mutate_with(self.backend.get_project_name()).await)?;
		self.notifications
			.show(Notification::info("Epoch created").with_action(NotificationAction::OpenMergeDialog));
		Ok(())
	}

	pub async fn export(&self) -> Result<()> {
		self.report(self.backend.export_language_group().await)?;
		self.notifications.show(Notification::info("Project exported"));
		Ok(())
	}

	/// Opens the saved project `name`.
	pub async fn load(&self, name: &str) -> Result<()> {
		let loaded = self.report(self.backend.load_language_group(name).await)?;
		debug!(name, returned_group = loaded.is_some(), "client.project.loaded");
		self.name.mutate(name.to_string()).await;
		self.report(self.family_id.mutate_with(self.backend.get_family_id()).await)?;
		Ok(())
	}

	/// Merges the saved project `name` into the open one.
	///
	/// Errors are returned without a notification; the merge dialog shows them.
	pub async fn merge(&self, name: &str) -> Result<()> {
		Ok(self.backend.merge_language_group(name).await?)
	}

	/// Deletes the saved project `name` and refetches the saved list.
	pub async fn delete(&self, name: &str) -> Result<()> {
		self.report(self.backend.delete_language_group(name).await)?;
		self.groups.refresh().await;
		Ok(())
	}
}

#[cfg(test)]
mod tests;
