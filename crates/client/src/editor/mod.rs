//! One editor for both protolanguages and languages.
//!
//! The two kinds differ only in command names, the list event and the
//! route they live under; [`EditorKind`] carries those and
//! [`LanguageEditor`] does the rest.

use std::fmt;

use kaboom_bridge::{Cache, CommandDescriptor, Invoker, Subscription};
use kaboom_schema::{SharedSchema, any, boolean, list, optional, pair, shared, string};
use serde_json::{Value, json};
use tracing::debug;

use crate::data::{self, Language, NameType, Phoneme, Protolanguage};
use crate::notify::{Notification, NotificationAction, NotificationCenter};
use crate::{Result, keys};

/// Commands, events and routes of one kind of language.
pub struct EditorKind<T> {
	pub name_type: NameType,
	/// Descriptor of the single-record read, keyed by name.
	pub read: fn(&str) -> CommandDescriptor,
	pub create: &'static str,
	pub delete: &'static str,
	pub create_phoneme: &'static str,
	pub get_description: &'static str,
	pub set_description: &'static str,
	/// Command that starts the periodic `list_event` emitter.
	pub start_list: &'static str,
	pub list_event: &'static str,
	/// First route segment, e.g. `proto` in `/proto/<name>/describe`.
	pub route: &'static str,
	pub schema: fn() -> SharedSchema<T>,
}

impl<T> Clone for EditorKind<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T> Copy for EditorKind<T> {}

impl<T> fmt::Debug for EditorKind<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EditorKind")
			.field("name_type", &self.name_type)
			.field("list_event", &self.list_event)
			.field("route", &self.route)
			.finish_non_exhaustive()
	}
}

impl EditorKind<Protolanguage> {
	pub fn protolanguage() -> Self {
		Self {
			name_type: NameType::Protolanguage,
			read: keys::protolanguage,
			create: "create_protolanguage",
			delete: "delete_protolanguage",
			create_phoneme: "create_protolanguage_phoneme",
			get_description: "get_protolanguage_description",
			set_description: "set_protolanguage_description",
			start_list: "init_protolanguages_server",
			list_event: keys::ALL_PROTOLANGUAGES,
			route: "proto",
			schema: || shared(data::protolanguage()),
		}
	}
}

impl EditorKind<Language> {
	pub fn language() -> Self {
		Self {
			name_type: NameType::Language,
			read: keys::language,
			create: "create_language",
			delete: "delete_language",
			create_phoneme: "create_language_phoneme",
			get_description: "get_language_description",
			set_description: "set_language_description",
			start_list: "init_languages_server",
			list_event: keys::ALL_LANGUAGES,
			route: "lang",
			schema: || shared(data::language()),
		}
	}
}

impl<T> EditorKind<T> {
	/// Route of the description page of `name`.
	pub fn describe_route(&self, name: &str) -> String {
		format!("/{}/{name}/describe", self.route)
	}
}

/// Editor controller for one kind of language.
///
/// Records are cached as `Option<T>`: the backend answers `null` for a name
/// that does not exist.
pub struct LanguageEditor<T> {
	kind: EditorKind<T>,
	cache: Cache,
	invoker: Invoker,
	notifications: NotificationCenter,
}

impl<T> fmt::Debug for LanguageEditor<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LanguageEditor").field("kind", &self.kind).finish_non_exhaustive()
	}
}

impl<T> LanguageEditor<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub fn new(kind: EditorKind<T>, cache: Cache, notifications: NotificationCenter) -> Self {
		let invoker = cache.invoker().clone();
		Self {
			kind,
			cache,
			invoker,
			notifications,
		}
	}

	pub fn kind(&self) -> &EditorKind<T> {
		&self.kind
	}

	fn descriptor(&self, name: &str) -> CommandDescriptor {
		(self.kind.read)(name)
	}

	fn report<U>(&self, result: kaboom_bridge::Result<U>) -> Result<U> {
		result.map_err(|err| {
			self.notifications.show(Notification::error(err.to_string()));
			err.into()
		})
	}

	/// Live record of `name`.
	pub fn subscribe(&self, name: &str) -> Result<Subscription<Option<T>>> {
		Ok(self.cache.subscribe(self.descriptor(name), optional((self.kind.schema)()))?)
	}

	/// Names as pushed by the backend's list emitter.
	pub fn names(&self) -> Result<Subscription<Vec<String>>> {
		Ok(self.cache.subscribe_event(self.kind.list_event, data::names())?)
	}

	/// Starts the backend task that feeds [`Self::names`].
	pub async fn start_name_server(&self) -> Result<()> {
		Ok(self.invoker.invoke_unit(self.kind.start_list, json!({})).await?)
	}

	/// Creates `name` and seeds its cache entry with the new record.
	///
	/// Failures are returned without a notification; the create dialog shows
	/// them next to the name field.
	pub async fn create(&self, name: &str) -> Result<Option<T>> {
		self.invoker.invoke_unit(self.kind.create, json!({ "name": name })).await?;
		let descriptor = self.descriptor(name);
		let created = self.invoker.call(&descriptor, &optional((self.kind.schema)())).await?;
		let seeded = self.cache.mutate_key(&descriptor.key(), created.clone()).await?;
		debug!(name, kind = %self.kind.name_type, seeded, "client.editor.created");

		self.notifications.show(
			Notification::info(format!("Created {} {name}", self.kind.name_type.noun()))
				.with_action(NotificationAction::Navigate(self.kind.describe_route(name))),
		);
		Ok(created)
	}

	/// Deletes `name`; subscribers of its record see `None`.
	pub async fn delete(&self, name: &str) -> Result<()> {
		self.report(self.invoker.invoke_unit(self.kind.delete, json!({ "name": name })).await)?;
		self.cache.mutate_key::<Option<T>>(&self.descriptor(name).key(), None).await?;
		Ok(())
	}

	pub async fn description(&self, name: &str) -> Result<Option<Value>> {
		Ok(self
			.invoker
			.invoke(self.kind.get_description, &optional(any()), json!({ "name": name }))
			.await?)
	}

	/// Stores the description document and refetches the record.
	pub async fn set_description(&self, name: &str, description: &Value) -> Result<()> {
		self.report(
			self.invoker
				.invoke_unit(self.kind.set_description, json!({ "name": name, "description": description }))
				.await,
		)?;
		self.cache.refresh_key(&self.descriptor(name).key()).await;
		Ok(())
	}

	/// Live `(id, phoneme)` list of `name`.
	pub fn phonemes(&self, name: &str) -> Result<Subscription<Vec<(String, Phoneme)>>> {
		Ok(self.cache.subscribe(
			keys::phonemes(name, self.kind.name_type),
			list(pair(string(), data::phoneme())),
		)?)
	}

	async fn phonemes_changed(&self, name: &str) {
		self.cache.refresh_key(&keys::phonemes(name, self.kind.name_type).key()).await;
		self.cache.refresh_key(&self.descriptor(name).key()).await;
	}

	/// Adds `phoneme` to `name` and returns its id.
	pub async fn add_phoneme(&self, name: &str, phoneme: &Phoneme) -> Result<String> {
		let id = self.report(
			self.invoker
				.invoke(self.kind.create_phoneme, &string(), json!({ "name": name, "phoneme": phoneme }))
				.await,
		)?;
		self.phonemes_changed(name).await;
		Ok(id)
	}

	/// Replaces phoneme `id`; returns whether it existed.
	pub async fn set_phoneme(&self, name: &str, id: &str, phoneme: &Phoneme) -> Result<bool> {
		let args = json!({ "name": name, "nameType": self.kind.name_type, "id": id, "phoneme": phoneme });
		let replaced = self.report(self.invoker.invoke("set_phoneme", &boolean(), args).await)?;
		if replaced {
			self.phonemes_changed(name).await;
		}
		Ok(replaced)
	}

	/// Removes phoneme `id`; returns whether it existed.
	pub async fn delete_phoneme(&self, name: &str, id: &str) -> Result<bool> {
		let args = json!({ "name": name, "nameType": self.kind.name_type, "id": id });
		let removed = self.report(self.invoker.invoke("delete_phoneme", &boolean(), args).await)?;
		if removed {
			self.phonemes_changed(name).await;
		}
		Ok(removed)
	}
}

#[cfg(test)]
mod tests;
