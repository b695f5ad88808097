//! One typed method per backend command.

use kaboom_bridge::{CommandDescriptor, Invoker, Result};
use kaboom_schema::{Schema, any, boolean, list, optional, pair, string};
use serde_json::{Value, json};

use crate::data::{self, Language, LanguageGroup, NameType, Phone, Phoneme, Protolanguage};
use crate::keys;

/// Typed command surface of the backend.
#[derive(Debug, Clone)]
pub struct Backend {
	invoker: Invoker,
}

impl Backend {
	pub fn new(invoker: Invoker) -> Self {
		Self { invoker }
	}

	pub fn invoker(&self) -> &Invoker {
		&self.invoker
	}

	async fn read<S: Schema>(&self, descriptor: CommandDescriptor, schema: &S) -> Result<S::Output> {
		self.invoker.call(&descriptor, schema).await
	}

	async fn unit(&self, command: &str, args: Value) -> Result<()> {
		self.invoker.invoke_unit(command, args).await
	}

	// Project

	pub async fn get_language_groups(&self) -> Result<Vec<String>> {
		self.read(keys::language_groups(), &data::names()).await
	}

	pub async fn get_project_name(&self) -> Result<String> {
		self.read(keys::project_name(), &string()).await
	}

	pub async fn set_project_name(&self, name: &str) -> Result<()> {
		self.unit("set_project_name", json!({ "name": name })).await
	}

	pub async fn get_family_id(&self) -> Result<String> {
		self.read(keys::family_id(), &data::family_id()).await
	}

	/// Replaces the open project with an empty one under a new family id.
	pub async fn new_language_group(&self) -> Result<()> {
		self.unit("new_language_group", json!({})).await
	}

	/// Freezes the open project as an epoch and renames it.
	pub async fn epoch_language_group(&self) -> Result<()> {
		self.unit("epoch_language_group", json!({})).await
	}

	pub async fn merge_language_group(&self, filename: &str) -> Result<()> {
		self.unit("merge_language_group", json!({ "filename": filename })).await
	}

	pub async fn save_language_group(&self, filename: &str) -> Result<()> {
		self.unit("save_language_group", json!({ "filename": filename })).await
	}

	/// Loads a saved project; backends that reply with the group yield it.
	pub async fn load_language_group(&self, filename: &str) -> Result<Option<LanguageGroup>> {
		self.invoker
			.invoke("load_language_group", &optional(data::language_group()), json!({ "filename": filename }))
			.await
	}

	pub async fn delete_language_group(&self, filename: &str) -> Result<()> {
		self.unit("delete_language_group", json!({ "filename": filename })).await
	}

	pub async fn export_language_group(&self) -> Result<()> {
		self.unit("export_language_group", json!({})).await
	}

	/// Renders the export of the open project without writing it.
	pub async fn test_export_language_group(&self) -> Result<String> {
		self.invoker.invoke("test_export_language_group", &string(), json!({})).await
	}

	/// Pretty-printed JSON of the open project.
	pub async fn dump_language_group(&self) -> Result<String> {
		self.invoker.invoke("dump_language_group", &string(), json!({})).await
	}

	pub async fn init_autosave_service(&self, half_minutes: u32) -> Result<()> {
		self.unit("init_autosave_service", json!({ "halfMinutes": half_minutes })).await
	}

	// Protolanguages

	pub async fn create_protolanguage(&self, name: &str) -> Result<()> {
		self.unit("create_protolanguage", json!({ "name": name })).await
	}

	pub async fn delete_protolanguage(&self, name: &str) -> Result<()> {
		self.unit("delete_protolanguage", json!({ "name": name })).await
	}

	/// `None` when no protolanguage has that name.
	pub async fn get_protolanguage(&self, name: &str) -> Result<Option<Protolanguage>> {
		self.read(keys::protolanguage(name), &optional(data::protolanguage())).await
	}

	pub async fn get_all_protolanguages(&self) -> Result<Vec<String>> {
		self.invoker.invoke("get_all_protolanguages", &data::names(), json!({})).await
	}

	pub async fn get_protolanguage_description(&self, name: &str) -> Result<Option<Value>> {
		self.invoker
			.invoke("get_protolanguage_description", &optional(any()), json!({ "name": name }))
			.await
	}

	pub async fn set_protolanguage_description(&self, name: &str, description: &Value) -> Result<()> {
		self.unit("set_protolanguage_description", json!({ "name": name, "description": description }))
			.await
	}

	/// Starts the backend task that emits `all_protolanguages` periodically.
	pub async fn init_protolanguages_server(&self) -> Result<()> {
		self.unit("init_protolanguages_server", json!({})).await
	}

	// Languages

	pub async fn create_language(&self, name: &str) -> Result<()> {
		self.unit("create_language", json!({ "name": name })).await
	}

	pub async fn delete_language(&self, name: &str) -> Result<()> {
		self.unit("delete_language", json!({ "name": name })).await
	}

	/// `None` when no language has that name.
	pub async fn get_language(&self, name: &str) -> Result<Option<Language>> {
		self.read(keys::language(name), &optional(data::language())).await
	}

	pub async fn get_all_languages(&self) -> Result<Vec<String>> {
		self.invoker.invoke("get_all_languages", &data::names(), json!({})).await
	}

	pub async fn get_language_description(&self, name: &str) -> Result<Option<Value>> {
		self.invoker
			.invoke("get_language_description", &optional(any()), json!({ "name": name }))
			.await
	}

	pub async fn set_language_description(&self, name: &str, description: &Value) -> Result<()> {
		self.unit("set_language_description", json!({ "name": name, "description": description }))
			.await
	}

	/// Starts the backend task that emits `all_languages` periodically.
	pub async fn init_languages_server(&self) -> Result<()> {
		self.unit("init_languages_server", json!({})).await
	}

	// Phonemes

	/// Phonemes of a (proto)language as `(id, phoneme)` pairs.
	pub async fn get_phonemes(&self, name: &str, name_type: NameType) -> Result<Vec<(String, Phoneme)>> {
		self.read(keys::phonemes(name, name_type), &list(pair(string(), data::phoneme())))
			.await
	}

	/// Looks a phoneme up in the language and then in its ancestors.
	pub async fn get_phoneme(&self, name: &str, name_type: NameType, id: &str) -> Result<Option<Phoneme>> {
		self.invoker
			.invoke(
				"get_phoneme",
				&optional(data::phoneme()),
				json!({ "name": name, "nameType": name_type, "id": id }),
			)
			.await
	}

	/// Adds a phoneme and returns its new id.
	pub async fn create_phoneme(&self, name: &str, name_type: NameType, phoneme: &Phoneme) -> Result<String> {
		let command = match name_type {
			NameType::Protolanguage => "create_protolanguage_phoneme",
			NameType::Language => "create_language_phoneme",
		};
		self.invoker
			.invoke(command, &string(), json!({ "name": name, "phoneme": phoneme }))
			.await
	}

	/// Returns whether a phoneme with `id` existed and was replaced.
	pub async fn set_phoneme(&self, name: &str, name_type: NameType, id: &str, phoneme: &Phoneme) -> Result<bool> {
		self.invoker
			.invoke(
				"set_phoneme",
				&boolean(),
				json!({ "name": name, "nameType": name_type, "id": id, "phoneme": phoneme }),
			)
			.await
	}

	/// Returns whether a phoneme with `id` existed.
	pub async fn delete_phoneme(&self, name: &str, name_type: NameType, id: &str) -> Result<bool> {
		self.invoker
			.invoke("delete_phoneme", &boolean(), json!({ "name": name, "nameType": name_type, "id": id }))
			.await
	}

	// Phone notation

	/// IPA rendering of `phone`.
	pub async fn display_phone(&self, phone: &Phone) -> Result<String> {
		self.invoker.invoke("display_phone", &string(), json!({ "phone": phone })).await
	}

	/// Branner ASCII notation of `phone`.
	pub async fn display_phone_branner(&self, phone: &Phone) -> Result<String> {
		self.invoker
			.invoke("display_phone_branner", &string(), json!({ "phone": phone }))
			.await
	}

	/// Converts Branner ASCII notation to IPA.
	pub async fn from_branner(&self, input: &str) -> Result<String> {
		self.invoker.invoke("from_branner", &string(), json!({ "input": input })).await
	}

	/// Converts SIL keyboard notation to IPA.
	pub async fn from_sil(&self, input: &str) -> Result<String> {
		self.invoker.invoke("from_sil", &string(), json!({ "input": input })).await
	}
}

#[cfg(test)]
mod tests;
