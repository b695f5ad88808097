use std::collections::BTreeMap;
use std::fmt;

use kaboom_schema::{Schema, SchemaValidationError, ValuePath, any, dict, list, map, record, string};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::phone::{Phoneme, phoneme};

/// Which kind of language a name refers to.
///
/// Phoneme commands take it as `nameType` next to the language name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NameType {
	Protolanguage,
	Language,
}

impl NameType {
	/// Lower-case noun for messages.
	pub fn noun(self) -> &'static str {
		match self {
			Self::Protolanguage => "protolanguage",
			Self::Language => "language",
		}
	}
}

impl fmt::Display for NameType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.noun())
	}
}

/// Phoneme inventory of a (proto)language.
///
/// Backends that store phonemes in a plain list send an array; backends that
/// address phonemes by id send an object keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PhonemeSet {
	Listed(Vec<Phoneme>),
	Keyed(BTreeMap<String, Phoneme>),
}

impl Default for PhonemeSet {
	fn default() -> Self {
		Self::Keyed(BTreeMap::new())
	}
}

impl PhonemeSet {
	pub fn len(&self) -> usize {
		match self {
			Self::Listed(phonemes) => phonemes.len(),
			Self::Keyed(phonemes) => phonemes.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Phoneme `id`; listed inventories have no ids.
	pub fn get(&self, id: &str) -> Option<&Phoneme> {
		match self {
			Self::Listed(_) => None,
			Self::Keyed(phonemes) => phonemes.get(id),
		}
	}

	/// Phonemes with their ids, in inventory order.
	pub fn iter(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Phoneme)> + '_> {
		match self {
			Self::Listed(phonemes) => Box::new(phonemes.iter().map(|phoneme| (None, phoneme))),
			Self::Keyed(phonemes) => Box::new(phonemes.iter().map(|(id, phoneme)| (Some(id.as_str()), phoneme))),
		}
	}
}

/// An ancestral language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Protolanguage {
	pub name: String,
	pub description: Option<Value>,
	pub phonemes: PhonemeSet,
}

/// A descendant language and the protolanguages it derives from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Language {
	pub name: String,
	pub description: Option<Value>,
	pub phonemes: PhonemeSet,
	pub ancestors: Vec<String>,
}

/// A whole project as stored on disk by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageGroup {
	pub version: String,
	/// Shared by every epoch of the same project.
	pub family_id: String,
	pub protolangs: Vec<Protolanguage>,
	pub langs: Vec<Language>,
}

/// Payload of the `autosaved` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutosaveRecord {
	pub name: String,
	pub timestamp: String,
}

fn description() -> impl Schema<Output = Value> {
	any()
}

struct PhonemeSetSchema;

impl Schema for PhonemeSetSchema {
	type Output = PhonemeSet;

	fn describe(&self) -> String {
		"list<Phoneme> | dict<Phoneme>".to_string()
	}

	fn parse_at(&self, value: &Value, path: &ValuePath) -> kaboom_schema::Result<PhonemeSet> {
		match value {
			Value::Array(_) => list(phoneme()).parse_at(value, path).map(PhonemeSet::Listed),
			Value::Object(_) => dict(phoneme()).parse_at(value, path).map(PhonemeSet::Keyed),
			other => Err(SchemaValidationError::mismatch(path, self.describe(), other)),
		}
	}
}

/// Either inventory shape; see [`PhonemeSet`].
pub fn phoneme_set() -> impl Schema<Output = PhonemeSet> {
	PhonemeSetSchema
}

pub fn protolanguage() -> impl Schema<Output = Protolanguage> {
	record("Protolanguage", |f| {
		Ok(Protolanguage {
			name: f.required("name", &string())?,
			description: f.optional("description", &description())?,
			phonemes: f.or_default("phonemes", &phoneme_set())?,
		})
	})
}

pub fn language() -> impl Schema<Output = Language> {
	record("Language", |f| {
		Ok(Language {
			name: f.required("name", &string())?,
			description: f.optional("description", &description())?,
			phonemes: f.or_default("phonemes", &phoneme_set())?,
			ancestors: f.or_default("ancestors", &list(string()))?,
		})
	})
}

/// Family ids are UUIDs; the backend's spelling is kept.
pub fn family_id() -> impl Schema<Output = String> {
	map(string(), |id: String| match Uuid::try_parse(&id) {
		Ok(_) => Ok(id),
		Err(err) => Err(format!("malformed family id {id:?}: {err}")),
	})
}

pub fn language_group() -> impl Schema<Output = LanguageGroup> {
	record("LanguageGroup", |f| {
		Ok(LanguageGroup {
			version: f.required("version", &string())?,
			family_id: f.required("family_id", &family_id())?,
			protolangs: f.or_default("protolangs", &list(protolanguage()))?,
			langs: f.or_default("langs", &list(language()))?,
		})
	})
}

pub fn autosave_record() -> impl Schema<Output = AutosaveRecord> {
	record("Autosave", |f| {
		Ok(AutosaveRecord {
			name: f.required("name", &string())?,
			timestamp: f.required("timestamp", &string())?,
		})
	})
}

/// Names of every (proto)language or saved project.
pub fn names() -> impl Schema<Output = Vec<String>> {
	list(string())
}
