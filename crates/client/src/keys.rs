//! Well-known cache keys and event names.

use kaboom_bridge::CommandDescriptor;
use serde_json::json;

use crate::data::NameType;

pub const AUTOSAVED: &str = "autosaved";
pub const ALL_PROTOLANGUAGES: &str = "all_protolanguages";
pub const ALL_LANGUAGES: &str = "all_languages";

pub fn project_name() -> CommandDescriptor {
	CommandDescriptor::new("get_project_name")
}

pub fn family_id() -> CommandDescriptor {
	CommandDescriptor::new("get_family_id")
}

/// Names of the saved projects.
pub fn language_groups() -> CommandDescriptor {
	CommandDescriptor::new("get_language_groups")
}

pub fn protolanguage(name: &str) -> CommandDescriptor {
	CommandDescriptor::with_args("get_protolanguage", json!({ "name": name }))
}

pub fn language(name: &str) -> CommandDescriptor {
	CommandDescriptor::with_args("get_language", json!({ "name": name }))
}

/// Phoneme list of one (proto)language.
pub fn phonemes(name: &str, name_type: NameType) -> CommandDescriptor {
	CommandDescriptor::with_args("get_phonemes", json!({ "name": name, "nameType": name_type }))
}
