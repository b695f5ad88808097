//! Domain records exchanged with the backend and the schemas that admit them.
//!
//! Records serialize the way the backend expects them as command arguments.
//! Replies go the other way through the schema functions, never through
//! `Deserialize`, so every value a view sees has been checked field by field.

mod language;
mod phone;

pub use language::{
	AutosaveRecord, Language, LanguageGroup, NameType, PhonemeSet, Protolanguage, autosave_record, family_id, language, language_group,
	names, phoneme_set, protolanguage,
};
pub use phone::{ObstruentAttachment, Phone, Phoneme, Place, attachments, obstruent_attachment, phone, phoneme, place};
