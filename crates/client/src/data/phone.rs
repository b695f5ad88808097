use std::collections::BTreeSet;

use kaboom_schema::{Schema, boolean, list, map, one_of, record, string, tagged};
use serde::Serialize;

/// Place of articulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Place {
	Bilabial,
	Labiodental,
	Dental,
	Alveolar,
	Postalveolar,
}

impl Place {
	/// Every place, front to back.
	pub const ALL: [Place; 5] = [Self::Bilabial, Self::Labiodental, Self::Dental, Self::Alveolar, Self::Postalveolar];
}

/// Secondary articulation of an obstruent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ObstruentAttachment {
	Ejective,
	Preaspirated,
	Aspirated,
	Breathy,
	Creaky,
}

impl ObstruentAttachment {
	pub const ALL: [ObstruentAttachment; 5] = [Self::Ejective, Self::Preaspirated, Self::Aspirated, Self::Breathy, Self::Creaky];
}

/// A single speech sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Phone {
	Plosive {
		place: Place,
		voiced: bool,
		attachments: BTreeSet<ObstruentAttachment>,
	},
	Affricative {
		start_place: Place,
		end_place: Place,
		voiced: bool,
		attachments: BTreeSet<ObstruentAttachment>,
	},
	Fricative {
		place: Place,
		voiced: bool,
		attachments: BTreeSet<ObstruentAttachment>,
	},
	Vowel {},
	/// Null production.
	Null,
}

impl Phone {
	/// Variant name as used on the wire.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Plosive { .. } => "Plosive",
			Self::Affricative { .. } => "Affricative",
			Self::Fricative { .. } => "Fricative",
			Self::Vowel {} => "Vowel",
			Self::Null => "Null",
		}
	}

	pub fn is_voiced(&self) -> bool {
		match self {
			Self::Plosive { voiced, .. } | Self::Affricative { voiced, .. } | Self::Fricative { voiced, .. } => *voiced,
			Self::Vowel {} => true,
			Self::Null => false,
		}
	}

	/// Attachments of an obstruent; empty for vowels and the null phone.
	pub fn attachments(&self) -> Option<&BTreeSet<ObstruentAttachment>> {
		match self {
			Self::Plosive { attachments, .. } | Self::Affricative { attachments, .. } | Self::Fricative { attachments, .. } => Some(attachments),
			Self::Vowel {} | Self::Null => None,
		}
	}
}

/// A phoneme: its spelling, main realization and allophones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phoneme {
	pub ortho: String,
	pub primary: Phone,
	pub allo: Vec<Phone>,
}

impl Default for Phoneme {
	fn default() -> Self {
		Self {
			ortho: String::new(),
			primary: Phone::Null,
			allo: Vec::new(),
		}
	}
}

pub fn place() -> impl Schema<Output = Place> {
	one_of(
		"Place",
		&[
			("Bilabial", Place::Bilabial),
			("Labiodental", Place::Labiodental),
			("Dental", Place::Dental),
			("Alveolar", Place::Alveolar),
			("Postalveolar", Place::Postalveolar),
		],
	)
}

pub fn obstruent_attachment() -> impl Schema<Output = ObstruentAttachment> {
	one_of(
		"ObstruentAttachment",
		&[
			("Ejective", ObstruentAttachment::Ejective),
			("Preaspirated", ObstruentAttachment::Preaspirated),
			("Aspirated", ObstruentAttachment::Aspirated),
			("Breathy", ObstruentAttachment::Breathy),
			("Creaky", ObstruentAttachment::Creaky),
		],
	)
}

/// Attachment set; listing the same attachment twice is rejected.
pub fn attachments() -> impl Schema<Output = BTreeSet<ObstruentAttachment>> {
	map(list(obstruent_attachment()), |items: Vec<ObstruentAttachment>| {
		let mut set = BTreeSet::new();
		for item in items {
			if !set.insert(item) {
				return Err(format!("duplicate attachment {item:?}"));
			}
		}
		Ok(set)
	})
}

pub fn phone() -> impl Schema<Output = Phone> {
	tagged("Phone", &["Plosive", "Affricative", "Fricative", "Vowel", "Null"], |v| match v.tag() {
		"Plosive" => v.fields(|f| {
			Ok(Phone::Plosive {
				place: f.required("place", &place())?,
				voiced: f.required("voiced", &boolean())?,
				attachments: f.required("attachments", &attachments())?,
			})
		}),
		"Affricative" => v.fields(|f| {
			Ok(Phone::Affricative {
				start_place: f.required("start_place", &place())?,
				end_place: f.required("end_place", &place())?,
				voiced: f.required("voiced", &boolean())?,
				attachments: f.required("attachments", &attachments())?,
			})
		}),
		"Fricative" => v.fields(|f| {
			Ok(Phone::Fricative {
				place: f.required("place", &place())?,
				voiced: f.required("voiced", &boolean())?,
				attachments: f.required("attachments", &attachments())?,
			})
		}),
		"Vowel" => v.fields(|_| Ok(Phone::Vowel {})),
		"Null" => v.unit().map(|()| Phone::Null),
		_ => Err(v.unknown()),
	})
}

pub fn phoneme() -> impl Schema<Output = Phoneme> {
	record("Phoneme", |f| {
		Ok(Phoneme {
			ortho: f.required("ortho", &string())?,
			primary: f.required("primary", &phone())?,
			allo: f.or_default("allo", &list(phone()))?,
		})
	})
}
