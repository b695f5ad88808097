use std::sync::Arc;

use kaboom_bridge::{BridgeError, MemoryTransport};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::data::Place;

fn backend() -> (Arc<MemoryTransport>, Backend) {
	let transport = MemoryTransport::new();
	let backend = Backend::new(Invoker::new(transport.clone()));
	(transport, backend)
}

#[tokio::test]
async fn test_lookup_of_unknown_name_is_none() {
	let (transport, backend) = backend();
	transport.reply("get_protolanguage", json!(null));
	transport.reply("get_language", json!({"name": "Kab", "description": null, "phonemes": {}}));

	assert_eq!(backend.get_protolanguage("Nope").await.unwrap(), None);
	let lang = backend.get_language("Kab").await.unwrap().expect("language");
	assert_eq!(lang.name, "Kab");
	assert_eq!(transport.invocations()[0].1, json!({"name": "Nope"}));
}

#[tokio::test]
async fn test_camel_case_arguments() {
	let (transport, backend) = backend();
	transport.reply("init_autosave_service", json!(null));
	transport.reply("get_phonemes", json!([["id-1", {"ortho": "p", "primary": "Null", "allo": []}]]));

	backend.init_autosave_service(6).await.unwrap();
	let phonemes = backend.get_phonemes("Kab", NameType::Language).await.unwrap();

	assert_eq!(phonemes.len(), 1);
	assert_eq!(phonemes[0].0, "id-1");
	assert_eq!(
		transport.invocations(),
		vec![
			("init_autosave_service".to_string(), json!({"halfMinutes": 6})),
			("get_phonemes".to_string(), json!({"name": "Kab", "nameType": "Language"})),
		]
	);
}

#[tokio::test]
async fn test_phoneme_commands() {
	let (transport, backend) = backend();
	transport.reply("create_protolanguage_phoneme", json!("id-7"));
	transport.reply("set_phoneme", json!(true));
	transport.reply("delete_phoneme", json!(false));

	let phoneme = Phoneme {
		ortho: "t".into(),
		primary: Phone::Plosive {
			place: Place::Alveolar,
			voiced: false,
			attachments: Default::default(),
		},
		allo: vec![],
	};
	let id = backend.create_phoneme("P", NameType::Protolanguage, &phoneme).await.unwrap();
	assert_eq!(id, "id-7");
	assert!(backend.set_phoneme("P", NameType::Protolanguage, &id, &phoneme).await.unwrap());
	assert!(!backend.delete_phoneme("P", NameType::Protolanguage, "gone").await.unwrap());

	let (_, args) = &transport.invocations()[1];
	assert_eq!(args["phoneme"]["primary"], json!({"Plosive": {"place": "Alveolar", "voiced": false, "attachments": []}}));
	assert_eq!(args["nameType"], json!("Protolanguage"));
}

#[tokio::test]
async fn test_malformed_family_id_is_a_contract_break() {
	let (transport, backend) = backend();
	transport.reply("get_family_id", json!(42));

	let err = backend.get_family_id().await.unwrap_err();
	assert!(matches!(err, BridgeError::SchemaValidation { ref context, .. } if context == "get_family_id"));
}
