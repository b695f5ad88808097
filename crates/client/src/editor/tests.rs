use std::sync::{Arc, Mutex};
use std::time::Duration;

use kaboom_bridge::{BridgeError, MemoryTransport};
use kaboom_schema::Schema;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::ClientError;
use crate::data::Phone;

fn proto_editor(transport: &Arc<MemoryTransport>) -> (LanguageEditor<Protolanguage>, NotificationCenter) {
	let notifications = NotificationCenter::new();
	let cache = Cache::new(Invoker::new(transport.clone()));
	let editor = LanguageEditor::new(EditorKind::protolanguage(), cache, notifications.clone());
	(editor, notifications)
}

fn lang_editor(transport: &Arc<MemoryTransport>) -> (LanguageEditor<Language>, NotificationCenter) {
	let notifications = NotificationCenter::new();
	let cache = Cache::new(Invoker::new(transport.clone()));
	let editor = LanguageEditor::new(EditorKind::language(), cache, notifications.clone());
	(editor, notifications)
}

fn null_phoneme(ortho: &str) -> Phoneme {
	Phoneme {
		ortho: ortho.into(),
		primary: Phone::Null,
		allo: vec![],
	}
}

#[test]
fn test_kinds_differ_only_in_names() {
	let proto = EditorKind::protolanguage();
	let lang = EditorKind::language();

	assert_eq!(proto.describe_route("Proto-Kab"), "/proto/Proto-Kab/describe");
	assert_eq!(lang.describe_route("Kab"), "/lang/Kab/describe");
	assert_eq!((proto.read)("x").name(), "get_protolanguage");
	assert_eq!((lang.read)("x").name(), "get_language");
	assert_eq!(proto.list_event, "all_protolanguages");
	assert_eq!(lang.start_list, "init_languages_server");
}

#[tokio::test]
async fn test_create_seeds_entry_and_offers_navigation() {
	let transport = MemoryTransport::new();
	transport.reply("get_protolanguage", json!(null));
	let (editor, notifications) = proto_editor(&transport);

	let record = editor.subscribe("Proto-Kab").unwrap();
	assert_eq!(record.settled().await.data, Some(None));

	transport.reply("create_protolanguage", json!(null));
	transport.reply("get_protolanguage", json!({"name": "Proto-Kab", "description": null, "phonemes": {}}));
	let created = editor.create("Proto-Kab").await.unwrap().expect("created record");

	assert_eq!(created.name, "Proto-Kab");
	assert_eq!(record.data(), Some(Some(created)));
	let shown = notifications.current().unwrap();
	assert_eq!(shown.message, "Created protolanguage Proto-Kab");
	assert_eq!(
		shown.action,
		Some(NotificationAction::Navigate("/proto/Proto-Kab/describe".to_string()))
	);
}

#[tokio::test]
async fn test_failed_create_is_left_to_the_dialog() {
	let transport = MemoryTransport::new();
	transport.reject("create_language", "the language named Kab already exists");
	let (editor, notifications) = lang_editor(&transport);

	let err = editor.create("Kab").await.unwrap_err();

	assert_eq!(err.to_string(), "the language named Kab already exists");
	assert!(matches!(err, ClientError::Bridge(BridgeError::BackendInvocation { .. })));
	assert_eq!(notifications.current(), None);
	assert_eq!(transport.calls("get_language"), 0);
}

#[tokio::test]
async fn test_delete_clears_the_record() {
	let transport = MemoryTransport::new();
	transport.reply(
		"get_language",
		json!({"name": "Kab", "description": null, "phonemes": {}, "ancestors": ["Proto-Kab"]}),
	);
	transport.reply("delete_language", json!(null));
	let (editor, _) = lang_editor(&transport);

	let record = editor.subscribe("Kab").unwrap();
	let loaded = record.settled().await.data.flatten().unwrap();
	assert_eq!(loaded.ancestors, vec!["Proto-Kab".to_string()]);

	editor.delete("Kab").await.unwrap();

	assert_eq!(record.data(), Some(None));
	assert_eq!(transport.invocations().last().unwrap().1, json!({"name": "Kab"}));
}

#[tokio::test]
async fn test_failed_delete_is_notified() {
	let transport = MemoryTransport::new();
	transport.reject("delete_protolanguage", "the protolanguage named X does not exist");
	let (editor, notifications) = proto_editor(&transport);

	assert!(editor.delete("X").await.is_err());
	assert_eq!(
		notifications.current(),
		Some(Notification::error("the protolanguage named X does not exist"))
	);
}

#[tokio::test]
async fn test_names_follow_list_event() {
	let transport = MemoryTransport::new();
	transport.reply("init_languages_server", json!(null));
	let (editor, _) = lang_editor(&transport);

	let mut names = editor.names().unwrap();
	editor.start_name_server().await.unwrap();
	transport.listening("all_languages").await;
	transport.emit("all_languages", json!(["Kab", "Tol"]));

	assert_eq!(names.changed().await.data, Some(vec!["Kab".to_string(), "Tol".to_string()]));
	assert_eq!(transport.calls("init_languages_server"), 1);
	assert_eq!(transport.calls("get_all_languages"), 0);
}

#[tokio::test]
async fn test_phoneme_changes_refresh_the_list() {
	let transport = MemoryTransport::new();
	transport.reply("get_phonemes", json!([]));
	let (editor, _) = proto_editor(&transport);

	let phonemes = editor.phonemes("P").unwrap();
	assert_eq!(phonemes.settled().await.data, Some(vec![]));

	transport.reply("create_protolanguage_phoneme", json!("id-1"));
	transport.reply("get_phonemes", json!([["id-1", {"ortho": "h", "primary": "Null", "allo": []}]]));
	let id = editor.add_phoneme("P", &null_phoneme("h")).await.unwrap();

	assert_eq!(id, "id-1");
	assert_eq!(phonemes.data(), Some(vec![("id-1".to_string(), null_phoneme("h"))]));
	assert_eq!(
		transport.invocations()[1],
		(
			"create_protolanguage_phoneme".to_string(),
			json!({"name": "P", "phoneme": {"ortho": "h", "primary": "Null", "allo": []}})
		)
	);
}

#[tokio::test]
async fn test_missing_phoneme_skips_refresh() {
	let transport = MemoryTransport::new();
	transport.reply("get_phonemes", json!([]));
	transport.reply("delete_phoneme", json!(false));
	let (editor, _) = lang_editor(&transport);

	let phonemes = editor.phonemes("Kab").unwrap();
	phonemes.settled().await;

	assert!(!editor.delete_phoneme("Kab", "gone").await.unwrap());
	assert_eq!(transport.calls("get_phonemes"), 1);
	assert_eq!(
		transport.invocations().last().unwrap().1,
		json!({"name": "Kab", "nameType": "Language", "id": "gone"})
	);
}

#[tokio::test]
async fn test_set_phoneme_during_list_fetch_shows_the_change() {
	let transport = MemoryTransport::new();
	let stored = Arc::new(Mutex::new(null_phoneme("h")));
	let reading = stored.clone();
	transport.handle("get_phonemes", move |_| {
		let phoneme = reading.lock().unwrap().clone();
		async move {
			tokio::time::sleep(Duration::from_millis(100)).await;
			Ok(json!([["id-1", phoneme]]))
		}
	});
	let writing = stored.clone();
	transport.handle("set_phoneme", move |args: Value| {
		let phoneme = data::phoneme().parse(&args["phoneme"]).unwrap();
		*writing.lock().unwrap() = phoneme;
		async move { Ok(json!(true)) }
	});
	let (editor, _) = lang_editor(&transport);

	let phonemes = editor.phonemes("Kab").unwrap();
	tokio::time::sleep(Duration::from_millis(10)).await;
	assert!(phonemes.is_loading());

	assert!(editor.set_phoneme("Kab", "id-1", &null_phoneme("x")).await.unwrap());

	let expected = Some(vec![("id-1".to_string(), null_phoneme("x"))]);
	assert_eq!(phonemes.data(), expected);
	assert_eq!(transport.calls("get_phonemes"), 2);

	tokio::time::sleep(Duration::from_millis(120)).await;
	assert_eq!(phonemes.data(), expected);
}
