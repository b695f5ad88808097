use std::sync::{Arc, Mutex};
use std::time::Duration;

use kaboom_bridge::{Invoker, MemoryTransport};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use super::*;
use crate::ClientError;

const FAMILY: &str = "0b7c53a4-5a7e-4c1e-9b7e-3f1f4d1e2a10";
const OTHER_FAMILY: &str = "9f0e6a2b-1c3d-4e5f-8a9b-0c1d2e3f4a5b";

/// Backend with an open project "demo" and two saved projects.
fn backend() -> (Arc<MemoryTransport>, Arc<Mutex<Vec<String>>>) {
	let transport = MemoryTransport::new();
	let saved = Arc::new(Mutex::new(vec!["alpha".to_string(), "beta".to_string()]));

	transport.reply("get_project_name", json!("demo"));
	transport.reply("get_family_id", json!(FAMILY));
	let listing = saved.clone();
	transport.handle("get_language_groups", move |_| {
		let names = listing.lock().unwrap().clone();
		async move { Ok(json!(names)) }
	});
	let deleting = saved.clone();
	transport.handle("delete_language_group", move |args: Value| {
		let filename = args["filename"].as_str().unwrap_or_default().to_string();
		deleting.lock().unwrap().retain(|name| *name != filename);
		async move { Ok(Value::Null) }
	});
	(transport, saved)
}

async fn controller(transport: &Arc<MemoryTransport>) -> (ProjectController, NotificationCenter) {
	let notifications = NotificationCenter::new();
	let cache = Cache::new(Invoker::new(transport.clone()));
	let project = ProjectController::new(cache, notifications.clone()).unwrap();
	project.name().settled().await;
	project.family_id().settled().await;
	project.groups().settled().await;
	(project, notifications)
}

/// Makes the saved-list read take 100ms, answering with the list as it
/// stood when the read began.
fn slow_listing(transport: &MemoryTransport, saved: &Arc<Mutex<Vec<String>>>) {
	let listing = saved.clone();
	transport.handle("get_language_groups", move |_| {
		let names = listing.lock().unwrap().clone();
		async move {
			tokio::time::sleep(Duration::from_millis(100)).await;
			Ok(json!(names))
		}
	});
}

fn names(values: &[&str]) -> Option<Vec<String>> {
	Some(values.iter().map(|v| v.to_string()).collect())
}

#[tokio::test]
async fn test_initial_state_is_fetched() {
	let (transport, _) = backend();
	let (project, notifications) = controller(&transport).await;

	assert_eq!(project.name().data().as_deref(), Some("demo"));
	assert_eq!(project.family_id().data().as_deref(), Some(FAMILY));
	assert_eq!(project.groups().data(), names(&["alpha", "beta"]));
	assert_eq!(notifications.current(), None);
}

#[tokio::test]
async fn test_delete_refetches_saved_list() {
	let (transport, saved) = backend();
	let (project, _) = controller(&transport).await;

	project.delete("alpha").await.unwrap();

	assert_eq!(project.groups().data(), names(&["beta"]));
	assert_eq!(*saved.lock().unwrap(), vec!["beta".to_string()]);
	assert_eq!(transport.calls("get_language_groups"), 2);
	assert!(
		transport
			.invocations()
			.contains(&("delete_language_group".to_string(), json!({"filename": "alpha"})))
	);
}

#[tokio::test]
async fn test_delete_during_list_fetch_shows_the_deletion() {
	let (transport, saved) = backend();
	slow_listing(&transport, &saved);
	let project = ProjectController::new(Cache::new(Invoker::new(transport.clone())), NotificationCenter::new()).unwrap();
	tokio::time::sleep(Duration::from_millis(10)).await;
	assert!(project.groups().is_loading());

	project.delete("alpha").await.unwrap();

	assert_eq!(project.groups().data(), names(&["beta"]));
	assert_eq!(transport.calls("get_language_groups"), 2);

	tokio::time::sleep(Duration::from_millis(120)).await;
	assert_eq!(project.groups().data(), names(&["beta"]));
}

#[tokio::test]
async fn test_save_during_list_fetch_shows_the_save() {
	let (transport, saved) = backend();
	slow_listing(&transport, &saved);
	let saving = saved.clone();
	transport.handle("save_language_group", move |args: Value| {
		let filename = args["filename"].as_str().unwrap_or_default().to_string();
		saving.lock().unwrap().push(filename);
		async move { Ok(Value::Null) }
	});
	let project = ProjectController::new(Cache::new(Invoker::new(transport.clone())), NotificationCenter::new()).unwrap();
	project.name().settled().await;
	tokio::time::sleep(Duration::from_millis(10)).await;
	assert!(project.groups().is_loading());

	project.save().await.unwrap();

	assert_eq!(project.groups().data(), names(&["alpha", "beta", "demo"]));
	assert_eq!(transport.calls("get_language_groups"), 2);

	tokio::time::sleep(Duration::from_millis(120)).await;
	assert_eq!(project.groups().data(), names(&["alpha", "beta", "demo"]));
}

#[tokio::test]
async fn test_failed_save_notifies_and_keeps_state() {
	let (transport, _) = backend();
	transport.reject("save_language_group", "disk full");
	let (project, notifications) = controller(&transport).await;

	let err = project.save().await.unwrap_err();

	assert!(matches!(err, ClientError::Bridge(_)));
	assert_eq!(err.to_string(), "disk full");
	assert_eq!(notifications.current(), Some(Notification::error("disk full")));
	let name = project.name().state();
	assert_eq!(name.data.as_deref(), Some("demo"));
	assert!(name.error.is_none());
	assert_eq!(transport.calls("get_language_groups"), 1);
}

#[tokio::test]
async fn test_save_uses_project_name() {
	let (transport, saved) = backend();
	let listing = saved.clone();
	transport.handle("save_language_group", move |args: Value| {
		let filename = args["filename"].as_str().unwrap_or_default().to_string();
		listing.lock().unwrap().push(filename);
		async move { Ok(Value::Null) }
	});
	let (project, notifications) = controller(&transport).await;

	project.save().await.unwrap();

	assert_eq!(notifications.current(), Some(Notification::info("Saved project demo")));
	assert_eq!(project.groups().data(), names(&["alpha", "beta", "demo"]));
}

#[tokio::test]
async fn test_epoch_offers_merge() {
	let (transport, _) = backend();
	let (project, notifications) = controller(&transport).await;
	transport.reply("epoch_language_group", Value::Null);
	transport.reply("get_project_name", json!("demo (epoch 1)"));

	project.epoch().await.unwrap();

	assert_eq!(project.name().data().as_deref(), Some("demo (epoch 1)"));
	let shown = notifications.current().unwrap();
	assert_eq!(shown.message, "Epoch created");
	assert_eq!(shown.action, Some(NotificationAction::OpenMergeDialog));
	assert_eq!(shown.action.unwrap().label(), "Merge");
}

#[tokio::test]
async fn test_load_switches_name_and_family() {
	let (transport, _) = backend();
	let (project, _) = controller(&transport).await;
	transport.reply("load_language_group", Value::Null);
	transport.reply("get_family_id", json!(OTHER_FAMILY));

	project.load("beta").await.unwrap();

	assert_eq!(project.name().data().as_deref(), Some("beta"));
	assert_eq!(project.family_id().data().as_deref(), Some(OTHER_FAMILY));
	assert!(
		transport
			.invocations()
			.contains(&("load_language_group".to_string(), json!({"filename": "beta"})))
	);
}

#[tokio::test]
async fn test_new_project_is_unnamed() {
	let (transport, _) = backend();
	let (project, _) = controller(&transport).await;
	transport.reply("new_language_group", Value::Null);
	transport.reply("set_project_name", Value::Null);
	transport.reply("get_family_id", json!(OTHER_FAMILY));

	project.new_project().await.unwrap();

	assert_eq!(project.name().data().as_deref(), Some(""));
	assert_eq!(project.family_id().data().as_deref(), Some(OTHER_FAMILY));
	assert!(
		transport
			.invocations()
			.contains(&("set_project_name".to_string(), json!({"name": ""})))
	);
}

#[tokio::test]
async fn test_failed_merge_is_not_notified() {
	let (transport, _) = backend();
	transport.reject("merge_language_group", "the project `gamma` does not exist");
	let (project, notifications) = controller(&transport).await;

	let err = project.merge("gamma").await.unwrap_err();

	assert_eq!(err.to_string(), "the project `gamma` does not exist");
	assert_eq!(notifications.current(), None);
}

#[tokio::test]
async fn test_autosave_events() {
	let (transport, _) = backend();
	let (project, _) = controller(&transport).await;

	let mut autosaves = project.autosaves().unwrap();
	transport.listening(keys::AUTOSAVED).await;
	transport.emit(keys::AUTOSAVED, json!({"name": "demo", "timestamp": "12:30"}));

	let record = autosaves.changed().await.data.unwrap();
	assert_eq!(record.name, "demo");
	assert_eq!(record.timestamp, "12:30");
}
