use std::sync::Arc;

use kaboom_schema::{list, record, string};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf};

use super::*;

#[derive(Debug, Clone, PartialEq)]
struct Named {
	name: String,
}

fn named() -> impl kaboom_schema::Schema<Output = Named> {
	record("Named", |f| Ok(Named { name: f.required("name", &string())? }))
}

fn invoker(transport: &Arc<MemoryTransport>) -> Invoker {
	Invoker::new(transport.clone())
}

#[tokio::test]
async fn test_invoke_parses_reply() {
	let transport = MemoryTransport::new();
	transport.reply("get_all_protolanguages", json!(["Proto-A", "Proto-B"]));

	let names = invoker(&transport)
		.invoke("get_all_protolanguages", &list(string()), Value::Null)
		.await
		.unwrap();
	assert_eq!(names, vec!["Proto-A".to_string(), "Proto-B".to_string()]);
	assert_eq!(transport.invocations(), vec![("get_all_protolanguages".to_string(), json!({}))]);
}

#[tokio::test]
async fn test_invoke_surfaces_backend_message_verbatim() {
	let transport = MemoryTransport::new();
	transport.reject("save_language_group", "disk full");

	let err = invoker(&transport)
		.invoke_unit("save_language_group", json!({"name": "demo"}))
		.await
		.unwrap_err();
	assert!(matches!(&err, BridgeError::BackendInvocation { command, .. } if command == "save_language_group"));
	assert_eq!(err.to_string(), "disk full");
}

#[tokio::test]
async fn test_invoke_rejects_malformed_reply() {
	let transport = MemoryTransport::new();
	transport.reply("get_all_languages", json!(["a", 7]));

	let err = invoker(&transport)
		.invoke("get_all_languages", &list(string()), json!({}))
		.await
		.unwrap_err();
	let source = err.as_schema_error().expect("schema failure");
	assert_eq!(source.path.to_string(), "$[1]");
	assert_eq!(source.found, "integer");
}

#[tokio::test]
async fn test_invoke_requires_object_arguments() {
	let transport = MemoryTransport::new();
	transport.reply("get_language", json!({"name": "x"}));

	let err = invoker(&transport)
		.invoke("get_language", &named(), json!(["x"]))
		.await
		.unwrap_err();
	assert!(matches!(err, BridgeError::InvalidArguments { found: "array", .. }));
	assert_eq!(transport.calls("get_language"), 0);

	let parsed = invoker(&transport)
		.call(&CommandDescriptor::with_args("get_language", json!({"name": "x"})), &named())
		.await
		.unwrap();
	assert_eq!(parsed, Named { name: "x".into() });
}

#[tokio::test]
async fn test_invoke_unknown_command() {
	let transport = MemoryTransport::new();
	let err = invoker(&transport).invoke_unit("nope", Value::Null).await.unwrap_err();
	assert_eq!(err.to_string(), "unknown command `nope`");
}

#[test]
fn test_command_keys_ignore_member_order() {
	let a = CommandDescriptor::with_args("get_language", json!({"name": "x", "opts": {"b": 1, "a": [2, {"d": 0, "c": 1}]}}));
	let b = CommandDescriptor::with_args("get_language", json!({"opts": {"a": [2, {"c": 1, "d": 0}], "b": 1}, "name": "x"}));
	assert_eq!(a.key(), b.key());
	assert_eq!(a.key().to_string(), r#"cmd:get_language{"name":"x","opts":{"a":[2,{"c":1,"d":0}],"b":1}}"#);

	let other = CommandDescriptor::with_args("get_language", json!({"name": "y"}));
	assert_ne!(a.key(), other.key());
	assert_ne!(CacheKey::event("get_language"), CommandDescriptor::new("get_language").key());
	assert_eq!(CacheKey::event("all_languages").to_string(), "event:all_languages");
	assert_eq!(canonical_json(&json!({"k": "a\"b"})), r#"{"k":"a\"b"}"#);
}

#[tokio::test]
async fn test_memory_listener_deregisters_on_drop() {
	let transport = MemoryTransport::new();
	let mut first = transport.listen("all_languages").await.unwrap();
	let second = transport.listen("all_languages").await.unwrap();
	assert_eq!(first.event(), "all_languages");
	assert_eq!(transport.listener_count("all_languages"), 2);

	assert_eq!(transport.emit("all_languages", json!(["a"])), 2);
	assert_eq!(first.recv().await, Some(json!(["a"])));

	drop(second);
	assert_eq!(transport.listener_count("all_languages"), 1);
	drop(first);
	assert_eq!(transport.listener_count("all_languages"), 0);
	assert_eq!(transport.emit("all_languages", json!([])), 0);
}

#[tokio::test]
async fn test_memory_listen_failure() {
	let transport = MemoryTransport::new();
	transport.fail_listen("autosaved", "no event loop");
	let err = transport.listen("autosaved").await.unwrap_err();
	assert_eq!(err.to_string(), "cannot listen for `autosaved`: no event loop");
	assert_eq!(transport.listener_count("autosaved"), 0);
}

type BackendLines = Lines<BufReader<ReadHalf<DuplexStream>>>;

async fn next_message(lines: &mut BackendLines) -> Value {
	let line = lines.next_line().await.unwrap().expect("line from client");
	serde_json::from_str(&line).unwrap()
}

fn connect() -> (Arc<ProcessTransport>, BackendLines, tokio::io::WriteHalf<DuplexStream>) {
	let (client, backend) = tokio::io::duplex(4096);
	let (client_read, client_write) = tokio::io::split(client);
	let transport = ProcessTransport::connect(client_read, client_write);
	let (backend_read, backend_write) = tokio::io::split(backend);
	(transport, BufReader::new(backend_read).lines(), backend_write)
}

#[tokio::test]
async fn test_process_transport_matches_replies_by_id() {
	let (transport, mut lines, mut backend) = connect();

	let first = tokio::spawn({
		let transport = transport.clone();
		async move { transport.invoke("get_language", json!({"name": "x"})).await }
	});
	assert_eq!(
		next_message(&mut lines).await,
		json!({"type": "invoke", "id": 1, "command": "get_language", "args": {"name": "x"}})
	);

	let second = tokio::spawn({
		let transport = transport.clone();
		async move { transport.invoke("save_language_group", json!({"name": "demo"})).await }
	});
	assert_eq!(next_message(&mut lines).await["id"], json!(2));

	backend
		.write_all(b"{\"type\":\"reply\",\"id\":2,\"error\":\"disk full\"}\n{\"type\":\"reply\",\"id\":1,\"ok\":{\"name\":\"x\"}}\n")
		.await
		.unwrap();

	assert_eq!(first.await.unwrap().unwrap(), json!({"name": "x"}));
	let err = second.await.unwrap().unwrap_err();
	assert!(matches!(err, TransportError::Backend(ref message) if message == "disk full"));
}

#[tokio::test]
async fn test_process_transport_shares_backend_listener() {
	let (transport, mut lines, mut backend) = connect();

	let mut first = transport.listen("all_languages").await.unwrap();
	let mut second = transport.listen("all_languages").await.unwrap();
	assert_eq!(next_message(&mut lines).await, json!({"type": "listen", "event": "all_languages"}));

	backend
		.write_all(b"{\"type\":\"event\",\"event\":\"all_languages\",\"payload\":[\"a\"]}\n")
		.await
		.unwrap();
	assert_eq!(first.recv().await, Some(json!(["a"])));
	assert_eq!(second.recv().await, Some(json!(["a"])));

	drop(first);
	drop(second);
	assert_eq!(next_message(&mut lines).await, json!({"type": "unlisten", "event": "all_languages"}));
}

#[tokio::test]
async fn test_process_transport_fails_pending_on_disconnect() {
	let (transport, mut lines, backend) = connect();

	let pending = tokio::spawn({
		let transport = transport.clone();
		async move { transport.invoke("get_all_languages", Value::Null).await }
	});
	next_message(&mut lines).await;

	drop(lines);
	drop(backend);

	assert!(matches!(pending.await.unwrap(), Err(TransportError::Disconnected)));
	assert!(transport.is_closed());
	assert!(matches!(
		transport.invoke("get_all_languages", json!({})).await,
		Err(TransportError::Disconnected)
	));
	assert!(matches!(
		transport.listen("autosaved").await,
		Err(TransportError::ListenerSetup { .. })
	));
}
