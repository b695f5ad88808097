//! Child process transport speaking newline-delimited JSON over stdio.
//!
//! Outbound lines are `invoke`, `listen` and `unlisten` messages; inbound
//! lines are `reply` and `event` messages. Replies are matched to callers by
//! id. Local listeners for one event share a single backend registration.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::fanout::Fanout;
use crate::{Listener, Registration, Transport, TransportError};

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Outbound<'a> {
	Invoke { id: u64, command: &'a str, args: &'a Value },
	Listen { event: &'a str },
	Unlisten { event: &'a str },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Inbound {
	Reply {
		id: u64,
		#[serde(default)]
		ok: Option<Value>,
		#[serde(default)]
		error: Option<String>,
	},
	Event {
		event: String,
		#[serde(default)]
		payload: Value,
	},
}

type PendingReply = oneshot::Sender<Result<Value, TransportError>>;

#[derive(Default)]
struct State {
	closed: bool,
	pending: HashMap<u64, PendingReply>,
	listeners: Fanout,
}

struct Shared {
	next_id: AtomicU64,
	outbound: mpsc::UnboundedSender<String>,
	state: Mutex<State>,
}

impl Shared {
	fn send(&self, message: &Outbound<'_>) -> Result<(), TransportError> {
		let line = serde_json::to_string(message).map_err(|e| TransportError::Protocol(e.to_string()))?;
		self.outbound.send(line).map_err(|_| TransportError::Disconnected)
	}

	fn dispatch(&self, line: &str) {
		let message: Inbound = match serde_json::from_str(line) {
			Ok(message) => message,
			Err(err) => {
				warn!(error = %err, line, "bridge.process.malformed_line");
				return;
			}
		};

		match message {
			Inbound::Reply { id, ok, error } => {
				let Some(reply) = self.state.lock().pending.remove(&id) else {
					debug!(id, "bridge.process.reply_without_caller");
					return;
				};
				let result = match error {
					Some(message) => Err(TransportError::Backend(message)),
					None => Ok(ok.unwrap_or(Value::Null)),
				};
				let _ = reply.send(result);
			}
			Inbound::Event { event, payload } => {
				let delivered = self.state.lock().listeners.deliver(&event, &payload);
				if delivered == 0 {
					debug!(event, "bridge.process.event_without_listener");
				}
			}
		}
	}

	fn close(&self) {
		let mut state = self.state.lock();
		state.closed = true;
		for (_, reply) in state.pending.drain() {
			let _ = reply.send(Err(TransportError::Disconnected));
		}
		state.listeners.clear();
	}
}

/// Transport to a backend running as a child process (or any duplex byte stream).
pub struct ProcessTransport {
	shared: Arc<Shared>,
	tasks: Vec<JoinHandle<()>>,
	_child: Option<Child>,
}

impl ProcessTransport {
	/// Spawns `program` with piped stdio and connects to it.
	///
	/// The child is killed when the transport is dropped.
	pub fn spawn<I, S>(program: impl AsRef<OsStr>, args: I) -> Result<Arc<Self>, TransportError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<OsStr>,
	{
		let program = program.as_ref();
		let mut child = Command::new(program)
			.args(args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()?;

		let stdin = child.stdin.take().ok_or_else(|| io::Error::other("child stdin is not piped"))?;
		let stdout = child.stdout.take().ok_or_else(|| io::Error::other("child stdout is not piped"))?;
		let stderr = child.stderr.take().ok_or_else(|| io::Error::other("child stderr is not piped"))?;

		info!(program = %program.to_string_lossy(), pid = child.id(), "bridge.process.spawned");

		let stderr_task = tokio::spawn(async move {
			let mut lines = BufReader::new(stderr).lines();
			while let Ok(Some(line)) = lines.next_line().await {
				warn!(stderr = %line, "bridge.process.stderr");
			}
		});

		let mut transport = Self::start(stdout, stdin);
		transport.tasks.push(stderr_task);
		transport._child = Some(child);
		Ok(Arc::new(transport))
	}

	/// Connects to a backend over an already open reader/writer pair.
	pub fn connect<R, W>(reader: R, writer: W) -> Arc<Self>
	where
		R: AsyncRead + Unpin + Send + 'static,
		W: AsyncWrite + Unpin + Send + 'static,
	{
		Arc::new(Self::start(reader, writer))
	}

	fn start<R, W>(reader: R, mut writer: W) -> Self
	where
		R: AsyncRead + Unpin + Send + 'static,
		W: AsyncWrite + Unpin + Send + 'static,
	{
		let (outbound, mut lines_rx) = mpsc::unbounded_channel::<String>();
		let shared = Arc::new(Shared {
			next_id: AtomicU64::new(1),
			outbound,
			state: Mutex::new(State::default()),
		});

		let writer_task = tokio::spawn(async move {
			while let Some(mut line) = lines_rx.recv().await {
				line.push('\n');
				let written = async {
					writer.write_all(line.as_bytes()).await?;
					writer.flush().await
				};
				if let Err(err) = written.await {
					warn!(error = %err, "bridge.process.write_failed");
					break;
				}
			}
		});

		let reader_shared = Arc::clone(&shared);
		let reader_task = tokio::spawn(async move {
			let mut lines = BufReader::new(reader).lines();
			loop {
				match lines.next_line().await {
					Ok(Some(line)) if line.trim().is_empty() => {}
					Ok(Some(line)) => reader_shared.dispatch(&line),
					Ok(None) => break,
					Err(err) => {
						warn!(error = %err, "bridge.process.read_failed");
						break;
					}
				}
			}
			info!("bridge.process.disconnected");
			reader_shared.close();
		});

		Self {
			shared,
			tasks: vec![writer_task, reader_task],
			_child: None,
		}
	}

	/// True once the backend's output stream has ended.
	pub fn is_closed(&self) -> bool {
		self.shared.state.lock().closed
	}
}

impl Drop for ProcessTransport {
	fn drop(&mut self) {
		for task in &self.tasks {
			task.abort();
		}
	}
}

#[async_trait]
impl Transport for ProcessTransport {
	async fn invoke(&self, command: &str, args: Value) -> Result<Value, TransportError> {
		let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
		let (tx, rx) = oneshot::channel();
		{
			let mut state = self.shared.state.lock();
			if state.closed {
				return Err(TransportError::Disconnected);
			}
			state.pending.insert(id, tx);
		}

		if let Err(err) = self.shared.send(&Outbound::Invoke {
			id,
			command,
			args: &args,
		}) {
			self.shared.state.lock().pending.remove(&id);
			return Err(err);
		}

		debug!(id, command, "bridge.process.invoke");
		rx.await.unwrap_or(Err(TransportError::Disconnected))
	}

	async fn listen(&self, event: &str) -> Result<Listener, TransportError> {
		let (id, rx) = {
			let mut state = self.shared.state.lock();
			if state.closed {
				return Err(TransportError::ListenerSetup {
					event: event.to_string(),
					reason: TransportError::Disconnected.to_string(),
				});
			}
			let (id, rx, first) = state.listeners.add(event);
			if first {
				if let Err(err) = self.shared.send(&Outbound::Listen { event }) {
					state.listeners.remove(event, id);
					return Err(TransportError::ListenerSetup {
						event: event.to_string(),
						reason: err.to_string(),
					});
				}
			}
			(id, rx)
		};

		let shared: Weak<Shared> = Arc::downgrade(&self.shared);
		let name = event.to_string();
		let registration = Registration::new(move || {
			let Some(shared) = shared.upgrade() else {
				return;
			};
			let mut state = shared.state.lock();
			if state.listeners.remove(&name, id) && !state.closed {
				let _ = shared.send(&Outbound::Unlisten { event: &name });
			}
		});

		Ok(Listener::new(event, rx, registration))
	}
}
