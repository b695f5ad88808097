//! Application-wide notifications.
//!
//! Only the latest notification is kept; showing a new one replaces it.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	Info,
	Warning,
	Error,
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Info => "info",
			Self::Warning => "warning",
			Self::Error => "error",
		})
	}
}

/// Follow-up a user can take from a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
	/// Open the merge dialog of the project view.
	OpenMergeDialog,
	/// Go to a route, e.g. `/proto/Proto-Kab/describe`.
	Navigate(String),
}

impl NotificationAction {
	/// Button label.
	pub fn label(&self) -> &'static str {
		match self {
			Self::OpenMergeDialog => "Merge",
			Self::Navigate(_) => "Go",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub severity: Severity,
	pub message: String,
	pub action: Option<NotificationAction>,
}

impl Notification {
	pub fn info(message: impl Into<String>) -> Self {
		Self {
			severity: Severity::Info,
			message: message.into(),
			action: None,
		}
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self {
			severity: Severity::Error,
			message: message.into(),
			action: None,
		}
	}

	pub fn with_action(mut self, action: NotificationAction) -> Self {
		self.action = Some(action);
		self
	}
}

/// Latest-notification channel shared by every controller.
#[derive(Clone)]
pub struct NotificationCenter {
	tx: Arc<watch::Sender<Option<Notification>>>,
}

impl Default for NotificationCenter {
	fn default() -> Self {
		Self::new()
	}
}

impl NotificationCenter {
	pub fn new() -> Self {
		Self {
			tx: Arc::new(watch::Sender::new(None)),
		}
	}

	/// Shows `notification`, replacing the current one.
	pub fn show(&self, notification: Notification) {
		match notification.severity {
			Severity::Error => warn!(message = %notification.message, "client.notify"),
			_ => info!(severity = %notification.severity, message = %notification.message, "client.notify"),
		}
		self.tx.send_replace(Some(notification));
	}

	/// Dismisses the current notification.
	pub fn dismiss(&self) {
		self.tx.send_replace(None);
	}

	pub fn current(&self) -> Option<Notification> {
		self.tx.borrow().clone()
	}

	/// Receiver that observes every notification shown from now on.
	pub fn watch(&self) -> watch::Receiver<Option<Notification>> {
		self.tx.subscribe()
	}
}
