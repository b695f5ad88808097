//! Typed client of the kaboom conlang backend.
//!
//! [`Backend`] is the raw command surface. The controllers on top of it
//! ([`ProjectController`], [`LanguageEditor`]) keep their state in a shared
//! [`kaboom_bridge::Cache`] and report failures through a
//! [`NotificationCenter`]. [`Settings`] is the small amount of state kept on
//! the client side.

pub mod commands;
pub mod data;
pub mod editor;
pub mod error;
pub mod keys;
pub mod notify;
pub mod project;
pub mod settings;

pub use commands::Backend;
pub use editor::{EditorKind, LanguageEditor};
pub use error::{ClientError, Result, SettingsError};
pub use notify::{Notification, NotificationAction, NotificationCenter, Severity};
pub use project::ProjectController;
pub use settings::{DarkMode, Settings};
