use std::path::PathBuf;

use kaboom_bridge::BridgeError;
use thiserror::Error;

/// Errors reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
	/// No per-user configuration directory on this platform.
	#[error("no configuration directory available")]
	NoConfigDir,

	/// Error reading or writing the settings file.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// Settings file path.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The settings file is not valid TOML.
	#[error("invalid settings in {path}: {error}")]
	Parse {
		/// Settings file path.
		path: PathBuf,
		/// Parser error.
		error: toml::de::Error,
	},

	/// Settings could not be rendered as TOML.
	#[error("cannot serialize settings: {0}")]
	Serialize(#[from] toml::ser::Error),
}

/// Errors surfaced by controllers.
#[derive(Debug, Error)]
pub enum ClientError {
	#[error(transparent)]
	Bridge(#[from] BridgeError),

	#[error(transparent)]
	Settings(#[from] SettingsError),

	/// Autosave interval outside the accepted range.
	#[error("autosave interval must be between {min} and {max} half-minutes, got {got}")]
	AutosaveOutOfRange {
		/// Requested interval.
		got: u32,
		/// Smallest accepted interval.
		min: u32,
		/// Largest accepted interval.
		max: u32,
	},
}

/// Result type for client operations.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
