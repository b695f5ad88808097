//! Client-local settings, stored as TOML next to other per-user config.
//!
//! ```toml
//! autosave = 4        # half-minutes between autosaves, 1 to 20
//! dark-mode = "dark"  # or "light"
//! ```
//!
//! Out-of-range or mistyped values fall back to their defaults instead of
//! failing the load; only a file that is not TOML at all is an error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SettingsError;
use crate::{Backend, ClientError, Result};

/// Shortest autosave interval, in half-minutes.
pub const AUTOSAVE_MIN: u32 = 1;
/// Longest autosave interval, in half-minutes.
pub const AUTOSAVE_MAX: u32 = 20;
pub const AUTOSAVE_DEFAULT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
	#[default]
	Light,
	Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
	/// Autosave interval in half-minutes.
	pub autosave: u32,
	pub dark_mode: DarkMode,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			autosave: AUTOSAVE_DEFAULT,
			dark_mode: DarkMode::default(),
		}
	}
}

/// File shape before sanitizing; every key is optional and loosely typed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct StoredSettings {
	autosave: Option<toml::Value>,
	dark_mode: Option<toml::Value>,
}

impl Settings {
	fn parse(input: &str, path: &Path) -> Result<Self, SettingsError> {
		let stored: StoredSettings = toml::from_str(input).map_err(|error| SettingsError::Parse {
			path: path.to_path_buf(),
			error,
		})?;

		let autosave = match stored.autosave {
			None => AUTOSAVE_DEFAULT,
			Some(toml::Value::Integer(n)) if (i64::from(AUTOSAVE_MIN)..=i64::from(AUTOSAVE_MAX)).contains(&n) => n as u32,
			Some(other) => {
				warn!(path = %path.display(), value = %other, "client.settings.invalid_autosave");
				AUTOSAVE_DEFAULT
			}
		};
		let dark_mode = match stored.dark_mode {
			None => DarkMode::default(),
			Some(value) => value.clone().try_into().unwrap_or_else(|_| {
				warn!(path = %path.display(), %value, "client.settings.invalid_dark_mode");
				DarkMode::default()
			}),
		};
		Ok(Self { autosave, dark_mode })
	}

	/// Loads settings from `path`; a missing file yields the defaults.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		match std::fs::read_to_string(path) {
			Ok(content) => Self::parse(&content, path),
			Err(error) if error.kind() == ErrorKind::NotFound => {
				debug!(path = %path.display(), "client.settings.missing");
				Ok(Self::default())
			}
			Err(error) => Err(SettingsError::Io {
				path: path.to_path_buf(),
				error,
			}),
		}
	}

	/// Writes settings to `path`, creating its directory if needed.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
		let path = path.as_ref();
		let content = toml::to_string(self)?;
		let io = |error| SettingsError::Io {
			path: path.to_path_buf(),
			error,
		};
		if let Some(dir) = path.parent() {
			std::fs::create_dir_all(dir).map_err(io)?;
		}
		std::fs::write(path, content).map_err(io)
	}

	pub fn autosave_interval(&self) -> Duration {
		from_half_minutes(self.autosave)
	}
}

/// `<config dir>/kaboom/settings.toml`.
pub fn default_path() -> Result<PathBuf, SettingsError> {
	dirs::config_dir()
		.map(|dir| dir.join("kaboom").join("settings.toml"))
		.ok_or(SettingsError::NoConfigDir)
}

fn from_half_minutes(n: u32) -> Duration {
	Duration::from_secs(u64::from(n) * 30)
}

/// Renders whole minutes and seconds, e.g. `1 minute, 30 seconds`.
pub fn format_duration(duration: Duration) -> String {
	let total = duration.as_secs();
	let (minutes, seconds) = (total / 60, total % 60);
	let unit = |n: u64, name: &str| {
		if n == 1 {
			format!("1 {name}")
		} else {
			format!("{n} {name}s")
		}
	};
	match (minutes, seconds) {
		(0, s) => unit(s, "second"),
		(m, 0) => unit(m, "minute"),
		(m, s) => format!("{}, {}", unit(m, "minute"), unit(s, "second")),
	}
}

/// Restarts the backend autosave service every `half_minutes` and persists
/// the interval to `path`.
///
/// Out-of-range intervals are rejected before anything reaches the backend.
pub async fn apply_autosave(backend: &Backend, settings: &mut Settings, path: &Path, half_minutes: u32) -> Result<()> {
	if !(AUTOSAVE_MIN..=AUTOSAVE_MAX).contains(&half_minutes) {
		return Err(ClientError::AutosaveOutOfRange {
			got: half_minutes,
			min: AUTOSAVE_MIN,
			max: AUTOSAVE_MAX,
		});
	}
	backend.init_autosave_service(half_minutes).await?;
	settings.autosave = half_minutes;
	settings.save(path)?;
	debug!(
		half_minutes,
		every = %format_duration(settings.autosave_interval()),
		"client.settings.autosave_applied"
	);
	Ok(())
}
