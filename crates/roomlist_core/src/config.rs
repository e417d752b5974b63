#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use serde::Deserialize;
use tracing::info;

/// Default config path: `~/.roomlist/config.toml`.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
	let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
	Ok(home.join(".roomlist").join("config.toml"))
}

/// Load the room list config from TOML and env overrides.
pub fn load_room_list_config() -> anyhow::Result<RoomListConfig> {
	let path = default_config_path()?;
	load_room_list_config_from_path(&path)
}

/// Same as `load_room_list_config` but with an explicit config path.
pub fn load_room_list_config_from_path(path: &Path) -> anyhow::Result<RoomListConfig> {
	let file_cfg = read_toml_if_exists(path)
		.with_context(|| format!("read config from {}", path.display()))?
		.unwrap_or_default();

	let mut cfg = RoomListConfig::from_file(file_cfg);

	apply_env_overrides(&mut cfg);

	Ok(cfg)
}

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_POSTPONES: u32 = 60;
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;
pub const DEFAULT_INTENT_CAPACITY: usize = 32;

/// Room list settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomListConfig {
	/// Trailing debounce window for recomputes.
	pub debounce: Duration,
	/// Debounce windows a pending refresh may be postponed before it is forced through.
	pub max_postpones: u32,
	/// Filter legacy conference-call rooms out of every section.
	pub hide_conference_rooms: bool,
	/// User id prefix of the conference bot, if any.
	pub conference_user_prefix: Option<String>,
	pub event_bus_capacity: usize,
	pub intent_capacity: usize,
}

impl Default for RoomListConfig {
	fn default() -> Self {
		Self {
			debounce: DEFAULT_DEBOUNCE,
			max_postpones: DEFAULT_MAX_POSTPONES,
			hide_conference_rooms: true,
			conference_user_prefix: None,
			event_bus_capacity: DEFAULT_EVENT_BUS_CAPACITY,
			intent_capacity: DEFAULT_INTENT_CAPACITY,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
	#[serde(default)]
	room_list: FileRoomListSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileRoomListSettings {
	debounce_ms: Option<u64>,
	max_postpones: Option<u32>,
	hide_conference_rooms: Option<bool>,
	conference_user_prefix: Option<String>,
	event_bus_capacity: Option<usize>,
	intent_capacity: Option<usize>,
}

impl RoomListConfig {
	fn from_file(file: FileConfig) -> Self {
		let s = file.room_list;
		Self {
			debounce: s.debounce_ms.map(Duration::from_millis).unwrap_or(DEFAULT_DEBOUNCE),
			max_postpones: s.max_postpones.filter(|v| *v > 0).unwrap_or(DEFAULT_MAX_POSTPONES),
			hide_conference_rooms: s.hide_conference_rooms.unwrap_or(true),
			conference_user_prefix: s.conference_user_prefix.filter(|s| !s.trim().is_empty()),
			event_bus_capacity: s
				.event_bus_capacity
				.filter(|v| *v > 0)
				.unwrap_or(DEFAULT_EVENT_BUS_CAPACITY),
			intent_capacity: s.intent_capacity.filter(|v| *v > 0).unwrap_or(DEFAULT_INTENT_CAPACITY),
		}
	}
}

fn parse_env_bool(v: &str) -> Option<bool> {
	match v.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

fn read_toml_if_exists(path: &Path) -> anyhow::Result<Option<FileConfig>> {
	match fs::read_to_string(path) {
		Ok(s) => {
			let cfg: FileConfig = toml::from_str(&s).context("parse TOML")?;
			Ok(Some(cfg))
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
		Err(e) => Err(anyhow!(e).context("read config file")),
	}
}

fn apply_env_overrides(cfg: &mut RoomListConfig) {
	if let Ok(v) = std::env::var("ROOMLIST_DEBOUNCE_MS")
		&& let Ok(debounce_ms) = v.trim().parse::<u64>()
	{
		cfg.debounce = Duration::from_millis(debounce_ms);
		info!(debounce_ms, "room list config: debounce overridden by env");
	}

	if let Ok(v) = std::env::var("ROOMLIST_MAX_POSTPONES")
		&& let Ok(max_postpones) = v.trim().parse::<u32>()
		&& max_postpones > 0
	{
		cfg.max_postpones = max_postpones;
		info!(max_postpones, "room list config: max_postpones overridden by env");
	}

	if let Ok(v) = std::env::var("ROOMLIST_HIDE_CONFERENCE_ROOMS")
		&& let Some(hide) = parse_env_bool(&v)
	{
		cfg.hide_conference_rooms = hide;
		info!(hide, "room list config: hide_conference_rooms overridden by env");
	}

	if let Ok(v) = std::env::var("ROOMLIST_CONFERENCE_USER_PREFIX") {
		let v = v.trim().to_string();
		if !v.is_empty() {
			cfg.conference_user_prefix = Some(v);
			info!("room list config: conference_user_prefix overridden by env");
		}
	}

	if let Ok(v) = std::env::var("ROOMLIST_EVENT_BUS_CAPACITY")
		&& let Ok(capacity) = v.trim().parse::<usize>()
		&& capacity > 0
	{
		cfg.event_bus_capacity = capacity;
		info!(capacity, "room list config: event_bus_capacity overridden by env");
	}

	if let Ok(v) = std::env::var("ROOMLIST_INTENT_CAPACITY")
		&& let Ok(capacity) = v.trim().parse::<usize>()
		&& capacity > 0
	{
		cfg.intent_capacity = capacity;
		info!(capacity, "room list config: intent_capacity overridden by env");
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write as _;

	use super::*;

	#[test]
	fn missing_file_gives_defaults() {
		let td = tempfile::tempdir().expect("tempdir");
		let file = read_toml_if_exists(&td.path().join("nope.toml")).unwrap();
		assert!(file.is_none());
		assert_eq!(RoomListConfig::from_file(FileConfig::default()), RoomListConfig::default());
	}

	#[test]
	fn file_values_are_applied() {
		let mut f = tempfile::NamedTempFile::new().expect("tempfile");
		writeln!(
			f,
			"[room_list]\ndebounce_ms = 50\nmax_postpones = 4\nhide_conference_rooms = false\nconference_user_prefix = \"@fs_\"\nevent_bus_capacity = 8"
		)
		.unwrap();

		let file = read_toml_if_exists(f.path()).unwrap().unwrap();
		let cfg = RoomListConfig::from_file(file);
		assert_eq!(cfg.debounce, Duration::from_millis(50));
		assert_eq!(cfg.max_postpones, 4);
		assert!(!cfg.hide_conference_rooms);
		assert_eq!(cfg.conference_user_prefix.as_deref(), Some("@fs_"));
		assert_eq!(cfg.event_bus_capacity, 8);
		assert_eq!(cfg.intent_capacity, DEFAULT_INTENT_CAPACITY);
	}

	#[test]
	fn zero_and_blank_values_fall_back() {
		let file: FileConfig = toml::from_str(
			"[room_list]\nmax_postpones = 0\nevent_bus_capacity = 0\nconference_user_prefix = \"  \"",
		)
		.unwrap();
		let cfg = RoomListConfig::from_file(file);
		assert_eq!(cfg.max_postpones, DEFAULT_MAX_POSTPONES);
		assert_eq!(cfg.event_bus_capacity, DEFAULT_EVENT_BUS_CAPACITY);
		assert_eq!(cfg.conference_user_prefix, None);
	}

	#[test]
	fn malformed_file_is_an_error() {
		let mut f = tempfile::NamedTempFile::new().expect("tempfile");
		writeln!(f, "[room_list\ndebounce_ms = ").unwrap();
		let err = read_toml_if_exists(f.path()).unwrap_err();
		assert!(format!("{err:#}").contains("parse TOML"));
	}

	#[test]
	fn env_bool_parsing() {
		assert_eq!(parse_env_bool(" Yes "), Some(true));
		assert_eq!(parse_env_bool("off"), Some(false));
		assert_eq!(parse_env_bool("maybe"), None);
	}
}
