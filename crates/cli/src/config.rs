//! Layered run configuration: built-in defaults, then an optional JSON
//! config file, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tender::{DEFAULT_ENTRY_URL, DEFAULT_SNAPSHOT_PATH, RunOptions, SelectorTable};
use tender_runtime::{LaunchOptions, SessionOptions};
use thiserror::Error;
use tracing::debug;

use crate::cli::RunArgs;

const CONFIG_DIR: &str = "tender";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("cannot read config file {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config file {}: {source}", .path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("{0}")]
	Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	pub entry_url: String,
	pub output: PathBuf,
	pub incremental: bool,
	pub max_pages: Option<usize>,
	pub navigation_timeout_ms: u64,
	pub idle_ms: u64,
	pub settle_ms: u64,
	pub headless: bool,
	pub chrome_executable: Option<PathBuf>,
	pub selectors_file: Option<PathBuf>,
	pub notify: NotifyConfig,
	/// File the values were loaded from, if any.
	#[serde(skip)]
	pub source: Option<PathBuf>,
}

/// Completion signal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotifyConfig {
	pub enabled: bool,
	/// Program and arguments spawned on completion; the terminal bell when unset.
	pub command: Option<Vec<String>>,
}

impl Default for NotifyConfig {
	fn default() -> Self {
		Self { enabled: true, command: None }
	}
}

impl Default for Config {
	fn default() -> Self {
		let session = SessionOptions::default();
		Self {
			entry_url: DEFAULT_ENTRY_URL.to_string(),
			output: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
			incremental: false,
			max_pages: None,
			navigation_timeout_ms: session.navigation_timeout.as_millis() as u64,
			idle_ms: session.idle_window.as_millis() as u64,
			settle_ms: session.settle_delay.as_millis() as u64,
			headless: true,
			chrome_executable: None,
			selectors_file: None,
			notify: NotifyConfig::default(),
			source: None,
		}
	}
}

/// `<config dir>/tender/config.json`, e.g. `~/.config/tender/config.json` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

impl Config {
	/// Loads `explicit` when given (it must exist), otherwise the default
	/// config file when present, otherwise built-in defaults.
	pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
		match explicit {
			Some(path) => Self::from_file(path),
			None => match default_config_path().filter(|path| path.is_file()) {
				Some(path) => Self::from_file(&path),
				None => Ok(Self::default()),
			},
		}
	}

	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		let mut config: Config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		config.source = Some(path.to_path_buf());
		debug!(target = "tender.config", path = %path.display(), "loaded config file");
		Ok(config)
	}

	/// Applies run flags on top of the loaded values.
	pub fn apply_run_args(&mut self, args: &RunArgs) {
		if let Some(url) = &args.entry_url {
			self.entry_url = url.clone();
		}
		if let Some(output) = &args.output {
			self.output = output.clone();
		}
		if args.incremental {
			self.incremental = true;
		}
		if args.max_pages.is_some() {
			self.max_pages = args.max_pages;
		}
		if let Some(ms) = args.nav_timeout_ms {
			self.navigation_timeout_ms = ms;
		}
		if let Some(ms) = args.idle_ms {
			self.idle_ms = ms;
		}
		if let Some(ms) = args.settle_ms {
			self.settle_ms = ms;
		}
		if args.headful {
			self.headless = false;
		}
		if let Some(chrome) = &args.chrome {
			self.chrome_executable = Some(chrome.clone());
		}
		if let Some(selectors) = &args.selectors {
			self.selectors_file = Some(selectors.clone());
		}
		if args.no_notify {
			self.notify.enabled = false;
		}
		if !args.notify_command.is_empty() {
			self.notify.enabled = true;
			self.notify.command = Some(args.notify_command.clone());
		}
	}

	/// Rejects values no run could succeed with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let entry = self.entry_url.trim();
		if !(entry.starts_with("http://") || entry.starts_with("https://")) {
			return Err(ConfigError::Invalid(format!("entry URL must be http(s): {entry:?}")));
		}
		if self.navigation_timeout_ms == 0 {
			return Err(ConfigError::Invalid("navigation timeout must be positive".to_string()));
		}
		if self.max_pages == Some(0) {
			return Err(ConfigError::Invalid("max pages must be at least 1".to_string()));
		}
		if self.notify.command.as_ref().is_some_and(|argv| argv.is_empty()) {
			return Err(ConfigError::Invalid("notify command is empty".to_string()));
		}
		Ok(())
	}

	pub fn session_options(&self) -> SessionOptions {
		SessionOptions {
			navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
			idle_window: Duration::from_millis(self.idle_ms),
			settle_delay: Duration::from_millis(self.settle_ms),
		}
	}

	pub fn launch_options(&self) -> LaunchOptions {
		LaunchOptions {
			headless: self.headless,
			executable: self.chrome_executable.clone(),
			..LaunchOptions::default()
		}
		.outlasting(Duration::from_millis(self.navigation_timeout_ms))
	}

	pub fn run_options(&self) -> RunOptions {
		RunOptions {
			entry_url: self.entry_url.trim().to_string(),
			output: self.output.clone(),
			incremental: self.incremental,
			max_pages: self.max_pages,
		}
	}

	/// The configured selector table, or the built-in one.
	pub fn selector_table(&self, override_file: Option<&Path>) -> tender::Result<SelectorTable> {
		match override_file.or(self.selectors_file.as_deref()) {
			Some(path) => SelectorTable::from_file(path),
			None => Ok(SelectorTable::builtin().clone()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_pipeline_defaults() {
		let config = Config::default();
		assert_eq!(config.entry_url, DEFAULT_ENTRY_URL);
		assert_eq!(config.output, PathBuf::from("data/data.json"));
		assert_eq!(config.session_options(), SessionOptions::default());
		assert!(config.notify.enabled);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn file_values_override_defaults_and_flags_override_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, r#"{"output":"out/file.json","maxPages":4,"settleMs":250,"notify":{"command":["paplay","done.oga"]}}"#).unwrap();

		let mut config = Config::load(Some(&path)).unwrap();
		assert_eq!(config.output, PathBuf::from("out/file.json"));
		assert_eq!(config.max_pages, Some(4));
		assert_eq!(config.idle_ms, 500);
		assert_eq!(config.source.as_deref(), Some(path.as_path()));

		config.apply_run_args(&RunArgs {
			max_pages: Some(2),
			settle_ms: Some(10),
			headful: true,
			no_notify: true,
			..RunArgs::default()
		});
		assert_eq!(config.max_pages, Some(2));
		assert_eq!(config.settle_ms, 10);
		assert_eq!(config.output, PathBuf::from("out/file.json"));
		assert!(!config.headless);
		assert!(!config.notify.enabled);
	}

	#[test]
	fn cdp_timeout_outlasts_navigation_deadline() {
		let config = Config {
			navigation_timeout_ms: 2_000,
			..Config::default()
		};
		let launch = config.launch_options();
		assert!(launch.request_timeout > config.session_options().navigation_timeout);
	}

	#[test]
	fn notify_command_flag_replaces_configured_argv() {
		let mut config = Config::default();
		config.notify.enabled = false;
		config.apply_run_args(&RunArgs {
			notify_command: vec!["paplay".into(), "/tmp/My Sounds/done.oga".into()],
			..RunArgs::default()
		});
		assert!(config.notify.enabled);
		assert_eq!(config.notify.command, Some(vec!["paplay".to_string(), "/tmp/My Sounds/done.oga".to_string()]));
	}

	#[test]
	fn explicit_missing_file_is_an_error() {
		let err = Config::load(Some(Path::new("/definitely/missing/tender.json"))).unwrap_err();
		assert!(matches!(err, ConfigError::Read { .. }));
	}

	#[test]
	fn malformed_file_is_a_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, "{ not json").unwrap();
		assert!(matches!(Config::from_file(&path).unwrap_err(), ConfigError::Parse { .. }));
	}

	#[test]
	fn validation_rejects_unusable_values() {
		let config = Config {
			entry_url: "ftp://site".into(),
			..Config::default()
		};
		assert!(config.validate().is_err());

		let config = Config {
			max_pages: Some(0),
			..Config::default()
		};
		assert!(config.validate().is_err());
	}
}
