//! Error types for the scrape pipeline.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Stable failure categories, shared by logs and the CLI envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	NavigationError,
	ExtractionError,
	PersistenceError,
	ConfigError,
	BrowserError,
}

impl ErrorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::NavigationError => "NavigationError",
			Self::ExtractionError => "ExtractionError",
			Self::PersistenceError => "PersistenceError",
			Self::ConfigError => "ConfigError",
			Self::BrowserError => "BrowserError",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("navigation to {url} failed: {message}")]
	Navigation { url: String, message: String },

	/// Expired navigation deadline; a navigation failure by kind.
	#[error("navigation to {url} timed out: {message}")]
	Timeout { url: String, message: String },

	#[error("extraction from {url} failed: {message}")]
	Extraction { url: String, message: String },

	#[error("snapshot storage failed at {}: {source}", .path.display())]
	Persistence {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid selector {selector:?}: {message}")]
	Selector { selector: String, message: String },

	#[error("configuration error: {0}")]
	Config(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Runtime(tender_runtime::Error),
}

impl Error {
	/// Maps a session failure while visiting `url` onto the pipeline taxonomy.
	///
	/// Launch failures stay runtime errors; everything else that keeps a page
	/// from loading is a navigation failure.
	pub fn from_session(url: &str, err: tender_runtime::Error) -> Self {
		use tender_runtime::Error as Rt;
		match err {
			Rt::Launch(_) => Error::Runtime(err),
			Rt::Navigation { message, .. } => Error::Navigation { url: url.to_string(), message },
			Rt::Timeout { .. } => Error::Timeout {
				url: url.to_string(),
				message: err.to_string(),
			},
			Rt::Session(message) => Error::Navigation { url: url.to_string(), message },
		}
	}

	pub(crate) fn extraction(url: &str, message: impl Into<String>) -> Self {
		Error::Extraction {
			url: url.to_string(),
			message: message.into(),
		}
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Navigation { .. } | Error::Timeout { .. } => ErrorKind::NavigationError,
			Error::Extraction { .. } => ErrorKind::ExtractionError,
			Error::Persistence { .. } => ErrorKind::PersistenceError,
			Error::Selector { .. } | Error::Config(_) | Error::Json(_) => ErrorKind::ConfigError,
			Error::Runtime(_) => ErrorKind::BrowserError,
		}
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn session_failures_become_navigation_errors() {
		let err = Error::from_session(
			"https://site/a",
			tender_runtime::Error::Navigation {
				url: "https://site/a".into(),
				message: "net::ERR_CONNECTION_RESET".into(),
			},
		);
		assert_eq!(err.kind(), ErrorKind::NavigationError);
		assert!(err.to_string().contains("ERR_CONNECTION_RESET"));
	}

	#[test]
	fn expired_deadline_is_a_navigation_failure() {
		let err = Error::from_session(
			"https://site/a",
			tender_runtime::Error::Timeout {
				ms: 60_000,
				condition: "navigation to https://site/a".into(),
			},
		);
		assert_eq!(err.kind(), ErrorKind::NavigationError);
		assert!(err.is_timeout());
		assert!(err.to_string().contains("60000ms"));
	}

	#[test]
	fn launch_failure_is_a_browser_error() {
		let err = Error::from_session("https://site/a", tender_runtime::Error::Launch("no chrome".into()));
		assert_eq!(err.kind(), ErrorKind::BrowserError);
		assert_eq!(err.kind().to_string(), "BrowserError");
	}

	#[test]
	fn persistence_error_names_the_path() {
		let err = Error::Persistence {
			path: PathBuf::from("/tmp/data.json"),
			source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
		};
		assert!(err.to_string().contains("/tmp/data.json"));
		assert_eq!(err.kind(), ErrorKind::PersistenceError);
	}
}
