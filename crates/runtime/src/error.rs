//! Error types for browser sessions.

use thiserror::Error;

/// Failures raised by the engine or a page session.
#[derive(Debug, Error)]
pub enum Error {
	#[error("browser launch failed: {0}")]
	Launch(String),

	#[error("navigation to {url} failed: {message}")]
	Navigation { url: String, message: String },

	#[error("timed out after {ms}ms waiting for {condition}")]
	Timeout { ms: u64, condition: String },

	#[error("session error: {0}")]
	Session(String),
}

impl Error {
	pub(crate) fn navigation(url: &str, message: impl std::fmt::Display) -> Self {
		Error::Navigation {
			url: url.to_string(),
			message: message.to_string(),
		}
	}

	/// Returns `true` for errors raised by an expired deadline.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}
}

pub type Result<T> = std::result::Result<T, Error>;
