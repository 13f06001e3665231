//! Browser capability seam.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of a top-level navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResponse {
	/// URL the page settled on after redirects.
	pub url: String,
	/// HTTP status of the main document, when the engine can report it.
	pub status: Option<u16>,
}

impl NavigationResponse {
	/// Returns `true` for 4xx/5xx document responses.
	pub fn is_error_status(&self) -> bool {
		self.status.is_some_and(|status| status >= 400)
	}
}

/// Network-idle wait parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleOptions {
	/// How long nothing may be in flight before the page counts as idle.
	pub idle: Duration,
	/// Upper bound for the whole wait.
	pub timeout: Duration,
}

/// A clickable element located by selector and visible label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlHandle {
	pub selector: String,
	pub label: String,
	/// Position among the elements matching `selector`.
	pub index: usize,
}

/// One open browser page.
#[async_trait]
pub trait PageDriver: Send {
	/// Navigates the page and waits for the document load.
	async fn goto(&mut self, url: &str) -> Result<NavigationResponse>;

	/// Resolves once no request has been in flight for `options.idle`.
	async fn wait_until_idle(&mut self, options: IdleOptions) -> Result<()>;

	/// Serialized DOM of the current document.
	async fn content(&mut self) -> Result<String>;

	async fn current_url(&mut self) -> Result<String>;

	/// Finds the first element matching `selector` whose trimmed visible text equals `label`.
	async fn find_control(&mut self, selector: &str, label: &str) -> Result<Option<ControlHandle>>;

	/// Clicks a control previously returned by [`PageDriver::find_control`].
	async fn click(&mut self, control: &ControlHandle) -> Result<()>;

	/// Releases the page and everything attached to it.
	async fn close(self: Box<Self>) -> Result<()>;
}

/// Factory for pages backed by one browser instance.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
	fn name(&self) -> &str;

	async fn new_page(&self) -> Result<Box<dyn PageDriver>>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_status_covers_client_and_server_errors() {
		let response = |status| NavigationResponse {
			url: "https://example.com".into(),
			status,
		};
		assert!(!response(None).is_error_status());
		assert!(!response(Some(200)).is_error_status());
		assert!(!response(Some(304)).is_error_status());
		assert!(response(Some(404)).is_error_status());
		assert!(response(Some(503)).is_error_status());
	}
}
