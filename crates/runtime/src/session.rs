//! Page sessions scoped to a single URL visit.
//!
//! A [`Session`] is only handed out once its page finished loading and the
//! network went quiet. Every wait is bounded by the navigation timeout, and
//! the page is released on every exit path: explicitly through
//! [`Session::close`], or from `Drop` when a caller bails out early.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{BrowserEngine, ControlHandle, IdleOptions, NavigationResponse, PageDriver};
use crate::error::{Error, Result};

/// Timing policy applied to every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
	/// Deadline for one navigation, one idle wait or one click.
	pub navigation_timeout: Duration,
	/// Quiet period that counts as network idle.
	pub idle_window: Duration,
	/// Fixed delay after an in-place page change, absorbing client-side re-render.
	pub settle_delay: Duration,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			navigation_timeout: Duration::from_secs(60),
			idle_window: Duration::from_millis(500),
			settle_delay: Duration::from_millis(1000),
		}
	}
}

impl SessionOptions {
	fn idle(&self) -> IdleOptions {
		IdleOptions {
			idle: self.idle_window,
			timeout: self.navigation_timeout,
		}
	}
}

/// Opens sessions against one shared engine.
#[derive(Clone)]
pub struct SessionManager {
	engine: Arc<dyn BrowserEngine>,
	options: SessionOptions,
}

impl SessionManager {
	pub fn new(engine: Arc<dyn BrowserEngine>, options: SessionOptions) -> Self {
		Self { engine, options }
	}

	pub fn options(&self) -> &SessionOptions {
		&self.options
	}

	pub fn engine_name(&self) -> &str {
		self.engine.name()
	}

	/// Opens a page at `url` and waits until it is loaded and idle.
	///
	/// The page is closed again before any error is returned.
	pub async fn open(&self, url: &str) -> Result<Session> {
		debug!(target = "tender.session", %url, engine = self.engine.name(), "opening session");
		let page = self.engine.new_page().await?;
		let mut session = Session {
			page: Some(page),
			url: url.to_string(),
			response: None,
			options: self.options.clone(),
		};

		match session.load().await {
			Ok(response) => {
				session.response = Some(response);
				Ok(session)
			}
			Err(err) => {
				session.close().await;
				Err(err)
			}
		}
	}
}

/// One open page.
pub struct Session {
	page: Option<Box<dyn PageDriver>>,
	url: String,
	response: Option<NavigationResponse>,
	options: SessionOptions,
}

impl Session {
	/// URL the session was opened for.
	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn response(&self) -> Option<&NavigationResponse> {
		self.response.as_ref()
	}

	pub async fn content(&mut self) -> Result<String> {
		self.page()?.content().await
	}

	pub async fn current_url(&mut self) -> Result<String> {
		self.page()?.current_url().await
	}

	pub async fn find_control(&mut self, selector: &str, label: &str) -> Result<Option<ControlHandle>> {
		self.page()?.find_control(selector, label).await
	}

	/// Clicks `control`, then waits for network idle plus the settle delay.
	pub async fn click_and_settle(&mut self, control: &ControlHandle) -> Result<()> {
		let timeout = self.options.navigation_timeout;
		let condition = format!("click on {:?}", control.label);
		let page = self.page()?;
		bounded(timeout, &condition, page.click(control)).await?;
		self.wait_until_idle().await?;
		tokio::time::sleep(self.options.settle_delay).await;
		Ok(())
	}

	pub async fn wait_until_idle(&mut self) -> Result<()> {
		let options = self.options.idle();
		let page = self.page()?;
		bounded(options.timeout, "network idle", page.wait_until_idle(options)).await
	}

	/// Releases the page. Close failures are logged, never raised.
	pub async fn close(mut self) {
		if let Some(page) = self.page.take() {
			match page.close().await {
				Ok(()) => debug!(target = "tender.session", url = %self.url, "session closed"),
				Err(err) => warn!(target = "tender.session", url = %self.url, error = %err, "session close failed"),
			}
		}
	}

	async fn load(&mut self) -> Result<NavigationResponse> {
		let url = self.url.clone();
		let timeout = self.options.navigation_timeout;
		let page = self.page()?;
		let response = bounded(timeout, &format!("navigation to {url}"), page.goto(&url)).await?;

		info!(target = "tender.session", %url, status = ?response.status, "response received");
		if response.is_error_status() {
			let status = response.status.unwrap_or_default();
			return Err(Error::Navigation {
				url,
				message: format!("server responded with HTTP {status}"),
			});
		}

		self.wait_until_idle().await?;
		Ok(response)
	}

	fn page(&mut self) -> Result<&mut Box<dyn PageDriver>> {
		self.page.as_mut().ok_or_else(|| Error::Session("session already closed".to_string()))
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		let Some(page) = self.page.take() else {
			return;
		};
		let url = std::mem::take(&mut self.url);
		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				handle.spawn(async move {
					if let Err(err) = page.close().await {
						warn!(target = "tender.session", %url, error = %err, "deferred session close failed");
					}
				});
			}
			Err(_) => warn!(target = "tender.session", %url, "session dropped outside a runtime; page leaked"),
		}
	}
}

async fn bounded<T>(timeout: Duration, condition: &str, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
	match tokio::time::timeout(timeout, fut).await {
		Ok(result) => result,
		Err(_) => Err(Error::Timeout {
			ms: timeout.as_millis() as u64,
			condition: condition.to_string(),
		}),
	}
}
