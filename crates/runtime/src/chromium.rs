//! Chromium engine over the DevTools protocol.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
	EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use futures_util::{StreamExt, stream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::browser_finder::find_chrome_executable;
use crate::engine::{BrowserEngine, ControlHandle, IdleOptions, NavigationResponse, PageDriver};
use crate::error::{Error, Result};
use crate::network::NetworkTracker;

const NAVIGATION_STATUS_JS: &str = r#"(() => {
	const entry = performance.getEntriesByType('navigation')[0];
	return entry && entry.responseStatus ? entry.responseStatus : null;
})()"#;

/// Headroom of the CDP command timeout over the session deadlines, so an
/// expired wait surfaces as the session's timeout rather than a CDP error.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Launch parameters for [`ChromiumEngine`].
#[derive(Debug, Clone)]
pub struct LaunchOptions {
	pub headless: bool,
	/// Explicit browser binary; discovered on `PATH` and common locations when unset.
	pub executable: Option<PathBuf>,
	/// Per-command CDP timeout.
	pub request_timeout: Duration,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			headless: true,
			executable: None,
			request_timeout: Duration::from_secs(60) + REQUEST_TIMEOUT_MARGIN,
		}
	}
}

impl LaunchOptions {
	/// Sets the CDP command timeout to outlast `navigation_timeout`.
	pub fn outlasting(mut self, navigation_timeout: Duration) -> Self {
		self.request_timeout = navigation_timeout + REQUEST_TIMEOUT_MARGIN;
		self
	}
}

/// One Chromium process shared by every page of a run.
pub struct ChromiumEngine {
	browser: Mutex<Browser>,
	handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumEngine {
	pub async fn launch(options: LaunchOptions) -> Result<Self> {
		let mut builder = BrowserConfig::builder().request_timeout(options.request_timeout);
		if !options.headless {
			builder = builder.with_head();
		}
		if let Some(executable) = options.executable.clone().or_else(find_chrome_executable) {
			debug!(target = "tender.runtime", executable = %executable.display(), "using browser executable");
			builder = builder.chrome_executable(executable);
		}
		let config = builder.build().map_err(Error::Launch)?;

		let (browser, mut handler) = Browser::launch(config).await.map_err(|e| Error::Launch(e.to_string()))?;
		let task = tokio::spawn(async move {
			while let Some(event) = handler.next().await {
				if let Err(err) = event {
					debug!(target = "tender.runtime", error = %err, "cdp handler event error");
				}
			}
		});

		info!(target = "tender.runtime", headless = options.headless, "chromium launched");
		Ok(Self {
			browser: Mutex::new(browser),
			handler: Mutex::new(Some(task)),
		})
	}

	/// Closes the browser process and stops the CDP handler.
	pub async fn shutdown(&self) -> Result<()> {
		let mut browser = self.browser.lock().await;
		if let Err(err) = browser.close().await {
			warn!(target = "tender.runtime", error = %err, "browser close failed");
		}
		if let Err(err) = browser.wait().await {
			warn!(target = "tender.runtime", error = %err, "browser process wait failed");
		}
		if let Some(task) = self.handler.lock().await.take() {
			task.abort();
		}
		debug!(target = "tender.runtime", "chromium shut down");
		Ok(())
	}
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
	fn name(&self) -> &str {
		"chromium"
	}

	async fn new_page(&self) -> Result<Box<dyn PageDriver>> {
		let page = self
			.browser
			.lock()
			.await
			.new_page("about:blank")
			.await
			.map_err(|e| Error::Session(format!("failed to open page: {e}")))?;

		let network = Arc::new(NetworkTracker::new());
		let listener = ListenerGuard(track_requests(&page, Arc::clone(&network)).await?);
		Ok(Box::new(ChromiumPage {
			page,
			network,
			_listener: listener,
		}))
	}
}

enum RequestEvent {
	Started(String),
	Done(String),
}

/// Feeds the page's CDP network events into `network` until the page goes away.
async fn track_requests(page: &Page, network: Arc<NetworkTracker>) -> Result<JoinHandle<()>> {
	let subscribe = |e: chromiumoxide::error::CdpError| Error::Session(format!("network event subscription failed: {e}"));

	page.execute(EnableParams::default()).await.map_err(subscribe)?;
	let started = page
		.event_listener::<EventRequestWillBeSent>()
		.await
		.map_err(subscribe)?
		.map(|event| RequestEvent::Started(event.request_id.inner().clone()));
	let finished = page
		.event_listener::<EventLoadingFinished>()
		.await
		.map_err(subscribe)?
		.map(|event| RequestEvent::Done(event.request_id.inner().clone()));
	let failed = page
		.event_listener::<EventLoadingFailed>()
		.await
		.map_err(subscribe)?
		.map(|event| RequestEvent::Done(event.request_id.inner().clone()));

	let mut events = Box::pin(stream::select(started, stream::select(finished, failed)));
	Ok(tokio::spawn(async move {
		while let Some(event) = events.next().await {
			match event {
				RequestEvent::Started(id) => network.request_started(id),
				RequestEvent::Done(id) => network.request_finished(&id),
			}
		}
		trace!(target = "tender.runtime", "network event stream ended");
	}))
}

/// Stops the network listener when its page is released.
struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
	fn drop(&mut self) {
		self.0.abort();
	}
}

struct ChromiumPage {
	page: Page,
	network: Arc<NetworkTracker>,
	_listener: ListenerGuard,
}

impl ChromiumPage {
	async fn navigation_status(&self) -> Option<u16> {
		match self.page.evaluate(NAVIGATION_STATUS_JS).await {
			Ok(result) => result.into_value::<Option<u16>>().ok().flatten(),
			Err(err) => {
				debug!(target = "tender.runtime", error = %err, "navigation status unavailable");
				None
			}
		}
	}
}

#[async_trait]
impl PageDriver for ChromiumPage {
	async fn goto(&mut self, url: &str) -> Result<NavigationResponse> {
		self.network.reset();
		self.page.goto(url).await.map_err(|e| Error::navigation(url, e))?;
		let status = self.navigation_status().await;
		let final_url = self.page.url().await.ok().flatten().unwrap_or_else(|| url.to_string());
		Ok(NavigationResponse { url: final_url, status })
	}

	async fn wait_until_idle(&mut self, options: IdleOptions) -> Result<()> {
		let report = self.network.wait_for_quiet(options).await?;
		debug!(
			target = "tender.runtime",
			waited_ms = report.waited.as_millis() as u64,
			requests = report.requests_seen,
			"network idle"
		);
		Ok(())
	}

	async fn content(&mut self) -> Result<String> {
		self.page.content().await.map_err(|e| Error::Session(format!("failed to read page content: {e}")))
	}

	async fn current_url(&mut self) -> Result<String> {
		self.page
			.url()
			.await
			.map_err(|e| Error::Session(format!("failed to read page url: {e}")))?
			.ok_or_else(|| Error::Session("page has no url".to_string()))
	}

	async fn find_control(&mut self, selector: &str, label: &str) -> Result<Option<ControlHandle>> {
		let elements = self
			.page
			.find_elements(selector)
			.await
			.map_err(|e| Error::Session(format!("query {selector:?} failed: {e}")))?;

		for (index, element) in elements.iter().enumerate() {
			let text = element.inner_text().await.ok().flatten().unwrap_or_default();
			if text.trim() == label {
				return Ok(Some(ControlHandle {
					selector: selector.to_string(),
					label: label.to_string(),
					index,
				}));
			}
		}
		Ok(None)
	}

	async fn click(&mut self, control: &ControlHandle) -> Result<()> {
		let elements = self
			.page
			.find_elements(control.selector.as_str())
			.await
			.map_err(|e| Error::Session(format!("query {:?} failed: {e}", control.selector)))?;
		let element = elements
			.get(control.index)
			.ok_or_else(|| Error::Session(format!("control {:?} is no longer attached", control.label)))?;
		element
			.click()
			.await
			.map_err(|e| Error::Session(format!("click on {:?} failed: {e}", control.label)))?;
		Ok(())
	}

	async fn close(self: Box<Self>) -> Result<()> {
		self.page.close().await.map_err(|e| Error::Session(format!("failed to close page: {e}")))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_launch_is_headless() {
		let options = LaunchOptions::default();
		assert!(options.headless);
		assert!(options.executable.is_none());
	}

	#[test]
	fn cdp_timeout_outlasts_session_deadline() {
		let navigation = Duration::from_millis(1500);
		let options = LaunchOptions::default().outlasting(navigation);
		assert!(options.request_timeout > navigation);
		assert!(LaunchOptions::default().request_timeout > Duration::from_secs(60));
	}
}
