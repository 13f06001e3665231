//! In-memory browser engine for tests and offline runs.
//!
//! Documents are registered per URL. A paginated URL holds a chain of
//! documents; clicking a control whose label is the page number `k` swaps the
//! open page to document `k` in place, the way a client-rendered listing does.
//!
//! A site registered with a response delay keeps one request in flight for
//! that long after every navigation and click, and only renders the new
//! document once the request completes.
//!
//! # Example
//!
//! ```ignore
//! let engine = Arc::new(
//!     FakeEngine::new()
//!         .with_paginated("https://site/list", vec![page_one, page_two])
//!         .with_page("https://site/a", detail_html),
//! );
//! let sessions = SessionManager::new(engine.clone(), SessionOptions::default());
//! // ... run the pipeline ...
//! assert_eq!(engine.stats().open_pages, 0);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use scraper::{Html, Selector};

use crate::engine::{BrowserEngine, ControlHandle, IdleOptions, NavigationResponse, PageDriver};
use crate::error::{Error, Result};
use crate::network::NetworkTracker;

#[derive(Debug, Clone)]
struct FakeSite {
	documents: Vec<String>,
	status: u16,
	navigation_failure: Option<String>,
	navigation_delay: Option<Duration>,
	response_delay: Option<Duration>,
	snapshot_failure: Option<String>,
	click_failures: HashMap<String, String>,
}

impl FakeSite {
	fn new(documents: Vec<String>) -> Self {
		Self {
			documents,
			status: 200,
			navigation_failure: None,
			navigation_delay: None,
			response_delay: None,
			snapshot_failure: None,
			click_failures: HashMap::new(),
		}
	}
}

/// Counters recorded across every page the engine handed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeStats {
	pub opened: usize,
	pub closed: usize,
	pub open_pages: usize,
	/// Highest number of simultaneously open pages.
	pub max_open: usize,
	/// URLs passed to `goto`, in order.
	pub visits: Vec<String>,
	/// Labels of successful control clicks, in order.
	pub clicks: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeState {
	sites: HashMap<String, FakeSite>,
	stats: FakeStats,
}

/// Engine serving registered documents without a browser.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
	state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a single-document page.
	pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
		self.with_paginated(url, vec![html.into()])
	}

	/// Registers a listing whose documents are switched in place by numbered controls.
	pub fn with_paginated(self, url: impl Into<String>, documents: Vec<String>) -> Self {
		self.state.lock().sites.insert(url.into(), FakeSite::new(documents));
		self
	}

	pub fn with_status(self, url: &str, status: u16) -> Self {
		self.update(url, |site| site.status = status);
		self
	}

	/// Makes every navigation to `url` fail.
	pub fn with_navigation_failure(self, url: &str, message: impl Into<String>) -> Self {
		let message = message.into();
		self.state
			.lock()
			.sites
			.entry(url.to_string())
			.or_insert_with(|| FakeSite::new(vec![String::new()]))
			.navigation_failure = Some(message);
		self
	}

	/// Delays the document load of `url`, for exercising navigation deadlines.
	pub fn with_navigation_delay(self, url: &str, delay: Duration) -> Self {
		self.update(url, |site| site.navigation_delay = Some(delay));
		self
	}

	/// Holds a request in flight for `delay` after each load or click of `url`;
	/// the document appears only when it completes.
	pub fn with_response_delay(self, url: &str, delay: Duration) -> Self {
		self.update(url, |site| site.response_delay = Some(delay));
		self
	}

	/// Makes reading the DOM of `url` fail after it loaded.
	pub fn with_snapshot_failure(self, url: &str, message: impl Into<String>) -> Self {
		let message = message.into();
		self.update(url, |site| site.snapshot_failure = Some(message));
		self
	}

	/// Makes clicking the control labeled `label` on `url` fail.
	pub fn with_click_failure(self, url: &str, label: &str, message: impl Into<String>) -> Self {
		let message = message.into();
		self.update(url, |site| {
			site.click_failures.insert(label.to_string(), message);
		});
		self
	}

	pub fn stats(&self) -> FakeStats {
		self.state.lock().stats.clone()
	}

	fn update(&self, url: &str, apply: impl FnOnce(&mut FakeSite)) {
		if let Some(site) = self.state.lock().sites.get_mut(url) {
			apply(site);
		}
	}
}

#[async_trait]
impl BrowserEngine for FakeEngine {
	fn name(&self) -> &str {
		"fake"
	}

	async fn new_page(&self) -> Result<Box<dyn PageDriver>> {
		let mut state = self.state.lock();
		let stats = &mut state.stats;
		stats.opened += 1;
		stats.open_pages += 1;
		stats.max_open = stats.max_open.max(stats.open_pages);
		Ok(Box::new(FakePage {
			state: Arc::clone(&self.state),
			view: Arc::new(Mutex::new(PageView::default())),
			network: Arc::new(NetworkTracker::new()),
			requests: 0,
		}))
	}
}

/// What the page currently shows. `document` is `None` until a response rendered.
#[derive(Debug, Default)]
struct PageView {
	url: Option<String>,
	document: Option<usize>,
}

struct FakePage {
	state: Arc<Mutex<FakeState>>,
	view: Arc<Mutex<PageView>>,
	network: Arc<NetworkTracker>,
	requests: u64,
}

impl FakePage {
	fn url(&self) -> Result<String> {
		self.view.lock().url.clone().ok_or_else(|| Error::Session("page has not navigated".to_string()))
	}

	fn site(&self) -> Result<FakeSite> {
		let url = self.url()?;
		self.state
			.lock()
			.sites
			.get(&url)
			.cloned()
			.ok_or_else(|| Error::Session(format!("no document registered for {url}")))
	}

	fn html(&self) -> Result<String> {
		let site = self.site()?;
		match self.view.lock().document {
			None => Ok("<html><head></head><body></body></html>".to_string()),
			Some(index) => site
				.documents
				.get(index)
				.cloned()
				.ok_or_else(|| Error::Session(format!("document {} missing", index + 1))),
		}
	}

	/// Renders `document` now, or once a delayed response completes.
	fn render(&mut self, document: usize, delay: Option<Duration>) {
		let Some(delay) = delay else {
			self.view.lock().document = Some(document);
			return;
		};

		self.requests += 1;
		let id = format!("fake-{}", self.requests);
		self.network.request_started(id.clone());
		let view = Arc::clone(&self.view);
		let network = Arc::clone(&self.network);
		tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			view.lock().document = Some(document);
			network.request_finished(&id);
		});
	}
}

#[async_trait]
impl PageDriver for FakePage {
	async fn goto(&mut self, url: &str) -> Result<NavigationResponse> {
		let site = {
			let mut state = self.state.lock();
			state.stats.visits.push(url.to_string());
			state.sites.get(url).cloned()
		};
		let site = site.ok_or_else(|| Error::navigation(url, "net::ERR_NAME_NOT_RESOLVED"))?;

		if let Some(delay) = site.navigation_delay {
			tokio::time::sleep(delay).await;
		}
		if let Some(message) = site.navigation_failure {
			return Err(Error::navigation(url, message));
		}

		self.network.reset();
		*self.view.lock() = PageView {
			url: Some(url.to_string()),
			document: None,
		};
		self.render(0, site.response_delay);
		Ok(NavigationResponse {
			url: url.to_string(),
			status: Some(site.status),
		})
	}

	async fn wait_until_idle(&mut self, options: IdleOptions) -> Result<()> {
		self.network.wait_for_quiet(options).await.map(|_| ())
	}

	async fn content(&mut self) -> Result<String> {
		if let Some(message) = self.site()?.snapshot_failure {
			return Err(Error::Session(message));
		}
		self.html()
	}

	async fn current_url(&mut self) -> Result<String> {
		self.url()
	}

	async fn find_control(&mut self, selector: &str, label: &str) -> Result<Option<ControlHandle>> {
		let html = self.html()?;
		let parsed = Selector::parse(selector).map_err(|e| Error::Session(format!("invalid selector {selector:?}: {e:?}")))?;
		let document = Html::parse_document(&html);
		let index = document
			.select(&parsed)
			.position(|element| element.text().collect::<String>().trim() == label);

		Ok(index.map(|index| ControlHandle {
			selector: selector.to_string(),
			label: label.to_string(),
			index,
		}))
	}

	async fn click(&mut self, control: &ControlHandle) -> Result<()> {
		let site = self.site()?;
		if let Some(message) = site.click_failures.get(&control.label) {
			return Err(Error::Session(message.clone()));
		}

		let target = control
			.label
			.parse::<usize>()
			.ok()
			.filter(|page| (1..=site.documents.len()).contains(page))
			.ok_or_else(|| Error::Session(format!("control {:?} leads nowhere", control.label)))?;

		self.render(target - 1, site.response_delay);
		self.state.lock().stats.clicks.push(control.label.clone());
		Ok(())
	}

	async fn close(self: Box<Self>) -> Result<()> {
		let mut state = self.state.lock();
		state.stats.closed += 1;
		state.stats.open_pages = state.stats.open_pages.saturating_sub(1);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn listing(page: usize, next: Option<usize>) -> String {
		let control = next.map(|n| format!("<div class='pagination'><a>{n}</a></div>")).unwrap_or_default();
		format!("<html><body><p>page {page}</p>{control}</body></html>")
	}

	#[tokio::test]
	async fn click_swaps_document_in_place() {
		let engine = FakeEngine::new().with_paginated("https://site/list", vec![listing(1, Some(2)), listing(2, None)]);
		let mut page = engine.new_page().await.unwrap();

		page.goto("https://site/list").await.unwrap();
		let control = page.find_control(".pagination a", "2").await.unwrap().expect("control present");
		page.click(&control).await.unwrap();

		assert!(page.content().await.unwrap().contains("page 2"));
		assert_eq!(page.current_url().await.unwrap(), "https://site/list");
		assert_eq!(page.find_control(".pagination a", "3").await.unwrap(), None);
		page.close().await.unwrap();

		let stats = engine.stats();
		assert_eq!(stats.clicks, vec!["2".to_string()]);
		assert_eq!((stats.opened, stats.closed, stats.open_pages), (1, 1, 0));
	}

	#[tokio::test]
	async fn unknown_url_fails_navigation() {
		let engine = FakeEngine::new();
		let mut page = engine.new_page().await.unwrap();
		let err = page.goto("https://nowhere/").await.unwrap_err();
		assert!(matches!(err, Error::Navigation { .. }));
	}

	#[tokio::test]
	async fn injected_click_failure_is_reported() {
		let engine = FakeEngine::new()
			.with_paginated("https://site/list", vec![listing(1, Some(2)), listing(2, None)])
			.with_click_failure("https://site/list", "2", "element is detached");
		let mut page = engine.new_page().await.unwrap();
		page.goto("https://site/list").await.unwrap();

		let control = page.find_control(".pagination a", "2").await.unwrap().unwrap();
		let err = page.click(&control).await.unwrap_err();
		assert!(err.to_string().contains("detached"));
	}

	#[tokio::test]
	async fn delayed_response_renders_when_request_completes() {
		let engine = FakeEngine::new()
			.with_paginated("https://site/list", vec![listing(1, Some(2)), listing(2, None)])
			.with_response_delay("https://site/list", Duration::from_millis(100));
		let mut page = engine.new_page().await.unwrap();
		let idle = IdleOptions {
			idle: Duration::from_millis(10),
			timeout: Duration::from_secs(2),
		};

		page.goto("https://site/list").await.unwrap();
		assert!(!page.content().await.unwrap().contains("page 1"));
		page.wait_until_idle(idle).await.unwrap();
		assert!(page.content().await.unwrap().contains("page 1"));

		let control = page.find_control(".pagination a", "2").await.unwrap().unwrap();
		page.click(&control).await.unwrap();
		assert!(page.content().await.unwrap().contains("page 1"));
		page.wait_until_idle(idle).await.unwrap();
		assert!(page.content().await.unwrap().contains("page 2"));
	}
}
