//! Listing paginator.
//!
//! Walks the client-rendered results list in one session: index the cards of
//! the current page, click the control labeled with the next page number, wait
//! for the list to re-render, repeat. The walk ends when no such control
//! exists, when the optional page limit is reached, or when advancing fails.
//! A failed advance is not an error: the summaries gathered so far stand.

use scraper::Html;
use serde::Serialize;
use tender_protocol::OpportunitySummary;
use tender_runtime::{Session, SessionManager};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::selectors::CompiledListing;
use crate::text::{first_line, inner_text};

/// Why the walk stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum PaginationStop {
	/// No control for the next page.
	Exhausted,
	/// The configured page limit was reached.
	PageLimit,
	/// Moving past `page` failed; pages up to and including it were indexed.
	#[serde(rename_all = "camelCase")]
	AdvanceFailed { page: usize, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationReport {
	pub pages_visited: usize,
	pub stop: PaginationStop,
}

pub struct ListingPaginator {
	sessions: SessionManager,
	selectors: CompiledListing,
	max_pages: Option<usize>,
}

impl ListingPaginator {
	pub fn new(sessions: SessionManager, selectors: CompiledListing) -> Self {
		Self {
			sessions,
			selectors,
			max_pages: None,
		}
	}

	pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
		self.max_pages = max_pages.filter(|max| *max > 0);
		self
	}

	/// Appends every summary reachable from `entry_url` to `accumulator`.
	///
	/// Only a failure to load the entry page is returned as an error.
	pub async fn collect_summaries(&self, entry_url: &str, accumulator: &mut Vec<OpportunitySummary>) -> Result<PaginationReport> {
		let mut session = self.sessions.open(entry_url).await.map_err(|e| Error::from_session(entry_url, e))?;
		let base = session.response().map(|r| r.url.clone()).unwrap_or_else(|| entry_url.to_string());

		let outcome = self.walk(&mut session, &base, accumulator).await;
		session.close().await;

		let report = outcome?;
		info!(
			target = "tender.paginator",
			pages = report.pages_visited,
			summaries = accumulator.len(),
			stop = ?report.stop,
			"pagination finished"
		);
		Ok(report)
	}

	async fn walk(&self, session: &mut Session, base: &str, accumulator: &mut Vec<OpportunitySummary>) -> Result<PaginationReport> {
		let mut page = 1;
		loop {
			let html = match session.content().await {
				Ok(html) => html,
				Err(err) if page == 1 => return Err(Error::from_session(base, err)),
				Err(err) => return Ok(advance_failed(page - 1, &err.to_string())),
			};

			let found = parse_listing(&html, base, &self.selectors);
			info!(target = "tender.paginator", page, cards = found.len(), "indexed listing page");
			accumulator.extend(found);

			if self.max_pages.is_some_and(|max| page >= max) {
				return Ok(PaginationReport {
					pages_visited: page,
					stop: PaginationStop::PageLimit,
				});
			}

			let next = (page + 1).to_string();
			let control = match session.find_control(&self.selectors.pagination_control, &next).await {
				Ok(Some(control)) => control,
				Ok(None) => {
					debug!(target = "tender.paginator", page, "no control for next page");
					return Ok(PaginationReport {
						pages_visited: page,
						stop: PaginationStop::Exhausted,
					});
				}
				Err(err) => return Ok(advance_failed(page, &err.to_string())),
			};

			if let Err(err) = session.click_and_settle(&control).await {
				return Ok(advance_failed(page, &err.to_string()));
			}
			page += 1;
		}
	}
}

fn advance_failed(page: usize, message: &str) -> PaginationReport {
	warn!(target = "tender.paginator", page, error = %message, "advancing past page failed; keeping summaries gathered so far");
	PaginationReport {
		pages_visited: page,
		stop: PaginationStop::AdvanceFailed {
			page,
			message: message.to_string(),
		},
	}
}

/// Parses every listing card in `html`, resolving links against `base`.
///
/// Cards without a link are skipped.
pub fn parse_listing(html: &str, base: &str, selectors: &CompiledListing) -> Vec<OpportunitySummary> {
	let document = Html::parse_document(html);
	let base = Url::parse(base).ok();

	let mut summaries = Vec::new();
	for card in document.select(&selectors.card) {
		let Some(href) = card.value().attr("href").map(str::trim).filter(|href| !href.is_empty()) else {
			warn!(target = "tender.paginator", "skipping listing card without a link");
			continue;
		};
		let href = base
			.as_ref()
			.and_then(|base| base.join(href).ok())
			.map(String::from)
			.unwrap_or_else(|| href.to_string());

		let raw_text = inner_text(card);
		let title = card
			.select(&selectors.title)
			.next()
			.map(inner_text)
			.unwrap_or_else(|| first_line(&raw_text).to_string());
		let kind = card.select(&selectors.kind).next().map(inner_text).unwrap_or_default();

		summaries.push(OpportunitySummary { title, href, kind, raw_text });
	}
	summaries
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::selectors::SelectorTable;

	fn selectors() -> CompiledListing {
		SelectorTable::builtin().listing.compile().unwrap()
	}

	#[test]
	fn card_fields_are_extracted_and_resolved() {
		let html = r#"<main>
			<a class="dta-au-card-clickable" href="/a"><strong>Dev role</strong><span class="dta-pill">Open to all</span></a>
		</main>"#;
		let summaries = parse_listing(html, "https://site/list", &selectors());

		assert_eq!(summaries.len(), 1);
		let card = &summaries[0];
		assert_eq!(card.title, "Dev role");
		assert_eq!(card.kind, "Open to all");
		assert_eq!(card.href, "https://site/a");
		assert!(card.raw_text.contains("Dev role"));
	}

	#[test]
	fn cards_outside_main_are_ignored() {
		let html = r#"<nav><a class="dta-au-card-clickable" href="/x"><strong>Nav</strong></a></nav><main></main>"#;
		assert!(parse_listing(html, "https://site/list", &selectors()).is_empty());
	}

	#[test]
	fn missing_parts_degrade_per_field() {
		let html = r#"<main>
			<a class="dta-au-card-clickable"><strong>No link</strong></a>
			<a class="dta-au-card-clickable" href="https://other/b"><div>Untitled card</div><div>Body</div></a>
		</main>"#;
		let summaries = parse_listing(html, "https://site/list", &selectors());

		assert_eq!(summaries.len(), 1);
		assert_eq!(summaries[0].href, "https://other/b");
		assert_eq!(summaries[0].title, "Untitled card");
		assert_eq!(summaries[0].kind, "");
	}
}
