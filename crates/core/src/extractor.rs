//! Detail page extraction.

use scraper::{ElementRef, Html, Selector};
use tender_protocol::{Criterion, LabeledValue, OpportunityDetail};
use tender_runtime::SessionManager;
use tracing::debug;

use crate::error::{Error, Result};
use crate::selectors::CompiledDetail;
use crate::text::inner_text;

pub struct DetailExtractor {
	sessions: SessionManager,
	selectors: CompiledDetail,
}

impl DetailExtractor {
	pub fn new(sessions: SessionManager, selectors: CompiledDetail) -> Self {
		Self { sessions, selectors }
	}

	/// Visits `href` in its own session and extracts the detail record.
	///
	/// The session is closed before this returns, whatever the outcome.
	pub async fn extract_details(&self, href: &str) -> Result<OpportunityDetail> {
		let mut session = self.sessions.open(href).await.map_err(|e| Error::from_session(href, e))?;
		let html = session.content().await;
		session.close().await;

		let html = html.map_err(|e| Error::from_session(href, e))?;
		let detail = parse_detail(&html, href, &self.selectors)?;
		debug!(
			target = "tender.extractor",
			%href,
			overview = detail.overview.len(),
			essential = detail.essential_criteria.len(),
			desirable = detail.desirable_criteria.len(),
			"detail extracted"
		);
		Ok(detail)
	}
}

/// Extracts a detail record from a page snapshot. `url` only labels errors.
///
/// Fails when the requirements description is absent or when a row lacks one
/// of its required cells.
pub fn parse_detail(html: &str, url: &str, selectors: &CompiledDetail) -> Result<OpportunityDetail> {
	let document = Html::parse_document(html);
	let root = document.root_element();

	let requirements_description = root
		.select(&selectors.requirements_description)
		.next()
		.map(|element| element.inner_html())
		.ok_or_else(|| Error::extraction(url, "requirements description is missing"))?;

	Ok(OpportunityDetail {
		overview: labeled_rows(root, &selectors.overview_row, selectors, url, "overview")?,
		requirements_description,
		requirements_data: labeled_rows(root, &selectors.requirement_row, selectors, url, "requirements")?,
		essential_criteria: criteria(root, &selectors.essential_criterion, selectors, url, "essential")?,
		desirable_criteria: criteria(root, &selectors.desirable_criterion, selectors, url, "desirable")?,
		submission_requirements: root.select(&selectors.submission_requirement).map(inner_text).collect(),
	})
}

fn labeled_rows(root: ElementRef<'_>, rows: &Selector, selectors: &CompiledDetail, url: &str, section: &str) -> Result<Vec<LabeledValue>> {
	root.select(rows)
		.enumerate()
		.map(|(index, row)| {
			let label = required_cell(row, &selectors.row_label, url, section, index, "label")?;
			let value = required_cell(row, &selectors.row_value, url, section, index, "value")?;
			Ok(LabeledValue { label, value })
		})
		.collect()
}

fn criteria(root: ElementRef<'_>, rows: &Selector, selectors: &CompiledDetail, url: &str, section: &str) -> Result<Vec<Criterion>> {
	root.select(rows)
		.enumerate()
		.map(|(index, row)| {
			Ok(Criterion {
				description: required_cell(row, &selectors.criterion_description, url, section, index, "description")?,
				weight: row.select(&selectors.criterion_weight).next().map(inner_text),
			})
		})
		.collect()
}

fn required_cell(row: ElementRef<'_>, cell: &Selector, url: &str, section: &str, index: usize, what: &str) -> Result<String> {
	row.select(cell)
		.next()
		.map(inner_text)
		.ok_or_else(|| Error::extraction(url, format!("{section} row {} has no {what} cell", index + 1)))
}
