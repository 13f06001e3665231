//! Site-specific selector tables, one per page type.
//!
//! The built-in table is embedded from `selectors.json`. Operators can point
//! a run at a replacement file when the portal markup changes; the file must
//! carry the full table.

use std::path::Path;
use std::sync::LazyLock;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static BUILTIN: LazyLock<SelectorTable> = LazyLock::new(|| {
	let json = include_str!("selectors.json");
	serde_json::from_str(json).expect("Failed to parse selectors.json")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorTable {
	pub listing: ListingSelectors,
	pub detail: DetailSelectors,
}

/// Selectors for the paginated search-results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSelectors {
	pub card: String,
	/// Relative to a card.
	pub title: String,
	/// Eligibility pill, relative to a card.
	#[serde(rename = "type")]
	pub kind: String,
	pub pagination_control: String,
}

/// Selectors for one opportunity's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailSelectors {
	pub overview_row: String,
	pub row_label: String,
	pub row_value: String,
	pub requirements_description: String,
	pub requirement_row: String,
	pub essential_criterion: String,
	pub desirable_criterion: String,
	pub criterion_description: String,
	pub criterion_weight: String,
	pub submission_requirement: String,
}

impl Default for SelectorTable {
	fn default() -> Self {
		BUILTIN.clone()
	}
}

impl SelectorTable {
	pub fn builtin() -> &'static SelectorTable {
		&BUILTIN
	}

	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let json = std::fs::read_to_string(path).map_err(|e| Error::Config(format!("cannot read selector table {}: {e}", path.display())))?;
		Self::from_json(&json).map_err(|e| Error::Config(format!("invalid selector table {}: {e}", path.display())))
	}

	/// Parses every selector once, failing on the first invalid one.
	pub fn compile(&self) -> Result<CompiledSelectors> {
		Ok(CompiledSelectors {
			listing: self.listing.compile()?,
			detail: self.detail.compile()?,
		})
	}
}

impl ListingSelectors {
	pub fn compile(&self) -> Result<CompiledListing> {
		Ok(CompiledListing {
			card: parse(&self.card)?,
			title: parse(&self.title)?,
			kind: parse(&self.kind)?,
			pagination_control: {
				parse(&self.pagination_control)?;
				self.pagination_control.clone()
			},
		})
	}
}

impl DetailSelectors {
	pub fn compile(&self) -> Result<CompiledDetail> {
		Ok(CompiledDetail {
			overview_row: parse(&self.overview_row)?,
			row_label: parse(&self.row_label)?,
			row_value: parse(&self.row_value)?,
			requirements_description: parse(&self.requirements_description)?,
			requirement_row: parse(&self.requirement_row)?,
			essential_criterion: parse(&self.essential_criterion)?,
			desirable_criterion: parse(&self.desirable_criterion)?,
			criterion_description: parse(&self.criterion_description)?,
			criterion_weight: parse(&self.criterion_weight)?,
			submission_requirement: parse(&self.submission_requirement)?,
		})
	}
}

#[derive(Debug, Clone)]
pub struct CompiledSelectors {
	pub listing: CompiledListing,
	pub detail: CompiledDetail,
}

#[derive(Debug, Clone)]
pub struct CompiledListing {
	pub card: Selector,
	pub title: Selector,
	pub kind: Selector,
	/// Kept as text: the browser resolves it against the live page.
	pub pagination_control: String,
}

#[derive(Debug, Clone)]
pub struct CompiledDetail {
	pub overview_row: Selector,
	pub row_label: Selector,
	pub row_value: Selector,
	pub requirements_description: Selector,
	pub requirement_row: Selector,
	pub essential_criterion: Selector,
	pub desirable_criterion: Selector,
	pub criterion_description: Selector,
	pub criterion_weight: Selector,
	pub submission_requirement: Selector,
}

fn parse(selector: &str) -> Result<Selector> {
	Selector::parse(selector).map_err(|e| Error::Selector {
		selector: selector.to_string(),
		message: e.to_string(),
	})
}
