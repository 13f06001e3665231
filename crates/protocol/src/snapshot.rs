//! The persisted run artifact.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::opportunity::{OpportunityDetail, OpportunitySummary};

/// Stage at which a per-opportunity detail visit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailStage {
	Navigation,
	Extraction,
}

impl std::fmt::Display for DetailStage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DetailStage::Navigation => write!(f, "navigation"),
			DetailStage::Extraction => write!(f, "extraction"),
		}
	}
}

/// Marker recorded in place of a detail record when its visit failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailError {
	pub stage: DetailStage,
	pub message: String,
}

/// Snapshot entry: a listing summary with the outcome of its detail visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
	#[serde(flatten)]
	pub summary: OpportunitySummary,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<OpportunityDetail>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub detail_error: Option<DetailError>,
}

impl Opportunity {
	/// Entry whose detail page has not been visited yet.
	pub fn pending(summary: OpportunitySummary) -> Self {
		Self {
			summary,
			details: None,
			detail_error: None,
		}
	}

	pub fn with_details(summary: OpportunitySummary, details: OpportunityDetail) -> Self {
		Self {
			summary,
			details: Some(details),
			detail_error: None,
		}
	}

	pub fn with_error(summary: OpportunitySummary, stage: DetailStage, message: impl Into<String>) -> Self {
		Self {
			summary,
			details: None,
			detail_error: Some(DetailError {
				stage,
				message: message.into(),
			}),
		}
	}

	pub fn href(&self) -> &str {
		&self.summary.href
	}
}

/// The JSON document written at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
	pub generated_at: DateTime<Utc>,
	pub opportunities: Vec<Opportunity>,
}

impl RunSnapshot {
	/// Builds a snapshot, keeping only the first entry for each `href`.
	pub fn new(generated_at: DateTime<Utc>, opportunities: Vec<Opportunity>) -> Self {
		let mut seen = HashSet::with_capacity(opportunities.len());
		let opportunities = opportunities.into_iter().filter(|o| seen.insert(o.summary.href.clone())).collect();
		Self { generated_at, opportunities }
	}

	/// Snapshot stamped with the current time.
	pub fn now(opportunities: Vec<Opportunity>) -> Self {
		Self::new(Utc::now(), opportunities)
	}

	pub fn len(&self) -> usize {
		self.opportunities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.opportunities.is_empty()
	}

	pub fn find(&self, href: &str) -> Option<&Opportunity> {
		self.opportunities.iter().find(|o| o.href() == href)
	}

	/// Returns `true` when no two entries share an `href`.
	pub fn hrefs_unique(&self) -> bool {
		let mut seen = HashSet::with_capacity(self.opportunities.len());
		self.opportunities.iter().all(|o| seen.insert(o.href()))
	}

	pub fn detail_failures(&self) -> usize {
		self.opportunities.iter().filter(|o| o.detail_error.is_some()).count()
	}
}
