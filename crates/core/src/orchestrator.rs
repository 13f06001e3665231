//! Run orchestration: paginate, extract each detail in turn, persist.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tender_protocol::{DetailStage, Opportunity, OpportunitySummary, RunSnapshot};
use tender_runtime::SessionManager;
use tracing::{error, info, warn};

use crate::DEFAULT_ENTRY_URL;
use crate::error::{ErrorKind, Result};
use crate::extractor::DetailExtractor;
use crate::paginator::{ListingPaginator, PaginationStop};
use crate::selectors::CompiledSelectors;
use crate::store::{DEFAULT_SNAPSHOT_PATH, SnapshotStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
	pub entry_url: String,
	pub output: PathBuf,
	/// Checkpoint the snapshot after every detail visit.
	pub incremental: bool,
	pub max_pages: Option<usize>,
}

impl Default for RunOptions {
	fn default() -> Self {
		Self {
			entry_url: DEFAULT_ENTRY_URL.to_string(),
			output: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
			incremental: false,
			max_pages: None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
	NotStarted,
	Paginating,
	/// Visiting detail `index` (1-based) of `total`.
	ExtractingDetails {
		index: usize,
		total: usize,
	},
	Persisting,
	Done,
	Failed,
}

impl fmt::Display for RunPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotStarted => f.write_str("not-started"),
			Self::Paginating => f.write_str("paginating"),
			Self::ExtractingDetails { index, total } => write!(f, "extracting-details[{index}/{total}]"),
			Self::Persisting => f.write_str("persisting"),
			Self::Done => f.write_str("done"),
			Self::Failed => f.write_str("failed"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
	pub pages_visited: usize,
	pub pagination_stop: PaginationStop,
	pub opportunities: usize,
	pub details_ok: usize,
	pub details_failed: usize,
	pub duplicates_dropped: usize,
	pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
	pub snapshot: RunSnapshot,
	pub report: RunReport,
}

pub struct Orchestrator {
	paginator: ListingPaginator,
	extractor: DetailExtractor,
	store: SnapshotStore,
	options: RunOptions,
	phase: RunPhase,
}

impl Orchestrator {
	pub fn new(sessions: SessionManager, selectors: CompiledSelectors, options: RunOptions) -> Self {
		Self {
			paginator: ListingPaginator::new(sessions.clone(), selectors.listing).with_max_pages(options.max_pages),
			extractor: DetailExtractor::new(sessions, selectors.detail),
			store: SnapshotStore::new(options.output.clone()),
			options,
			phase: RunPhase::NotStarted,
		}
	}

	pub fn phase(&self) -> RunPhase {
		self.phase
	}

	/// Runs the whole pipeline once. Any error leaves the run in [`RunPhase::Failed`].
	pub async fn run(&mut self) -> Result<RunOutcome> {
		let result = self.execute().await;
		if let Err(err) = &result {
			self.transition(RunPhase::Failed);
			error!(target = "tender.run", kind = %err.kind(), error = %err, "run failed");
		}
		result
	}

	async fn execute(&mut self) -> Result<RunOutcome> {
		self.transition(RunPhase::Paginating);
		let mut summaries = Vec::new();
		let pagination = self.paginator.collect_summaries(&self.options.entry_url, &mut summaries).await?;

		let (summaries, duplicates_dropped) = dedupe(summaries);
		let total = summaries.len();
		let mut opportunities: Vec<Opportunity> = summaries.into_iter().map(Opportunity::pending).collect();

		for index in 0..total {
			self.transition(RunPhase::ExtractingDetails { index: index + 1, total });
			let href = opportunities[index].href().to_string();
			info!(target = "tender.run", index = index + 1, total, %href, "extracting details");

			let entry = &mut opportunities[index];
			match self.extractor.extract_details(&href).await {
				Ok(details) => entry.details = Some(details),
				Err(err) => {
					let stage = match err.kind() {
						ErrorKind::ExtractionError => DetailStage::Extraction,
						_ => DetailStage::Navigation,
					};
					warn!(target = "tender.run", %href, %stage, error = %err, "detail failed; continuing with next opportunity");
					*entry = Opportunity::with_error(entry.summary.clone(), stage, err.to_string());
				}
			}

			if self.options.incremental {
				self.store.save(&RunSnapshot::now(opportunities.clone()))?;
			}
		}

		self.transition(RunPhase::Persisting);
		let snapshot = RunSnapshot::now(opportunities);
		self.store.save(&snapshot)?;

		let details_failed = snapshot.detail_failures();
		let report = RunReport {
			pages_visited: pagination.pages_visited,
			pagination_stop: pagination.stop,
			opportunities: snapshot.len(),
			details_ok: snapshot.len() - details_failed,
			details_failed,
			duplicates_dropped,
			output: self.store.path().to_path_buf(),
		};
		self.transition(RunPhase::Done);
		info!(
			target = "tender.run",
			opportunities = report.opportunities,
			failed = report.details_failed,
			output = %report.output.display(),
			"run complete"
		);
		Ok(RunOutcome { snapshot, report })
	}

	fn transition(&mut self, next: RunPhase) {
		info!(target = "tender.run", from = %self.phase, to = %next, "phase");
		self.phase = next;
	}
}

/// Keeps the first summary for each `href`.
fn dedupe(summaries: Vec<OpportunitySummary>) -> (Vec<OpportunitySummary>, usize) {
	let before = summaries.len();
	let mut seen = HashSet::with_capacity(before);
	let unique: Vec<_> = summaries.into_iter().filter(|s| seen.insert(s.href.clone())).collect();
	let dropped = before - unique.len();
	if dropped > 0 {
		info!(target = "tender.run", dropped, "dropped duplicate listing entries");
	}
	(unique, dropped)
}
