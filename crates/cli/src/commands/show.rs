use chrono::{DateTime, Utc};
use serde::Serialize;
use tender::SnapshotStore;
use tender_protocol::{Opportunity, RunSnapshot};

use super::CommandOutput;
use crate::cli::ShowArgs;
use crate::config::Config;
use crate::output::CommandInputs;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowData {
	generated_at: DateTime<Utc>,
	total: usize,
	shown: usize,
	opportunities: Vec<ShowEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowEntry {
	title: String,
	#[serde(rename = "type")]
	kind: String,
	href: String,
	status: String,
}

pub fn execute(args: ShowArgs, config: &Config) -> anyhow::Result<CommandOutput> {
	let path = args.path.unwrap_or_else(|| config.output.clone());
	let snapshot = SnapshotStore::new(&path).load()?;
	let data = listing(&snapshot, args.kind.as_deref());

	Ok(CommandOutput {
		data: serde_json::to_value(&data)?,
		inputs: Some(CommandInputs {
			url: None,
			path: Some(path),
			filter: args.kind,
		}),
		..CommandOutput::default()
	})
}

fn listing(snapshot: &RunSnapshot, kind: Option<&str>) -> ShowData {
	let opportunities: Vec<ShowEntry> = snapshot
		.opportunities
		.iter()
		.filter(|o| kind.is_none_or(|kind| o.summary.kind == kind))
		.map(entry)
		.collect();

	ShowData {
		generated_at: snapshot.generated_at,
		total: snapshot.len(),
		shown: opportunities.len(),
		opportunities,
	}
}

fn entry(opportunity: &Opportunity) -> ShowEntry {
	let status = match (&opportunity.details, &opportunity.detail_error) {
		(Some(_), _) => "ok".to_string(),
		(None, Some(error)) => format!("failed ({})", error.stage),
		(None, None) => "pending".to_string(),
	};
	ShowEntry {
		title: opportunity.summary.title.clone(),
		kind: opportunity.summary.kind.clone(),
		href: opportunity.summary.href.clone(),
		status,
	}
}

#[cfg(test)]
mod tests {
	use tender_protocol::{DetailStage, OpportunityDetail, OpportunitySummary};

	use super::*;

	fn summary(href: &str, kind: &str) -> OpportunitySummary {
		OpportunitySummary {
			title: format!("Role {href}"),
			href: href.into(),
			kind: kind.into(),
			raw_text: String::new(),
		}
	}

	fn snapshot() -> RunSnapshot {
		RunSnapshot::now(vec![
			Opportunity::with_details(summary("/a", "Open to all"), OpportunityDetail::default()),
			Opportunity::with_error(summary("/b", "Panel only"), DetailStage::Navigation, "timeout"),
			Opportunity::pending(summary("/c", "Open to all")),
		])
	}

	#[test]
	fn lists_every_entry_with_status() {
		let data = listing(&snapshot(), None);
		assert_eq!((data.total, data.shown), (3, 3));
		let statuses: Vec<_> = data.opportunities.iter().map(|e| e.status.as_str()).collect();
		assert_eq!(statuses, ["ok", "failed (navigation)", "pending"]);
	}

	#[test]
	fn type_filter_is_exact() {
		let data = listing(&snapshot(), Some("Open to all"));
		assert_eq!(data.shown, 2);
		assert!(listing(&snapshot(), Some("open to all")).opportunities.is_empty());
	}
}
