use std::sync::Arc;

use anyhow::Context;
use tender::{Orchestrator, PaginationStop, RunOutcome};
use tender_runtime::{ChromiumEngine, SessionManager};
use tracing::{info, warn};

use super::CommandOutput;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::notify::{Signal, signal_completion};
use crate::output::{Artifact, ArtifactType, CommandInputs, Diagnostic, DiagnosticLevel, EffectiveConfig};

pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<CommandOutput> {
	config.apply_run_args(&args);
	config.validate()?;
	let selectors = config.selector_table(None)?.compile()?;

	let engine = Arc::new(ChromiumEngine::launch(config.launch_options()).await?);
	let sessions = SessionManager::new(engine.clone(), config.session_options());
	let mut orchestrator = Orchestrator::new(sessions, selectors, config.run_options());

	let result = orchestrator.run().await;
	if let Err(err) = engine.shutdown().await {
		warn!(target = "tender", error = %err, "browser shutdown failed");
	}
	let outcome = result.with_context(|| format!("run stopped while {}", orchestrator.phase()))?;

	let mut diagnostics = diagnostics(&outcome);
	match signal_completion(&config.notify) {
		Signal::Failed(message) => diagnostics.push(Diagnostic {
			level: DiagnosticLevel::Warning,
			message: format!("completion signal failed: {message}"),
			source: Some("notify".to_string()),
		}),
		signal => info!(target = "tender", ?signal, "completion signalled"),
	}

	let size_bytes = std::fs::metadata(&outcome.report.output).ok().map(|m| m.len());
	Ok(CommandOutput {
		data: serde_json::to_value(&outcome.report)?,
		inputs: Some(CommandInputs {
			url: Some(config.entry_url.clone()),
			path: Some(config.output.clone()),
			filter: None,
		}),
		artifacts: vec![Artifact {
			artifact_type: ArtifactType::Snapshot,
			path: outcome.report.output.clone(),
			size_bytes,
		}],
		diagnostics,
		config: Some(effective_config(&config)),
	})
}

fn diagnostics(outcome: &RunOutcome) -> Vec<Diagnostic> {
	let mut diagnostics = Vec::new();
	if let PaginationStop::AdvanceFailed { page, message } = &outcome.report.pagination_stop {
		diagnostics.push(Diagnostic {
			level: DiagnosticLevel::Warning,
			message: format!("pagination stopped after page {page}: {message}"),
			source: Some("paginator".to_string()),
		});
	}
	for entry in &outcome.snapshot.opportunities {
		if let Some(error) = &entry.detail_error {
			diagnostics.push(Diagnostic {
				level: DiagnosticLevel::Warning,
				message: format!("{}: {}", entry.href(), error.message),
				source: Some(error.stage.to_string()),
			});
		}
	}
	diagnostics
}

fn effective_config(config: &Config) -> EffectiveConfig {
	EffectiveConfig {
		engine: "chromium".to_string(),
		headless: config.headless,
		navigation_timeout_ms: config.navigation_timeout_ms,
		idle_ms: config.idle_ms,
		settle_ms: config.settle_ms,
		incremental: config.incremental,
		max_pages: config.max_pages,
		config_file: config.source.clone(),
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use tender::RunReport;
	use tender_protocol::{DetailStage, Opportunity, OpportunitySummary, RunSnapshot};

	use super::*;

	fn summary(href: &str) -> OpportunitySummary {
		OpportunitySummary {
			title: "Role".into(),
			href: href.into(),
			kind: "Open to all".into(),
			raw_text: "Role".into(),
		}
	}

	#[test]
	fn failed_details_and_pagination_become_warnings() {
		let snapshot = RunSnapshot::now(vec![
			Opportunity::pending(summary("https://site/a")),
			Opportunity::with_error(summary("https://site/b"), DetailStage::Extraction, "requirements description is missing"),
		]);
		let outcome = RunOutcome {
			report: RunReport {
				pages_visited: 3,
				pagination_stop: PaginationStop::AdvanceFailed {
					page: 3,
					message: "detached".into(),
				},
				opportunities: 2,
				details_ok: 1,
				details_failed: 1,
				duplicates_dropped: 0,
				output: PathBuf::from("data/data.json"),
			},
			snapshot,
		};

		let diagnostics = diagnostics(&outcome);
		assert_eq!(diagnostics.len(), 2);
		assert!(diagnostics[0].message.contains("after page 3"));
		assert_eq!(diagnostics[1].source.as_deref(), Some("extraction"));
		assert!(diagnostics[1].message.starts_with("https://site/b"));
	}

	#[test]
	fn effective_config_reflects_flags() {
		let mut config = Config::default();
		config.apply_run_args(&RunArgs {
			headful: true,
			max_pages: Some(2),
			..RunArgs::default()
		});
		let effective = effective_config(&config);
		assert!(!effective.headless);
		assert_eq!(effective.max_pages, Some(2));
	}
}
