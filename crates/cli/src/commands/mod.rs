mod run;
mod selectors;
mod show;

use std::time::Instant;

use serde_json::Value;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::{Config, ConfigError};
use crate::output::{Artifact, CommandInputs, Diagnostic, EffectiveConfig, ErrorCode, ResultBuilder, print_result};

/// Successful command payload plus envelope extras.
#[derive(Debug, Default)]
pub struct CommandOutput {
	pub data: Value,
	pub inputs: Option<CommandInputs>,
	pub artifacts: Vec<Artifact>,
	pub diagnostics: Vec<Diagnostic>,
	pub config: Option<EffectiveConfig>,
}

impl CommandOutput {
	pub fn new(data: Value) -> Self {
		Self { data, ..Self::default() }
	}
}

/// Runs the selected command and prints its envelope.
///
/// Failures are printed as an error envelope and then returned.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	let started = Instant::now();
	let name = cli.command.name();
	let format = cli.format;

	let outcome = match Config::load(cli.config.as_deref()) {
		Ok(config) => execute(cli.command, config).await,
		Err(err) => Err(err.into()),
	};

	match outcome {
		Ok(output) => {
			let result = ResultBuilder::started_at(name, started)
				.inputs(output.inputs)
				.data(output.data)
				.artifacts(output.artifacts)
				.diagnostics(output.diagnostics)
				.config(output.config)
				.build();
			print_result(&result, format);
			info!(target = "tender", command = name, elapsed_ms = started.elapsed().as_millis() as u64, "command finished");
			Ok(())
		}
		Err(err) => {
			let (code, kind) = error_code(&err);
			let result = ResultBuilder::<Value>::started_at(name, started).error(code, format!("{err:#}"), kind).build();
			print_result(&result, format);
			Err(err)
		}
	}
}

async fn execute(command: Commands, config: Config) -> anyhow::Result<CommandOutput> {
	match command {
		Commands::Run(args) => run::execute(args, config).await,
		Commands::Show(args) => show::execute(args, &config),
		Commands::Selectors(args) => selectors::execute(args, &config),
	}
}

/// Maps a command failure onto its envelope code and pipeline error kind.
pub fn error_code(err: &anyhow::Error) -> (ErrorCode, Option<String>) {
	if let Some(err) = err.downcast_ref::<tender::Error>() {
		let code = match err {
			tender::Error::Timeout { .. } => ErrorCode::Timeout,
			tender::Error::Runtime(tender_runtime::Error::Launch(_)) => ErrorCode::BrowserLaunchFailed,
			_ => match err.kind() {
				tender::ErrorKind::NavigationError => ErrorCode::NavigationFailed,
				tender::ErrorKind::ExtractionError => ErrorCode::ExtractionFailed,
				tender::ErrorKind::PersistenceError => ErrorCode::PersistenceFailed,
				tender::ErrorKind::ConfigError => ErrorCode::InvalidInput,
				tender::ErrorKind::BrowserError => ErrorCode::InternalError,
			},
		};
		return (code, Some(err.kind().to_string()));
	}
	if let Some(err) = err.downcast_ref::<tender_runtime::Error>() {
		let code = match err {
			tender_runtime::Error::Launch(_) => ErrorCode::BrowserLaunchFailed,
			tender_runtime::Error::Timeout { .. } => ErrorCode::Timeout,
			tender_runtime::Error::Navigation { .. } => ErrorCode::NavigationFailed,
			tender_runtime::Error::Session(_) => ErrorCode::InternalError,
		};
		return (code, None);
	}
	if err.downcast_ref::<ConfigError>().is_some() {
		return (ErrorCode::InvalidInput, Some(tender::ErrorKind::ConfigError.to_string()));
	}
	(ErrorCode::InternalError, None)
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use super::*;

	#[test]
	fn pipeline_errors_map_to_envelope_codes() {
		let err = anyhow::Error::new(tender::Error::Persistence {
			path: PathBuf::from("data/data.json"),
			source: std::io::Error::other("disk full"),
		});
		assert_eq!(error_code(&err), (ErrorCode::PersistenceFailed, Some("PersistenceError".to_string())));

		let err = anyhow::Error::new(tender::Error::Timeout {
			url: "https://site".into(),
			message: "timed out".into(),
		});
		assert_eq!(error_code(&err).0, ErrorCode::Timeout);
	}

	#[test]
	fn launch_failure_maps_to_browser_code() {
		let err = anyhow::Error::new(tender_runtime::Error::Launch("no chrome".into()));
		assert_eq!(error_code(&err).0, ErrorCode::BrowserLaunchFailed);
	}

	#[test]
	fn config_errors_are_invalid_input() {
		let err = anyhow::Error::new(ConfigError::Invalid("bad".into()));
		assert_eq!(error_code(&err).0, ErrorCode::InvalidInput);
		assert_eq!(error_code(&anyhow::anyhow!("boom")).0, ErrorCode::InternalError);
	}
}
