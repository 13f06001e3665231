//! Completion signal played after a successful run.

use std::io::Write;
use std::process::Stdio;

use tracing::{debug, warn};

use crate::config::NotifyConfig;

/// What [`signal_completion`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
	Disabled,
	Bell,
	Spawned(String),
	Failed(String),
}

/// Rings the terminal bell or spawns the configured command without waiting
/// for it. Failures are logged and reported, never raised.
pub fn signal_completion(config: &NotifyConfig) -> Signal {
	if !config.enabled {
		return Signal::Disabled;
	}

	let Some((program, args)) = config.command.as_deref().and_then(|argv| argv.split_first()) else {
		let mut stderr = std::io::stderr();
		if let Err(err) = stderr.write_all(b"\x07").and_then(|()| stderr.flush()) {
			warn!(target = "tender.notify", error = %err, "terminal bell failed");
			return Signal::Failed(err.to_string());
		}
		return Signal::Bell;
	};

	let spawned = tokio::process::Command::new(program)
		.args(args)
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.spawn();
	match spawned {
		Ok(child) => {
			debug!(target = "tender.notify", program, pid = ?child.id(), "completion command spawned");
			Signal::Spawned(program.clone())
		}
		Err(err) => {
			warn!(target = "tender.notify", program, error = %err, "completion command failed to start");
			Signal::Failed(err.to_string())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn disabled_signal_does_nothing() {
		let config = NotifyConfig {
			enabled: false,
			command: Some(vec!["true".into()]),
		};
		assert_eq!(signal_completion(&config), Signal::Disabled);
	}

	#[test]
	fn default_signal_is_the_bell() {
		assert_eq!(signal_completion(&NotifyConfig::default()), Signal::Bell);
	}

	#[tokio::test]
	async fn missing_program_is_reported_not_raised() {
		let config = NotifyConfig {
			enabled: true,
			command: Some(vec!["/definitely/not/a/player".into(), "done.oga".into()]),
		};
		assert!(matches!(signal_completion(&config), Signal::Failed(_)));
	}
}
