//! Diagnostic logging to stderr. stdout carries only the result envelope.

use tracing_subscriber::EnvFilter;

fn default_directives(verbose: u8) -> &'static str {
	match verbose {
		0 => "warn,tender=info",
		1 => "warn,tender=debug",
		_ => "info,tender=trace",
	}
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `-v`.
pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose > 0)
		.try_init();
}
