use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tender")]
#[command(about = "Scrape BuyICT procurement opportunities into a local JSON snapshot")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format for the result envelope
	#[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Toon)]
	pub format: OutputFormat,

	/// Configuration file (JSON); defaults to the user config directory when present
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Paginate the listing, extract every opportunity and write the snapshot
	Run(RunArgs),

	/// List the opportunities of a saved snapshot
	#[command(alias = "ls")]
	Show(ShowArgs),

	/// Print the effective selector tables
	Selectors(SelectorsArgs),
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Run(_) => "run",
			Commands::Show(_) => "show",
			Commands::Selectors(_) => "selectors",
		}
	}
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
	/// Listing page to start from
	#[arg(long, value_name = "URL")]
	pub entry_url: Option<String>,

	/// Snapshot file to write
	#[arg(short, long, value_name = "PATH")]
	pub output: Option<PathBuf>,

	/// Checkpoint the snapshot after every detail page
	#[arg(long)]
	pub incremental: bool,

	/// Stop after this many listing pages
	#[arg(long, value_name = "N")]
	pub max_pages: Option<usize>,

	/// Deadline for each navigation, idle wait and click
	#[arg(long, value_name = "MS")]
	pub nav_timeout_ms: Option<u64>,

	/// Quiet period that counts as network idle
	#[arg(long, value_name = "MS")]
	pub idle_ms: Option<u64>,

	/// Delay after each pagination click
	#[arg(long, value_name = "MS")]
	pub settle_ms: Option<u64>,

	/// Show the browser window
	#[arg(long)]
	pub headful: bool,

	/// Chromium-family executable to launch
	#[arg(long, value_name = "PATH")]
	pub chrome: Option<PathBuf>,

	/// Selector table replacing the built-in one
	#[arg(long, value_name = "FILE")]
	pub selectors: Option<PathBuf>,

	/// Skip the completion signal
	#[arg(long)]
	pub no_notify: bool,

	/// Program and arguments spawned on completion instead of the terminal bell,
	/// one shell word per value (quote paths containing spaces)
	#[arg(long, value_name = "ARG", num_args = 1.., conflicts_with = "no_notify")]
	pub notify_command: Vec<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ShowArgs {
	/// Snapshot file; defaults to the configured output path
	pub path: Option<PathBuf>,

	/// Only list opportunities with this eligibility label (exact match)
	#[arg(long = "type", value_name = "LABEL")]
	pub kind: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SelectorsArgs {
	/// Selector table to validate and print instead of the configured one
	#[arg(long, value_name = "FILE")]
	pub selectors: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn run_flags_parse() {
		let cli = Cli::try_parse_from([
			"tender",
			"-vv",
			"run",
			"--entry-url",
			"https://site/list",
			"--max-pages",
			"3",
			"--incremental",
			"--no-notify",
			"-f",
			"json",
		])
		.unwrap();

		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.format, OutputFormat::Json);
		let Commands::Run(args) = cli.command else {
			panic!("expected run");
		};
		assert_eq!(args.entry_url.as_deref(), Some("https://site/list"));
		assert_eq!(args.max_pages, Some(3));
		assert!(args.incremental && args.no_notify);
	}

	#[test]
	fn show_takes_optional_path_and_type() {
		let cli = Cli::try_parse_from(["tender", "show", "data.json", "--type", "Open to all"]).unwrap();
		let Commands::Show(args) = cli.command else {
			panic!("expected show");
		};
		assert_eq!(args.path, Some(PathBuf::from("data.json")));
		assert_eq!(args.kind.as_deref(), Some("Open to all"));
	}

	#[test]
	fn notify_flags_conflict() {
		assert!(Cli::try_parse_from(["tender", "run", "--no-notify", "--notify-command", "paplay", "done.oga"]).is_err());
	}

	#[test]
	fn notify_command_keeps_each_argument_whole() {
		let cli = Cli::try_parse_from([
			"tender",
			"run",
			"--notify-command",
			"paplay",
			"/home/me/My Sounds/done.oga",
			"--max-pages",
			"1",
		])
		.unwrap();
		let Commands::Run(args) = cli.command else {
			panic!("expected run");
		};
		assert_eq!(args.notify_command, ["paplay", "/home/me/My Sounds/done.oga"]);
		assert_eq!(args.max_pages, Some(1));
	}

	#[test]
	fn format_defaults_to_toon() {
		let cli = Cli::try_parse_from(["tender", "selectors"]).unwrap();
		assert_eq!(cli.format, OutputFormat::Toon);
		assert_eq!(cli.command.name(), "selectors");
	}
}
