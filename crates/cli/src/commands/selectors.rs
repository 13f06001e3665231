use super::CommandOutput;
use crate::cli::SelectorsArgs;
use crate::config::Config;
use crate::output::CommandInputs;

/// Prints the selector table a run would use, after checking every selector parses.
pub fn execute(args: SelectorsArgs, config: &Config) -> anyhow::Result<CommandOutput> {
	let table = config.selector_table(args.selectors.as_deref())?;
	table.compile()?;

	let path = args.selectors.or_else(|| config.selectors_file.clone());
	Ok(CommandOutput {
		data: serde_json::to_value(&table)?,
		inputs: path.map(|path| CommandInputs {
			path: Some(path),
			..CommandInputs::default()
		}),
		..CommandOutput::default()
	})
}
