use std::fmt;

use clap::ValueEnum;

/// How the result envelope is rendered on stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// TOON (compact, default)
	#[default]
	Toon,
	/// Pretty-printed JSON
	Json,
	/// Human-readable summary
	Text,
}

impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			OutputFormat::Toon => "toon",
			OutputFormat::Json => "json",
			OutputFormat::Text => "text",
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_matches_flag_values() {
		for format in OutputFormat::value_variants() {
			let parsed = OutputFormat::from_str(&format.to_string(), true).unwrap();
			assert_eq!(&parsed, format);
		}
	}
}
