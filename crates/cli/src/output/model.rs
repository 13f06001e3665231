use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// The result envelope printed by every command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub schema_version: u32,
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub inputs: Option<CommandInputs>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration_ms: Option<u64>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub artifacts: Vec<Artifact>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub diagnostics: Vec<Diagnostic>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub config: Option<EffectiveConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommandInputs {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<PathBuf>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
}

/// Stable error codes for scripts consuming the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	BrowserLaunchFailed,
	NavigationFailed,
	ExtractionFailed,
	PersistenceFailed,
	Timeout,
	InvalidInput,
	InternalError,
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ErrorCode::BrowserLaunchFailed => "BROWSER_LAUNCH_FAILED",
			ErrorCode::NavigationFailed => "NAVIGATION_FAILED",
			ErrorCode::ExtractionFailed => "EXTRACTION_FAILED",
			ErrorCode::PersistenceFailed => "PERSISTENCE_FAILED",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
	#[serde(rename = "type")]
	pub artifact_type: ArtifactType,
	pub path: PathBuf,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
	Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
	pub level: DiagnosticLevel,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
	Info,
	Warning,
	Error,
}

/// Settings a run actually used, after config file and flags were applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
	pub engine: String,
	pub headless: bool,
	pub navigation_timeout_ms: u64,
	pub idle_ms: u64,
	pub settle_ms: u64,
	pub incremental: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_pages: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub config_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_codes_serialize_like_their_display() {
		for code in [ErrorCode::NavigationFailed, ErrorCode::PersistenceFailed, ErrorCode::InvalidInput, ErrorCode::Timeout] {
			let json = serde_json::to_value(code).unwrap();
			assert_eq!(json, serde_json::Value::String(code.to_string()));
		}
	}

	#[test]
	fn empty_sections_are_omitted() {
		let result = CommandResult::<()> {
			schema_version: SCHEMA_VERSION,
			ok: false,
			command: "show".into(),
			inputs: None,
			data: None,
			error: Some(CommandError {
				code: ErrorCode::PersistenceFailed,
				message: "missing".into(),
				kind: None,
			}),
			duration_ms: None,
			artifacts: Vec::new(),
			diagnostics: Vec::new(),
			config: None,
		};
		let json = serde_json::to_value(&result).unwrap();
		assert_eq!(json["error"]["code"], "PERSISTENCE_FAILED");
		assert!(json.get("artifacts").is_none());
		assert!(json.get("data").is_none());
	}
}
