//! Listing and detail records for a single opportunity.

use serde::{Deserialize, Serialize};

/// One entry of the paginated listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitySummary {
	pub title: String,
	/// Absolute URL of the detail page. Unique within a snapshot.
	pub href: String,
	/// Eligibility category label, e.g. "Open to all".
	#[serde(rename = "type")]
	pub kind: String,
	/// Full visible text of the listing card.
	pub raw_text: String,
}

/// A label/value row as shown in the overview and requirements tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledValue {
	pub label: String,
	pub value: String,
}

impl LabeledValue {
	pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			value: value.into(),
		}
	}
}

/// An evaluation criterion with its optional weighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub weight: Option<String>,
}

/// Structured content of one opportunity's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDetail {
	#[serde(default)]
	pub overview: Vec<LabeledValue>,
	/// Inner HTML of the requirements description, kept verbatim.
	#[serde(default)]
	pub requirements_description: String,
	#[serde(default)]
	pub requirements_data: Vec<LabeledValue>,
	#[serde(default)]
	pub essential_criteria: Vec<Criterion>,
	#[serde(default)]
	pub desirable_criteria: Vec<Criterion>,
	#[serde(default)]
	pub submission_requirements: Vec<String>,
}

impl OpportunityDetail {
	/// Looks up an overview value by its label, ignoring case and surrounding whitespace.
	pub fn overview_value(&self, label: &str) -> Option<&str> {
		let wanted = label.trim();
		self.overview
			.iter()
			.find(|row| row.label.trim().eq_ignore_ascii_case(wanted))
			.map(|row| row.value.as_str())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn summary_serializes_kind_as_type() {
		let summary = OpportunitySummary {
			title: "Dev role".into(),
			href: "https://example.com/a".into(),
			kind: "Open to all".into(),
			raw_text: "Dev role\nOpen to all".into(),
		};
		let value = serde_json::to_value(&summary).unwrap();
		assert_eq!(value["type"], "Open to all");
		assert_eq!(value["rawText"], "Dev role\nOpen to all");
		assert!(value.get("kind").is_none());
	}

	#[test]
	fn criterion_omits_missing_weight() {
		let criterion = Criterion {
			description: "Experience with Rust".into(),
			weight: None,
		};
		assert_eq!(serde_json::to_value(&criterion).unwrap(), json!({ "description": "Experience with Rust" }));
	}

	#[test]
	fn detail_uses_camel_case_keys() {
		let detail = OpportunityDetail {
			requirements_description: "<p>Build it</p>".into(),
			submission_requirements: vec!["Resume".into()],
			..Default::default()
		};
		let value = serde_json::to_value(&detail).unwrap();
		assert_eq!(value["requirementsDescription"], "<p>Build it</p>");
		assert_eq!(value["submissionRequirements"][0], "Resume");
		assert!(value["essentialCriteria"].as_array().unwrap().is_empty());
	}

	#[test]
	fn overview_lookup_ignores_case() {
		let detail = OpportunityDetail {
			overview: vec![LabeledValue::new("Closing date ", "1 Jan 2027")],
			..Default::default()
		};
		assert_eq!(detail.overview_value("closing date"), Some("1 Jan 2027"));
		assert_eq!(detail.overview_value("Buyer"), None);
	}
}
