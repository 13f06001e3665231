//! `innerText`-style rendering of DOM fragments.

use std::sync::LazyLock;

use regex_lite::Regex;
use scraper::ElementRef;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("TAG_RE should compile"));
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)<(?:/?(?:p|div|li|ul|ol|tr|table|h[1-6]|section|article|header|footer)\b[^>]*|br\b[^>]*)>").expect("BLOCK_RE should compile")
});
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\x{a0}]+").expect("MULTI_SPACE regex should compile"));

/// Visible text of `element`: block boundaries become line breaks, runs of
/// whitespace collapse, blank lines are dropped.
pub(crate) fn inner_text(element: ElementRef<'_>) -> String {
	html_to_text(&element.inner_html())
}

/// First non-empty line of the rendered text.
pub(crate) fn first_line(text: &str) -> &str {
	text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("")
}

fn html_to_text(html: &str) -> String {
	let flattened = html.replace(['\r', '\n'], " ");
	let result = BLOCK_RE.replace_all(&flattened, "\n");
	let result = TAG_RE.replace_all(&result, "");
	let result = decode_html_entities(&result);

	result
		.lines()
		.map(|line| MULTI_SPACE.replace_all(line, " ").trim().to_string())
		.filter(|line| !line.is_empty())
		.collect::<Vec<_>>()
		.join("\n")
}

fn decode_html_entities(s: &str) -> String {
	s.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&apos;", "'")
		.replace("&nbsp;", " ")
		.replace("&amp;", "&")
}
