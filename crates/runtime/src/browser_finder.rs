//! Chromium executable discovery for engine launch.

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable naming the browser to launch, as a path or a command on `PATH`.
const CHROME_ENV: &str = "CHROME";

/// Returns the browser named by `CHROME`, else the first installed
/// Chromium-family browser, if any.
pub fn find_chrome_executable() -> Option<PathBuf> {
	chrome_from_env(std::env::var_os(CHROME_ENV)).or_else(installed_chrome)
}

fn chrome_from_env(value: Option<OsString>) -> Option<PathBuf> {
	let value = value?.into_string().ok()?;
	let value = value.trim();
	if value.is_empty() {
		return None;
	}
	resolve_candidate(value.to_string())
}

fn installed_chrome() -> Option<PathBuf> {
	let candidates: Vec<String> = if cfg!(target_os = "macos") {
		vec![
			"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
			"/Applications/Chromium.app/Contents/MacOS/Chromium",
			"/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
		]
		.into_iter()
		.map(str::to_string)
		.collect()
	} else if cfg!(target_os = "windows") {
		windows_browser_candidates()
	} else {
		vec![
			"google-chrome-stable",
			"google-chrome",
			"chromium-browser",
			"chromium",
			"/usr/bin/google-chrome-stable",
			"/usr/bin/google-chrome",
			"/usr/bin/chromium-browser",
			"/usr/bin/chromium",
			"/snap/bin/chromium",
		]
		.into_iter()
		.map(str::to_string)
		.collect()
	};

	candidates.into_iter().find_map(resolve_candidate)
}

fn resolve_candidate(candidate: String) -> Option<PathBuf> {
	if candidate.starts_with('/') || candidate.contains('\\') || candidate.contains(':') {
		let path = PathBuf::from(candidate);
		path.exists().then_some(path)
	} else {
		which::which(&candidate).ok()
	}
}

fn windows_browser_candidates() -> Vec<String> {
	let mut roots = Vec::new();
	for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
		if let Ok(value) = std::env::var(key) {
			roots.push(PathBuf::from(value));
		}
	}
	if roots.is_empty() {
		roots.push(PathBuf::from(r"C:\Program Files"));
		roots.push(PathBuf::from(r"C:\Program Files (x86)"));
	}

	let suffixes: &[&[&str]] = &[
		&["Google", "Chrome", "Application", "chrome.exe"],
		&["Microsoft", "Edge", "Application", "msedge.exe"],
		&["Chromium", "Application", "chrome.exe"],
	];

	let mut candidates = Vec::new();
	for root in roots {
		for suffix in suffixes {
			let mut path = root.clone();
			for component in *suffix {
				path.push(component);
			}
			candidates.push(path.to_string_lossy().to_string());
		}
	}

	candidates.extend(["chrome.exe", "msedge.exe", "chromium.exe"].map(str::to_string));
	candidates
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn windows_candidates_include_common_commands() {
		let candidates = windows_browser_candidates();
		assert!(candidates.contains(&"chrome.exe".to_string()));
		assert!(candidates.contains(&"msedge.exe".to_string()));
	}

	#[test]
	fn chrome_variable_names_an_existing_binary() {
		let dir = tempfile::tempdir().unwrap();
		let binary = dir.path().join("chrome");
		std::fs::write(&binary, "").unwrap();

		assert_eq!(chrome_from_env(Some(binary.clone().into_os_string())), Some(binary));
	}

	#[test]
	fn blank_or_missing_chrome_variable_is_ignored() {
		assert_eq!(chrome_from_env(None), None);
		assert_eq!(chrome_from_env(Some(OsString::from("  "))), None);
		assert_eq!(chrome_from_env(Some(OsString::from("/definitely/not/chrome"))), None);
	}

	#[test]
	fn missing_absolute_candidate_is_skipped() {
		assert_eq!(resolve_candidate("/definitely/not/a/browser".to_string()), None);
	}
}
