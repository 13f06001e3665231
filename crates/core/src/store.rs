//! Snapshot persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tender_protocol::RunSnapshot;
use tracing::debug;

use crate::error::{Error, Result};

/// Default snapshot location, relative to the working directory.
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/data.json";

/// One snapshot file, replaced wholesale on every save.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
	path: PathBuf,
}

impl SnapshotStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Writes `snapshot` atomically: a sibling temp file is renamed over the target.
	pub fn save(&self, snapshot: &RunSnapshot) -> Result<()> {
		let json = serde_json::to_string_pretty(snapshot)?;
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
		}

		let tmp = self.temp_path();
		if let Err(err) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &self.path)) {
			let _ = fs::remove_file(&tmp);
			return Err(self.io_error(err));
		}

		debug!(target = "tender.store", path = %self.path.display(), opportunities = snapshot.len(), "snapshot written");
		Ok(())
	}

	pub fn load(&self) -> Result<RunSnapshot> {
		let json = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
		Ok(serde_json::from_str(&json)?)
	}

	fn temp_path(&self) -> PathBuf {
		let name = self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "snapshot".to_string());
		self.path.with_file_name(format!(".{name}.tmp"))
	}

	fn io_error(&self, source: io::Error) -> Error {
		Error::Persistence {
			path: self.path.clone(),
			source,
		}
	}
}
