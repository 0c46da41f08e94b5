//! State document persistence
//!
//! Provides a `StateStore` that reads and rewrites the single JSON document
//! `{ timestamp, reviews, dailyCount, monthlyCount }` in an XDG-compliant
//! location, supporting graceful degradation when the filesystem or the
//! document itself is unhealthy.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::data::Review;
use crate::quota::{DailyCounter, MonthlyCounter};

/// File name of the state document inside the state directory
const STATE_FILE: &str = "reviews_state.json";

/// The persisted state document
///
/// Holds the last successful review batch alongside the quota counters, so a
/// restart inside the cache window reuses the batch and a restart at any time
/// keeps the spent budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    /// When the review batch was fetched
    pub timestamp: Option<DateTime<Utc>>,
    /// Last successful review batch
    pub reviews: Vec<Review>,
    /// Live fetches spent against the stored day
    pub daily_count: Option<DailyCounter>,
    /// Live fetches spent against the stored month
    pub monthly_count: Option<MonthlyCounter>,
}

/// Reads and rewrites the persisted state document
///
/// The document lives in an XDG-compliant cache directory
/// (`~/.cache/reviewrelay/` on Linux). Writes go through a temp file and a
/// rename so a crash mid-write never leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct StateStore {
    /// Directory holding the state document
    state_dir: PathBuf,
}

impl StateStore {
    /// Creates a StateStore using the XDG-compliant cache directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home
    /// directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "reviewrelay")?;
        let state_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { state_dir })
    }

    /// Creates a StateStore rooted at a custom directory
    ///
    /// Useful for testing or when a specific state location is needed.
    pub fn with_dir(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE)
    }

    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.state_dir)
    }

    /// Loads the state document
    ///
    /// Returns `None` if the document doesn't exist or cannot be parsed. A
    /// corrupt file is indistinguishable from an absent one on purpose: the
    /// caller reinitializes from defaults either way.
    pub fn load(&self) -> Option<PersistedState> {
        let content = fs::read_to_string(self.state_path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Rewrites the state document, replacing prior contents wholesale
    ///
    /// Writes to a temp file in the same directory and renames it over the
    /// document, so readers never observe a partial write.
    pub fn save(&self, state: &PersistedState) -> std::io::Result<()> {
        self.ensure_dir()?;

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp_path = self.state_dir.join(format!("{}.tmp", STATE_FILE));
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, self.state_path())
    }
}
