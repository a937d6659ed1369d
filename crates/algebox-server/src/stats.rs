//! Usage counters
//!
//! Per-day request counts and distinct caller identities, guarded by one
//! lock and rewritten to a single JSON file after every request. The store
//! is injected where it is needed; the executor never sees it and works the
//! same if no store exists.

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// Counter state, keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsState {
    pub requests_per_day: BTreeMap<String, u64>,
    pub unique_users_per_day: BTreeMap<String, BTreeSet<String>>,
}

/// Lock-protected counters with explicit file persistence.
#[derive(Debug)]
pub struct StatsStore {
    path: PathBuf,
    state: Mutex<StatsState>,
}

fn today_key() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

impl StatsStore {
    /// Read the counters file, starting fresh when it is missing or
    /// unreadable.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let state = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "counters file unreadable, starting fresh");
                StatsState::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => StatsState::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "counters file unreadable, starting fresh");
                StatsState::default()
            }
        };

        Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        }
    }

    /// Count one request from `caller` against today.
    pub fn record(&self, caller: &str) {
        let day = today_key();
        let mut state = self.state.lock();
        *state.requests_per_day.entry(day.clone()).or_insert(0) += 1;
        state
            .unique_users_per_day
            .entry(day)
            .or_default()
            .insert(caller.to_string());
    }

    /// Rewrite the counters file with the current state.
    pub fn flush(&self) -> io::Result<()> {
        let json = {
            let state = self.state.lock();
            serde_json::to_vec_pretty(&*state)?
        };
        std::fs::write(&self.path, json)
    }

    /// Copy of the current counters, for the stats endpoint.
    #[must_use]
    pub fn snapshot(&self) -> StatsState {
        self.state.lock().clone()
    }
}
