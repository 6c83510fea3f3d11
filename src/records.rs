//! Persistent records across runs
//!
//! Best survival time, lifetime kills, a top-10 run leaderboard and the set of
//! unlocked achievements. Persisted to LocalStorage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::platform::storage::{self, StorageError};
use crate::sim::{Achievement, RunSummary};

/// Maximum number of runs to keep on the leaderboard
pub const MAX_RUNS: usize = 10;

/// A single finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub survival_time: f32,
    pub kills: u32,
    pub level: u32,
    pub gold: u32,
    /// Unix timestamp (ms) when the run ended
    pub timestamp: f64,
}

/// Everything kept between runs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Records {
    pub best_time: f32,
    pub total_kills: u64,
    pub total_gold: u64,
    pub runs_played: u32,
    /// Sorted by survival time, longest first
    pub runs: Vec<RunEntry>,
    pub achievements: BTreeSet<Achievement>,
}

impl Records {
    const STORAGE_KEY: &'static str = "pixel_survivors_records";

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a run of this length would make the leaderboard
    pub fn qualifies(&self, survival_time: f32) -> bool {
        if survival_time <= 0.0 {
            return false;
        }
        if self.runs.len() < MAX_RUNS {
            return true;
        }
        self.runs
            .last()
            .map(|e| survival_time > e.survival_time)
            .unwrap_or(true)
    }

    /// Rank a run would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, survival_time: f32) -> Option<usize> {
        if !self.qualifies(survival_time) {
            return None;
        }
        let rank = self.runs.iter().position(|e| survival_time > e.survival_time);
        Some(rank.unwrap_or(self.runs.len()) + 1)
    }

    /// Fold a finished run into the records
    ///
    /// Returns the leaderboard rank achieved (1-indexed), if any.
    pub fn merge(&mut self, summary: &RunSummary, timestamp: f64) -> Option<usize> {
        self.runs_played += 1;
        self.total_kills += u64::from(summary.kills);
        self.total_gold += u64::from(summary.gold);
        if summary.survival_time > self.best_time {
            log::info!("New best time: {}", crate::format_time(summary.survival_time));
            self.best_time = summary.survival_time;
        }
        self.achievements.extend(summary.achievements.iter().copied());

        let rank = self.potential_rank(summary.survival_time)?;
        self.runs.insert(
            rank - 1,
            RunEntry {
                survival_time: summary.survival_time,
                kills: summary.kills,
                level: summary.level,
                gold: summary.gold,
                timestamp,
            },
        );
        self.runs.truncate(MAX_RUNS);
        Some(rank)
    }

    /// Stored records, or empty ones when nothing readable is stored
    pub fn load() -> Self {
        match storage::load::<Records>(Self::STORAGE_KEY) {
            Some(records) => {
                log::info!(
                    "Loaded records ({} runs, best {})",
                    records.runs.len(),
                    crate::format_time(records.best_time)
                );
                records
            }
            None => {
                log::info!("No records found, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self) {
        match storage::save(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Records saved ({} runs)", self.runs.len()),
            Err(StorageError::Unavailable) => log::debug!("No storage, records not saved"),
            Err(e) => log::warn!("Failed to save records: {}", e),
        }
    }
}
