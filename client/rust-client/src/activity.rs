use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::SyncEntry;

/// One day's attempt on this device. At most one entry exists per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub date: NaiveDate,
    pub solved: bool,
    pub score: i64,
    /// Seconds from puzzle shown to answer submitted.
    pub time_taken: Option<u32>,
    /// Difficulty of the puzzle as served, when it was known at submit time.
    pub difficulty: Option<u8>,
    pub synced: bool,
}

impl ActivityEntry {
    pub fn attempt(date: NaiveDate, solved: bool, score: i64, time_taken: Option<u32>) -> Self {
        Self {
            date,
            solved,
            score,
            time_taken,
            difficulty: None,
            synced: false,
        }
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn to_sync_entry(&self) -> SyncEntry {
        SyncEntry {
            date: self.date,
            score: self.score,
            time_taken: self.time_taken,
        }
    }
}
