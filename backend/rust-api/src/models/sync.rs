use serde::{Deserialize, Serialize};
use validator::Validate;

use super::calendar::CalendarDate;
use super::leaderboard::ScoreRecord;

/// Body of `POST /api/sync`: a batch of device activity, trusted as sent.
#[derive(Debug, Deserialize, Validate)]
pub struct SyncRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "firebase_uid is required"))]
    pub firebase_uid: String,

    #[serde(default)]
    #[validate(nested)]
    pub entries: Vec<SyncEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncEntry {
    pub date: CalendarDate,

    #[validate(range(min = 0, message = "score must not be negative"))]
    pub score: i64,

    #[serde(default, rename = "timeTaken", skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub synced: usize,
}

impl SyncRequest {
    /// Validates the batch and flattens it into ledger records. Later entries
    /// for the same date win.
    pub fn into_records(self, max_entries: usize) -> Result<Vec<ScoreRecord>, String> {
        self.validate()
            .map_err(|e| format!("Validation error: {}", e))?;

        if self.entries.len() > max_entries {
            return Err(format!(
                "Batch of {} entries exceeds the limit of {}",
                self.entries.len(),
                max_entries
            ));
        }

        let mut records: Vec<ScoreRecord> = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            match records.iter_mut().find(|r| r.date == entry.date) {
                Some(existing) => existing.points = entry.score,
                None => records.push(ScoreRecord {
                    user_id: self.firebase_uid.clone(),
                    date: entry.date,
                    points: entry.score,
                }),
            }
        }
        Ok(records)
    }
}
