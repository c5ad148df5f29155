use serde::{Deserialize, Serialize};

use super::calendar::CalendarDate;

/// One `(user, date)` score. The pair is unique in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub user_id: String,
    pub date: CalendarDate,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub firebase_uid: String,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStats {
    pub firebase_uid: String,
    pub total_days: u64,
    pub total_score: i64,
}
