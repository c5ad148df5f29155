//! Server-side score ledger: one score per `(user, date)`.
//!
//! Writes follow a single overwrite policy everywhere: the stored score
//! becomes the latest value written for the pair. Repeating a submission is
//! therefore idempotent, and a re-uploaded sync batch converges to the same
//! state.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{CalendarDate, LeaderboardEntry, ScoreRecord, UserStats};

#[async_trait]
pub trait ScoreLedger: Send + Sync {
    /// Upserts the score for `(record.user_id, record.date)`, overwriting any
    /// previous value. The pair keeps its original insertion position for
    /// leaderboard tie-breaking.
    async fn record_score(&self, record: &ScoreRecord) -> anyhow::Result<()>;

    /// Applies records one by one. Not atomic: a failure part way leaves the
    /// earlier upserts in place and is returned to the caller.
    async fn record_batch(&self, records: &[ScoreRecord]) -> anyhow::Result<usize> {
        for record in records {
            self.record_score(record).await.map_err(|e| {
                e.context(format!(
                    "batch upsert failed at {} for {}",
                    record.date, record.user_id
                ))
            })?;
        }
        Ok(records.len())
    }

    /// Highest scores for `date`, non-increasing; equal scores keep insertion
    /// order.
    async fn top_scores(
        &self,
        date: CalendarDate,
        limit: usize,
    ) -> anyhow::Result<Vec<LeaderboardEntry>>;

    async fn user_stats(&self, user_id: &str) -> anyhow::Result<UserStats>;

    async fn ping(&self) -> anyhow::Result<()>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy)]
struct StoredScore {
    points: i64,
    sequence: u64,
}

#[derive(Default)]
struct MemoryState {
    rows: HashMap<(String, CalendarDate), StoredScore>,
    next_sequence: u64,
}

/// Process-local ledger for tests and single-node development.
#[derive(Default)]
pub struct MemoryScoreLedger {
    state: RwLock<MemoryState>,
}

impl MemoryScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreLedger for MemoryScoreLedger {
    async fn record_score(&self, record: &ScoreRecord) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let sequence = state.next_sequence;
        let key = (record.user_id.clone(), record.date);
        match state.rows.get_mut(&key) {
            Some(existing) => existing.points = record.points,
            None => {
                state.rows.insert(
                    key,
                    StoredScore {
                        points: record.points,
                        sequence,
                    },
                );
                state.next_sequence += 1;
            }
        }
        Ok(())
    }

    async fn top_scores(
        &self,
        date: CalendarDate,
        limit: usize,
    ) -> anyhow::Result<Vec<LeaderboardEntry>> {
        let state = self.state.read().await;
        let mut rows: Vec<(&String, &StoredScore)> = state
            .rows
            .iter()
            .filter(|((_, day), _)| *day == date)
            .map(|((user, _), score)| (user, score))
            .collect();

        rows.sort_by(|(user_a, a), (user_b, b)| {
            b.points
                .cmp(&a.points)
                .then(a.sequence.cmp(&b.sequence))
                .then(user_a.cmp(user_b))
        });

        Ok(rows
            .into_iter()
            .take(limit)
            .map(|(user, score)| LeaderboardEntry {
                firebase_uid: user.clone(),
                score: score.points,
            })
            .collect())
    }

    async fn user_stats(&self, user_id: &str) -> anyhow::Result<UserStats> {
        let state = self.state.read().await;
        let (total_days, total_score) = state
            .rows
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .fold((0u64, 0i64), |(days, total), (_, score)| {
                (days + 1, total + score.points)
            });

        Ok(UserStats {
            firebase_uid: user_id.to_string(),
            total_days,
            total_score,
        })
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: &str) -> CalendarDate {
        CalendarDate::parse(raw).unwrap()
    }

    fn record(user: &str, date: &str, points: i64) -> ScoreRecord {
        ScoreRecord {
            user_id: user.to_string(),
            date: day(date),
            points,
        }
    }

    #[tokio::test]
    async fn repeated_writes_overwrite_instead_of_accumulating() {
        let ledger = MemoryScoreLedger::new();
        ledger.record_score(&record("u1", "2024-03-15", 10)).await.unwrap();
        ledger.record_score(&record("u1", "2024-03-15", 10)).await.unwrap();

        let top = ledger.top_scores(day("2024-03-15"), 10).await.unwrap();
        assert_eq!(top, vec![LeaderboardEntry { firebase_uid: "u1".into(), score: 10 }]);

        ledger.record_score(&record("u1", "2024-03-15", 0)).await.unwrap();
        let top = ledger.top_scores(day("2024-03-15"), 10).await.unwrap();
        assert_eq!(top[0].score, 0);
    }

    #[tokio::test]
    async fn top_scores_are_sorted_and_truncated() {
        let ledger = MemoryScoreLedger::new();
        for i in 0..15 {
            ledger
                .record_score(&record(&format!("user-{i:02}"), "2024-03-15", (i * 7 % 11) as i64))
                .await
                .unwrap();
        }
        ledger.record_score(&record("other-day", "2024-03-14", 100)).await.unwrap();

        let top = ledger.top_scores(day("2024-03-15"), 10).await.unwrap();
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(top.iter().all(|row| row.firebase_uid != "other-day"));
    }

    #[tokio::test]
    async fn ties_keep_insertion_order_across_overwrites() {
        let ledger = MemoryScoreLedger::new();
        ledger.record_score(&record("zed", "2024-03-15", 10)).await.unwrap();
        ledger.record_score(&record("amy", "2024-03-15", 10)).await.unwrap();
        ledger.record_score(&record("bob", "2024-03-15", 10)).await.unwrap();
        // rewriting the same value keeps zed's original position
        ledger.record_score(&record("zed", "2024-03-15", 10)).await.unwrap();

        let first = ledger.top_scores(day("2024-03-15"), 10).await.unwrap();
        let second = ledger.top_scores(day("2024-03-15"), 10).await.unwrap();
        let order: Vec<_> = first.iter().map(|r| r.firebase_uid.as_str()).collect();
        assert_eq!(order, vec!["zed", "amy", "bob"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn batch_writes_every_record() {
        let ledger = MemoryScoreLedger::new();
        let written = ledger
            .record_batch(&[
                record("u1", "2024-03-13", 10),
                record("u1", "2024-03-14", 0),
                record("u1", "2024-03-15", 10),
            ])
            .await
            .unwrap();
        assert_eq!(written, 3);

        let stats = ledger.user_stats("u1").await.unwrap();
        assert_eq!(stats.total_days, 3);
        assert_eq!(stats.total_score, 20);
    }

    #[tokio::test]
    async fn stats_for_unknown_user_are_zero() {
        let ledger = MemoryScoreLedger::new();
        let stats = ledger.user_stats("nobody").await.unwrap();
        assert_eq!((stats.total_days, stats.total_score), (0, 0));
    }
}
