use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::{FindOptions, UpdateOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};

use super::score_ledger::ScoreLedger;
use crate::models::{CalendarDate, LeaderboardEntry, ScoreRecord, UserStats};
use crate::utils::time::chrono_to_bson;

const COLLECTION: &str = "daily_scores";

/// One document per `(user, date)`, keyed `"{uid}:{date}"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScoreDocument {
    #[serde(rename = "_id")]
    id: String,
    firebase_uid: String,
    puzzle_date: String,
    score: i64,
    first_recorded_at: BsonDateTime,
    updated_at: BsonDateTime,
}

pub struct MongoScoreLedger {
    mongo: Database,
    scores: Collection<ScoreDocument>,
}

impl MongoScoreLedger {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = MongoClient::with_uri_str(uri)
            .await
            .context("Failed to create MongoDB client")?;
        let ledger = Self::new(client.database(database));
        ledger.ping().await.context("MongoDB ping failed")?;
        ledger.ensure_indexes().await?;
        Ok(ledger)
    }

    pub fn new(mongo: Database) -> Self {
        let scores = mongo.collection(COLLECTION);
        Self { mongo, scores }
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let leaderboard = IndexModel::builder()
            .keys(doc! { "puzzle_date": 1, "score": -1, "first_recorded_at": 1 })
            .build();
        let by_user = IndexModel::builder()
            .keys(doc! { "firebase_uid": 1 })
            .build();

        self.scores
            .create_indexes([leaderboard, by_user])
            .await
            .context("Failed to create daily_scores indexes")?;
        Ok(())
    }

    fn document_id(user_id: &str, date: CalendarDate) -> String {
        format!("{}:{}", user_id, date)
    }
}

#[async_trait]
impl ScoreLedger for MongoScoreLedger {
    async fn record_score(&self, record: &ScoreRecord) -> Result<()> {
        let now = chrono_to_bson(Utc::now());
        let options = UpdateOptions::builder().upsert(true).build();

        self.scores
            .update_one(
                doc! { "_id": Self::document_id(&record.user_id, record.date) },
                doc! {
                    "$set": {
                        "firebase_uid": record.user_id.as_str(),
                        "puzzle_date": record.date.to_string(),
                        "score": record.points,
                        "updated_at": now,
                    },
                    "$setOnInsert": { "first_recorded_at": now },
                },
            )
            .with_options(options)
            .await
            .context("Failed to upsert daily score")?;
        Ok(())
    }

    async fn top_scores(&self, date: CalendarDate, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let options = FindOptions::builder()
            .sort(doc! { "score": -1, "first_recorded_at": 1, "_id": 1 })
            .limit(limit as i64)
            .build();
        let mut cursor = self
            .scores
            .find(doc! { "puzzle_date": date.to_string() })
            .with_options(options)
            .await
            .context("Failed to query leaderboard")?;

        let mut rows = Vec::new();
        while let Some(score) = cursor
            .try_next()
            .await
            .context("Failed to iterate leaderboard")?
        {
            rows.push(LeaderboardEntry {
                firebase_uid: score.firebase_uid,
                score: score.score,
            });
        }
        Ok(rows)
    }

    async fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let pipeline = vec![
            doc! { "$match": { "firebase_uid": user_id } },
            doc! {
                "$group": {
                    "_id": "$firebase_uid",
                    "total_days": { "$sum": 1 },
                    "total_score": { "$sum": "$score" }
                }
            },
        ];

        let mut cursor = self
            .scores
            .aggregate(pipeline)
            .await
            .context("Failed to aggregate user stats")?;

        let (total_days, total_score) = match cursor.try_next().await? {
            Some(doc) => {
                let days = doc
                    .get_i64("total_days")
                    .or_else(|_| doc.get_i32("total_days").map(i64::from))
                    .unwrap_or(0);
                let score = doc
                    .get_i64("total_score")
                    .or_else(|_| doc.get_i32("total_score").map(i64::from))
                    .unwrap_or(0);
                (days.max(0) as u64, score)
            }
            None => (0, 0),
        };

        Ok(UserStats {
            firebase_uid: user_id.to_string(),
            total_days,
            total_score,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.mongo.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
