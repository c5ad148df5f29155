#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use daily_puzzle_client::api::{
    Identity, LeaderboardRow, PuzzleApi, PuzzleView, SyncAck, SyncPayload, ValidatePayload,
    Verdict,
};
use daily_puzzle_client::ClientError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub const RIGHT_ANSWER: &str = "object";

/// Scripted server: `RIGHT_ANSWER` is correct for every date.
#[derive(Default)]
pub struct FakeApi {
    pub validations: Mutex<Vec<ValidatePayload>>,
    pub sync_batches: Mutex<Vec<SyncPayload>>,
    offline: AtomicBool,
}

impl FakeApi {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_batches.lock().unwrap().len()
    }

    fn check_online(&self) -> Result<(), ClientError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ClientError::Api {
                status: 503,
                message: "offline".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PuzzleApi for FakeApi {
    async fn daily_puzzle(&self) -> Result<PuzzleView, ClientError> {
        self.check_online()?;
        Ok(PuzzleView {
            question: "What is typeof null?".to_string(),
            date: chrono::Utc::now().date_naive(),
            kind: "code".to_string(),
            difficulty: 2,
        })
    }

    async fn validate(
        &self,
        _identity: &Identity,
        payload: &ValidatePayload,
    ) -> Result<Verdict, ClientError> {
        self.check_online()?;
        self.validations.lock().unwrap().push(payload.clone());
        let correct = payload.answer.trim().eq_ignore_ascii_case(RIGHT_ANSWER);
        Ok(Verdict {
            correct,
            added_score: if correct { 10 } else { 0 },
            correct_answer: RIGHT_ANSWER.to_string(),
        })
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, ClientError> {
        self.check_online()?;
        Ok(vec![LeaderboardRow {
            firebase_uid: "player-1".to_string(),
            score: 10,
        }])
    }

    async fn sync(
        &self,
        _identity: &Identity,
        payload: &SyncPayload,
    ) -> Result<SyncAck, ClientError> {
        self.check_online()?;
        self.sync_batches.lock().unwrap().push(payload.clone());
        Ok(SyncAck {
            success: true,
            synced: payload.entries.len(),
        })
    }
}

pub fn identity() -> Identity {
    Identity {
        user_id: "player-1".to_string(),
        token: "signed-identity-token".to_string(),
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}
