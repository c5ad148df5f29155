use chrono::{NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::activity::ActivityEntry;
use crate::api::{Identity, LeaderboardRow, PuzzleApi, PuzzleView, ValidatePayload, Verdict};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::store::ActivityStore;
use crate::streak::{self, Achievement, PerfectMonthRule};
use crate::sync::{SyncEngine, SyncOutcome, SyncPolicy, SyncTrigger};

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub verdict: Verdict,
    pub entry: ActivityEntry,
    pub streak: u32,
    pub new_achievements: Vec<Achievement>,
    /// Set when this answer triggered a sync that completed.
    pub sync: Option<SyncOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub streak: u32,
    pub achievements: BTreeSet<Achievement>,
    pub total_solved: usize,
    pub unsynced: usize,
}

/// One player's game on one device.
pub struct GameSession {
    api: Arc<dyn PuzzleApi>,
    store: Arc<dyn ActivityStore>,
    sync: SyncEngine,
    policy: SyncPolicy,
    rule: PerfectMonthRule,
    identity: Option<Identity>,
    announced: BTreeSet<Achievement>,
    current_puzzle: Option<PuzzleView>,
}

impl GameSession {
    pub fn new(
        config: &ClientConfig,
        api: Arc<dyn PuzzleApi>,
        store: Arc<dyn ActivityStore>,
    ) -> Self {
        Self {
            sync: SyncEngine::new(store.clone(), api.clone())
                .with_max_batch(config.sync_max_batch),
            policy: SyncPolicy::new(config.sync_every_correct),
            rule: config.perfect_month_rule,
            api,
            store,
            identity: None,
            announced: BTreeSet::new(),
            current_puzzle: None,
        }
    }

    fn identity(&self) -> Result<&Identity, ClientError> {
        self.identity.as_ref().ok_or(ClientError::NotSignedIn)
    }

    /// Signs in and uploads anything left over from earlier sessions.
    /// Achievements already earned are not announced again. A failed upload
    /// does not undo the sign-in; it yields `None` and waits for the next
    /// trigger.
    pub async fn sign_in(
        &mut self,
        identity: Identity,
    ) -> Result<Option<SyncOutcome>, ClientError> {
        let entries = self.store.get_all().await?;
        self.announced = streak::evaluate_achievements(&entries, today(), self.rule);
        tracing::info!("Signed in as {}", identity.user_id);

        let identity = self.identity.insert(identity);
        match self.sync.sync(identity, SyncTrigger::SignIn).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                tracing::warn!("Sync on sign-in failed: {}", e);
                Ok(None)
            }
        }
    }

    pub fn sign_out(&mut self) {
        self.identity = None;
        self.announced.clear();
    }

    pub async fn todays_puzzle(&mut self) -> Result<PuzzleView, ClientError> {
        let puzzle = self.api.daily_puzzle().await?;
        self.current_puzzle = Some(puzzle.clone());
        Ok(puzzle)
    }

    pub async fn submit(
        &mut self,
        answer: &str,
        time_taken: Option<u32>,
    ) -> Result<SubmitOutcome, ClientError> {
        self.submit_for_date(today(), answer, time_taken).await
    }

    /// Answers the puzzle of `date`. One attempt per date per device; a
    /// network failure leaves the attempt available.
    pub async fn submit_for_date(
        &mut self,
        date: NaiveDate,
        answer: &str,
        time_taken: Option<u32>,
    ) -> Result<SubmitOutcome, ClientError> {
        let identity = self.identity()?.clone();

        if self.store.get(date).await?.is_some() {
            return Err(ClientError::AlreadyAttempted(date));
        }

        let verdict = self
            .api
            .validate(
                &identity,
                &ValidatePayload {
                    firebase_uid: identity.user_id.clone(),
                    answer: answer.to_string(),
                    puzzle_date: date,
                },
            )
            .await?;

        let mut entry =
            ActivityEntry::attempt(date, verdict.correct, verdict.added_score, time_taken);
        if let Some(puzzle) = self.current_puzzle.as_ref().filter(|p| p.date == date) {
            entry = entry.with_difficulty(puzzle.difficulty);
        }
        self.store.put(&entry).await?;

        let entries = self.store.get_all().await?;
        let streak = streak::calculate_streak(&entries, today());
        let current = streak::evaluate_achievements(&entries, today(), self.rule);
        let new_achievements = streak::newly_unlocked(&current, &self.announced);
        self.announced.extend(new_achievements.iter().copied());

        let sync = match self.policy.record_answer(verdict.correct) {
            Some(trigger) => match self.sync.sync(&identity, trigger).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::warn!("Background sync after answer failed: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(SubmitOutcome {
            verdict,
            entry,
            streak,
            new_achievements,
            sync,
        })
    }

    pub async fn on_reconnect(&self) -> Result<SyncOutcome, ClientError> {
        let identity = self.identity()?;
        self.sync.sync(identity, SyncTrigger::Reconnect).await
    }

    pub async fn progress(&self, today: NaiveDate) -> Result<Progress, ClientError> {
        let entries = self.store.get_all().await?;
        Ok(Progress {
            streak: streak::calculate_streak(&entries, today),
            achievements: streak::evaluate_achievements(&entries, today, self.rule),
            total_solved: entries.iter().filter(|entry| entry.solved).count(),
            unsynced: entries.iter().filter(|entry| !entry.synced).count(),
        })
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, ClientError> {
        self.api.leaderboard().await
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
