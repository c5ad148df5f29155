use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::{Identity, PuzzleApi, SyncPayload};
use crate::error::ClientError;
use crate::store::ActivityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another sync was in flight; nothing was read or sent.
    AlreadyRunning,
    NothingToSync,
    Uploaded(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    SignIn,
    Reconnect,
    CorrectAnswers,
}

/// Largest batch the server accepts by default.
pub const DEFAULT_MAX_BATCH: usize = 400;

/// Uploads unsynced activity in one batch per trigger, oldest first.
pub struct SyncEngine {
    store: Arc<dyn ActivityStore>,
    api: Arc<dyn PuzzleApi>,
    max_batch: usize,
    in_flight: Mutex<()>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn ActivityStore>, api: Arc<dyn PuzzleApi>) -> Self {
        Self {
            store,
            api,
            max_batch: DEFAULT_MAX_BATCH,
            in_flight: Mutex::new(()),
        }
    }

    /// Caps each upload at `max_batch` entries; the rest wait for the next
    /// trigger.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    /// Marks entries synced only after the server accepted the whole batch.
    /// On failure nothing changes locally and the next trigger retries.
    pub async fn sync(
        &self,
        identity: &Identity,
        trigger: SyncTrigger,
    ) -> Result<SyncOutcome, ClientError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("Sync ({:?}) skipped: another sync is in flight", trigger);
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let mut unsynced = self.store.get_unsynced().await?;
        if unsynced.is_empty() {
            return Ok(SyncOutcome::NothingToSync);
        }
        // Stores return entries in date order
        if unsynced.len() > self.max_batch {
            tracing::debug!(
                "Sync ({:?}) deferring {} entries past the batch limit",
                trigger,
                unsynced.len() - self.max_batch
            );
            unsynced.truncate(self.max_batch);
        }

        let payload = SyncPayload {
            firebase_uid: identity.user_id.clone(),
            entries: unsynced.iter().map(|entry| entry.to_sync_entry()).collect(),
        };

        if let Err(e) = self.api.sync(identity, &payload).await {
            tracing::warn!(
                "Sync ({:?}) of {} entries failed: {}",
                trigger,
                payload.entries.len(),
                e
            );
            return Err(e);
        }

        let dates: Vec<_> = unsynced.iter().map(|entry| entry.date).collect();
        self.store.mark_synced(&dates).await?;

        tracing::info!("Sync ({:?}) uploaded {} entries", trigger, dates.len());
        Ok(SyncOutcome::Uploaded(dates.len()))
    }
}

/// Counts correct answers and fires a sync every `every_correct` of them.
pub struct SyncPolicy {
    every_correct: u32,
    correct_answers: AtomicU32,
}

impl SyncPolicy {
    pub fn new(every_correct: u32) -> Self {
        Self {
            every_correct,
            correct_answers: AtomicU32::new(0),
        }
    }

    pub fn record_answer(&self, correct: bool) -> Option<SyncTrigger> {
        if !correct || self.every_correct == 0 {
            return None;
        }
        let count = self.correct_answers.fetch_add(1, Ordering::SeqCst) + 1;
        (count % self.every_correct == 0).then_some(SyncTrigger::CorrectAnswers)
    }
}
