use anyhow::{Context, Result};
use std::sync::Arc;

use super::score_ledger::ScoreLedger;
use crate::metrics::{track_ledger_operation, SYNC_ENTRIES_RECEIVED_TOTAL};
use crate::models::ScoreRecord;

pub struct SyncService {
    ledger: Arc<dyn ScoreLedger>,
}

impl SyncService {
    pub fn new(ledger: Arc<dyn ScoreLedger>) -> Self {
        Self { ledger }
    }

    /// Upserts a client's offline history. Entries are written one by one;
    /// on failure the earlier writes stay and a retry of the whole batch
    /// converges to the same state.
    pub async fn apply_batch(&self, user_id: &str, records: &[ScoreRecord]) -> Result<usize> {
        if records.is_empty() {
            tracing::debug!("Empty sync batch from {}", user_id);
            return Ok(0);
        }

        SYNC_ENTRIES_RECEIVED_TOTAL.inc_by(records.len() as u64);

        let written = track_ledger_operation("record_batch", self.ledger.record_batch(records))
            .await
            .with_context(|| format!("Failed to sync {} entries for {}", records.len(), user_id))?;

        tracing::info!("Synced {} entries for {}", written, user_id);
        Ok(written)
    }
}
