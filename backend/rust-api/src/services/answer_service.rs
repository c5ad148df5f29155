use anyhow::{Context, Result};
use std::sync::Arc;

use super::score_ledger::ScoreLedger;
use crate::metrics::{track_ledger_operation, ANSWERS_VALIDATED_TOTAL};
use crate::models::answer::AnswerSubmission;
use crate::models::ScoreRecord;
use crate::puzzles::{self, Verdict};

pub struct AnswerService {
    ledger: Arc<dyn ScoreLedger>,
}

impl AnswerService {
    pub fn new(ledger: Arc<dyn ScoreLedger>) -> Self {
        Self { ledger }
    }

    /// Checks the answer against the date's puzzle and records the awarded
    /// points, replacing any earlier score for that day.
    pub async fn submit_answer(&self, submission: &AnswerSubmission) -> Result<Verdict> {
        tracing::info!(
            "Processing answer submission: user={}, date={}",
            submission.user_id,
            submission.date
        );

        let verdict = puzzles::validate(submission.date, &submission.raw_answer);

        let correct_label = if verdict.correct { "true" } else { "false" };
        ANSWERS_VALIDATED_TOTAL
            .with_label_values(&[correct_label])
            .inc();

        let record = ScoreRecord {
            user_id: submission.user_id.clone(),
            date: submission.date,
            points: verdict.points_awarded,
        };

        // Failures surface as 500; the client's next submission is the retry
        track_ledger_operation("record_score", self.ledger.record_score(&record))
            .await
            .context("Failed to record score")?;

        tracing::info!(
            "Answer processed: user={}, date={}, correct={}, points={}",
            submission.user_id,
            submission.date,
            verdict.correct,
            verdict.points_awarded
        );

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CalendarDate;
    use crate::services::MemoryScoreLedger;

    fn submission(answer: &str) -> AnswerSubmission {
        AnswerSubmission {
            user_id: "player-1".to_string(),
            raw_answer: answer.to_string(),
            date: CalendarDate::parse("2024-03-15").unwrap(),
        }
    }

    #[tokio::test]
    async fn correct_answer_is_recorded_once() {
        let ledger = Arc::new(MemoryScoreLedger::new());
        let service = AnswerService::new(ledger.clone());

        let first = service.submit_answer(&submission("  Object ")).await.unwrap();
        let second = service.submit_answer(&submission("object")).await.unwrap();
        assert!(first.correct && second.correct);
        assert_eq!(first.points_awarded, 10);

        let stats = ledger.user_stats("player-1").await.unwrap();
        assert_eq!(stats.total_days, 1);
        assert_eq!(stats.total_score, 10);
    }

    #[tokio::test]
    async fn wrong_answer_records_zero() {
        let ledger = Arc::new(MemoryScoreLedger::new());
        let service = AnswerService::new(ledger.clone());

        let verdict = service.submit_answer(&submission("null")).await.unwrap();
        assert!(!verdict.correct);
        assert_eq!(verdict.canonical_answer, "object");

        let stats = ledger.user_stats("player-1").await.unwrap();
        assert_eq!((stats.total_days, stats.total_score), (1, 0));
    }
}
