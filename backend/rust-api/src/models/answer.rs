use serde::{Deserialize, Serialize};
use validator::Validate;

use super::calendar::CalendarDate;
use crate::puzzles::Verdict;

/// Body of `POST /api/validate`. There is deliberately no field for an
/// expected answer; unknown fields are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct ValidateRequest {
    #[serde(default)]
    #[validate(
        required(message = "firebase_uid is required"),
        length(min = 1, max = 128, message = "firebase_uid is required")
    )]
    pub firebase_uid: Option<String>,

    #[serde(default)]
    #[validate(required(message = "answer must be a string"))]
    pub answer: Option<String>,

    #[serde(default, rename = "puzzleDate")]
    pub puzzle_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub user_id: String,
    pub raw_answer: String,
    pub date: CalendarDate,
}

impl ValidateRequest {
    /// Resolves the request against `today`. A missing `puzzleDate` means
    /// today; dates after today are refused because the response reveals the
    /// canonical answer.
    pub fn into_submission(self, today: CalendarDate) -> Result<AnswerSubmission, String> {
        self.validate()
            .map_err(|e| format!("Validation error: {}", e))?;

        let date = match self.puzzle_date.as_deref() {
            None => today,
            Some(raw) => CalendarDate::parse(raw).map_err(|e| e.to_string())?,
        };
        if date > today {
            return Err(format!("Puzzle for {} is not available yet", date));
        }

        match (self.firebase_uid, self.answer) {
            (Some(user_id), Some(raw_answer)) => Ok(AnswerSubmission {
                user_id,
                raw_answer,
                date,
            }),
            _ => Err("Invalid request".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub correct: bool,
    pub added_score: i64,
    pub correct_answer: String,
}

impl From<Verdict> for ValidateResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            correct: verdict.correct,
            added_score: verdict.points_awarded,
            correct_answer: verdict.canonical_answer,
        }
    }
}
