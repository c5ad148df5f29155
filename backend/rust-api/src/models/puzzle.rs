use serde::Serialize;

use super::calendar::CalendarDate;
use crate::puzzles::{Puzzle, PuzzleKind};

/// `GET /api/puzzle`. Never carries the answer.
#[derive(Debug, Serialize)]
pub struct PuzzleResponse {
    pub question: String,
    pub date: CalendarDate,
    pub kind: PuzzleKind,
    pub difficulty: u8,
}

impl From<&Puzzle> for PuzzleResponse {
    fn from(puzzle: &Puzzle) -> Self {
        Self {
            question: puzzle.question.clone(),
            date: puzzle.date,
            kind: puzzle.kind,
            difficulty: puzzle.kind.difficulty(),
        }
    }
}
