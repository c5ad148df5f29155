//! Deterministic puzzle of the day and server-side answer checking.
//!
//! Nothing here is stored: a puzzle is recomputed from its date on every call,
//! and the canonical answer never comes from the caller.

pub mod catalog;
pub mod seed;

use serde::Serialize;

use crate::models::calendar::CalendarDate;
use catalog::Template;

/// Points for a correct answer. There is no partial credit.
pub const POINTS_PER_CORRECT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleKind {
    Emoji,
    Code,
    Logic,
    Scramble,
    Pattern,
    Math,
}

/// Categories the puzzle of the day rotates through, indexed by
/// `daily_seed mod 5`. `Math` is generated on request only.
pub const DAILY_ROTATION: [PuzzleKind; 5] = [
    PuzzleKind::Emoji,
    PuzzleKind::Code,
    PuzzleKind::Logic,
    PuzzleKind::Scramble,
    PuzzleKind::Pattern,
];

impl PuzzleKind {
    pub const ALL: [PuzzleKind; 6] = [
        PuzzleKind::Emoji,
        PuzzleKind::Code,
        PuzzleKind::Logic,
        PuzzleKind::Scramble,
        PuzzleKind::Pattern,
        PuzzleKind::Math,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PuzzleKind::Emoji => "emoji",
            PuzzleKind::Code => "code",
            PuzzleKind::Logic => "logic",
            PuzzleKind::Scramble => "scramble",
            PuzzleKind::Pattern => "pattern",
            PuzzleKind::Math => "math",
        }
    }

    /// Relative difficulty reported to clients, 1 (easy) to 3 (hard).
    pub fn difficulty(&self) -> u8 {
        match self {
            PuzzleKind::Emoji | PuzzleKind::Scramble | PuzzleKind::Math => 1,
            PuzzleKind::Code | PuzzleKind::Pattern => 2,
            PuzzleKind::Logic => 3,
        }
    }

    fn templates(&self) -> &'static [Template] {
        match self {
            PuzzleKind::Emoji => catalog::EMOJI,
            PuzzleKind::Code => catalog::CODE,
            PuzzleKind::Logic => catalog::LOGIC,
            PuzzleKind::Scramble => catalog::SCRAMBLE,
            PuzzleKind::Pattern => catalog::PATTERN,
            PuzzleKind::Math => &[],
        }
    }

    /// Per-kind selection seed.
    pub fn seed(&self, date: &CalendarDate) -> u32 {
        match self {
            PuzzleKind::Emoji => seed::positional_seed(date, &[0, 5]),
            PuzzleKind::Code => seed::positional_seed(date, &[2, 6]),
            PuzzleKind::Logic => seed::positional_seed(date, &[3, 7]),
            PuzzleKind::Scramble => seed::positional_seed(date, &[4, 8]),
            PuzzleKind::Pattern => seed::positional_seed(date, &[1, 9]),
            PuzzleKind::Math => seed::daily_seed(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub date: CalendarDate,
    pub kind: PuzzleKind,
    pub question: String,
    answer: String,
}

impl Puzzle {
    pub fn generate(kind: PuzzleKind, date: CalendarDate) -> Self {
        let seed = kind.seed(&date);
        let (question, answer) = match kind {
            PuzzleKind::Math => {
                let a = seed % 10;
                let b = (seed * 2) % 10;
                (format!("What is {a} + {b}?"), (a + b).to_string())
            }
            _ => {
                let templates = kind.templates();
                let selected = templates[seed as usize % templates.len()];
                (selected.question.to_string(), selected.answer.to_string())
            }
        };

        Self {
            date,
            kind,
            question,
            answer,
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn check(&self, candidate: &str) -> bool {
        normalize_answer(candidate) == normalize_answer(&self.answer)
    }
}

/// The puzzle of the day for `date`.
pub fn puzzle_for(date: CalendarDate) -> Puzzle {
    let index = seed::daily_seed(&date) as usize % DAILY_ROTATION.len();
    Puzzle::generate(DAILY_ROTATION[index], date)
}

/// Trim surrounding whitespace and case-fold.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub canonical_answer: String,
    pub points_awarded: i64,
}

/// Checks `raw` against the canonical answer recomputed for `date`.
pub fn validate(date: CalendarDate, raw: &str) -> Verdict {
    let puzzle = puzzle_for(date);
    let correct = puzzle.check(raw);
    Verdict {
        correct,
        points_awarded: if correct { POINTS_PER_CORRECT } else { 0 },
        canonical_answer: puzzle.answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use proptest::prelude::*;

    fn date(raw: &str) -> CalendarDate {
        CalendarDate::parse(raw).unwrap()
    }

    fn date_from_offset(days: u64) -> CalendarDate {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        CalendarDate::new(start + Days::new(days)).unwrap()
    }

    fn flip_case(answer: &str, flips: &[bool]) -> String {
        answer
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if flips.get(i).copied().unwrap_or(false) {
                    if c.is_lowercase() {
                        c.to_ascii_uppercase()
                    } else {
                        c.to_ascii_lowercase()
                    }
                } else {
                    c
                }
            })
            .collect()
    }

    #[test]
    fn reference_date_resolves_to_code_puzzle() {
        let puzzle = puzzle_for(date("2024-03-15"));
        assert_eq!(puzzle.kind, PuzzleKind::Code);
        assert_eq!(puzzle.question, "What is typeof null?");
        assert_eq!(puzzle.answer(), "object");
    }

    #[test]
    fn reference_date_verdicts() {
        let day = date("2024-03-15");

        let hit = validate(day, "object");
        assert!(hit.correct);
        assert_eq!(hit.points_awarded, 10);

        let miss = validate(day, " wrong ");
        assert!(!miss.correct);
        assert_eq!(miss.points_awarded, 0);
        assert_eq!(miss.canonical_answer, "object");
    }

    #[test]
    fn same_date_same_question() {
        for offset in 0..400 {
            let day = date_from_offset(offset);
            assert_eq!(puzzle_for(day), puzzle_for(day));
        }
    }

    #[test]
    fn rotation_covers_every_daily_kind() {
        let mut seen = std::collections::HashSet::new();
        for offset in 0..60 {
            seen.insert(puzzle_for(date_from_offset(offset)).kind);
        }
        for kind in DAILY_ROTATION {
            assert!(seen.contains(&kind), "{kind:?} never selected");
        }
        assert!(!seen.contains(&PuzzleKind::Math));
    }

    #[test]
    fn math_puzzle_uses_daily_seed() {
        // daily seed 491 -> a = 1, b = 2
        let puzzle = Puzzle::generate(PuzzleKind::Math, date("2024-03-15"));
        assert_eq!(puzzle.question, "What is 1 + 2?");
        assert!(puzzle.check(" 3 "));
    }

    #[test]
    fn every_kind_generates_a_question() {
        let day = date("2025-12-31");
        for kind in PuzzleKind::ALL {
            let puzzle = Puzzle::generate(kind, day);
            assert!(!puzzle.question.is_empty());
            assert!(puzzle.check(puzzle.answer()));
        }
    }

    #[test]
    fn multi_word_answers_compare_case_insensitively() {
        let day = date("2024-03-15");
        let puzzle = Puzzle::generate(PuzzleKind::Emoji, day);
        let shouted = puzzle.answer().to_uppercase();
        assert!(puzzle.check(&format!("  {shouted}\n")));
    }

    proptest! {
        #[test]
        fn whitespace_and_case_variants_are_accepted(
            offset in 0u64..3650,
            left in "[ \t\n]{0,3}",
            right in "[ \t\n]{0,3}",
            flips in proptest::collection::vec(any::<bool>(), 0..32),
        ) {
            let day = date_from_offset(offset);
            let canonical = puzzle_for(day).answer().to_string();
            let candidate = format!("{left}{}{right}", flip_case(&canonical, &flips));
            prop_assert!(validate(day, &candidate).correct);
        }

        #[test]
        fn trailing_punctuation_is_rejected(
            offset in 0u64..3650,
            mark in prop::sample::select(vec![".", "!", "?", ","]),
        ) {
            let day = date_from_offset(offset);
            let canonical = puzzle_for(day).answer().to_string();
            let verdict = validate(day, &format!("{canonical}{mark}"));
            prop_assert!(!verdict.correct);
            prop_assert_eq!(verdict.points_awarded, 0);
        }

        #[test]
        fn correct_only_on_normalized_equality(offset in 0u64..3650, candidate in "\\PC{0,24}") {
            let day = date_from_offset(offset);
            let verdict = validate(day, &candidate);
            let expected = normalize_answer(&candidate) == normalize_answer(&verdict.canonical_answer);
            prop_assert_eq!(verdict.correct, expected);
        }
    }
}
