pub mod answer;
pub mod calendar;
pub mod leaderboard;
pub mod puzzle;
pub mod sync;

pub use calendar::CalendarDate;
pub use leaderboard::{LeaderboardEntry, ScoreRecord, UserStats};
