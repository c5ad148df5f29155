use axum::{response::IntoResponse, Json};

use crate::metrics::PUZZLES_SERVED_TOTAL;
use crate::models::{puzzle::PuzzleResponse, CalendarDate};
use crate::puzzles;

/// Today's (UTC) puzzle. The answer stays on the server.
pub async fn get_daily_puzzle() -> impl IntoResponse {
    let today = CalendarDate::today();
    let puzzle = puzzles::puzzle_for(today);

    tracing::debug!("Serving {} puzzle for {}", puzzle.kind.as_str(), today);
    PUZZLES_SERVED_TOTAL
        .with_label_values(&[puzzle.kind.as_str()])
        .inc();

    Json(PuzzleResponse::from(&puzzle))
}
