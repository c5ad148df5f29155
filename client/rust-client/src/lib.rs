//! Device-side half of the daily puzzle game: a durable local activity log,
//! background upload of unsynced days, and streak/achievement evaluation.
//!
//! The crate never installs a tracing subscriber; hosts choose their own.

pub mod activity;
pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod streak;
pub mod sync;

pub use activity::ActivityEntry;
pub use api::{HttpPuzzleApi, Identity, PuzzleApi};
pub use config::ClientConfig;
pub use error::{ClientError, StoreError};
pub use session::GameSession;
pub use store::{ActivityStore, MemoryActivityStore, SqliteActivityStore};
pub use streak::{Achievement, PerfectMonthRule};
pub use sync::{SyncEngine, SyncOutcome, SyncPolicy, SyncTrigger};
