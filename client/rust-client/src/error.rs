use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("activity store lock poisoned")]
    Poisoned,

    #[error("activity store task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("not signed in")]
    NotSignedIn,

    #[error("puzzle for {0} was already attempted on this device")]
    AlreadyAttempted(NaiveDate),
}
