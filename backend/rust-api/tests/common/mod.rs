#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use daily_puzzle_api::{
    config::Config,
    create_router,
    middlewares::{auth::IdentityClaims, rate_limit::RateLimiter},
    models::{CalendarDate, LeaderboardEntry, ScoreRecord, UserStats},
    services::{AppState, MemoryScoreLedger, ScoreLedger},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-identity-secret";

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = Some(TEST_SECRET.to_string());
    config
}

pub fn create_test_state(config: Config) -> Arc<AppState> {
    create_test_state_with_ledger(config, Arc::new(MemoryScoreLedger::new()))
}

pub fn create_test_state_with_ledger(
    config: Config,
    ledger: Arc<dyn ScoreLedger>,
) -> Arc<AppState> {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    Arc::new(
        AppState::with_backends(config, ledger, RateLimiter::in_memory())
            .expect("Failed to initialize test app state"),
    )
}

pub fn create_test_app() -> Router {
    create_router(create_test_state(test_config()))
}

pub fn create_test_app_with(config: Config) -> Router {
    create_router(create_test_state(config))
}

pub fn create_test_app_with_ledger(ledger: Arc<dyn ScoreLedger>) -> Router {
    create_router(create_test_state_with_ledger(test_config(), ledger))
}

/// Memory ledger whose writes start failing after `healthy_writes` successes.
/// Reads always go through.
pub struct FailingLedger {
    inner: MemoryScoreLedger,
    healthy_writes: usize,
    writes: AtomicUsize,
}

impl FailingLedger {
    pub fn after(healthy_writes: usize) -> Self {
        Self {
            inner: MemoryScoreLedger::new(),
            healthy_writes,
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ScoreLedger for FailingLedger {
    async fn record_score(&self, record: &ScoreRecord) -> anyhow::Result<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.healthy_writes {
            anyhow::bail!("connection reset by peer");
        }
        self.inner.record_score(record).await
    }

    async fn top_scores(
        &self,
        date: CalendarDate,
        limit: usize,
    ) -> anyhow::Result<Vec<LeaderboardEntry>> {
        self.inner.top_scores(date, limit).await
    }

    async fn user_stats(&self, user_id: &str) -> anyhow::Result<UserStats> {
        self.inner.user_stats(user_id).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.inner.ping().await
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Identity token for `uid`, signed with the test secret.
pub fn token_for(uid: &str) -> String {
    let state = create_test_state(test_config());
    let now = chrono::Utc::now().timestamp() as usize;
    state
        .identity
        .generate_token(&IdentityClaims {
            sub: uid.to_string(),
            exp: now + 3600,
            iat: now,
        })
        .expect("Failed to sign test token")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Sends `request` and returns the status with the body parsed as JSON
/// (non-JSON bodies come back as a string value).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}
