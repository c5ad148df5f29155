use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use redis::aio::ConnectionManager;

use crate::config::{Config, StorageBackend};
use crate::middlewares::auth::JwtService;
use crate::middlewares::rate_limit::RateLimiter;

pub mod answer_service;
pub mod mongo_ledger;
pub mod score_ledger;
pub mod sync_service;

pub use score_ledger::{MemoryScoreLedger, ScoreLedger};

pub struct AppState {
    pub config: Config,
    pub ledger: Arc<dyn ScoreLedger>,
    pub rate_limiter: RateLimiter,
    pub identity: JwtService,
}

impl AppState {
    /// Connects the backends selected by `config`.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let ledger: Arc<dyn ScoreLedger> = match config.storage.backend {
            StorageBackend::Mongo => {
                let uri = config
                    .storage
                    .mongo_uri
                    .as_deref()
                    .context("mongo backend selected without a MongoDB URI")?;
                tracing::info!("Connecting to MongoDB...");
                let ledger =
                    mongo_ledger::MongoScoreLedger::connect(uri, &config.storage.mongo_database)
                        .await?;
                tracing::info!("MongoDB score ledger ready");
                Arc::new(ledger)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory score ledger; scores are lost on restart");
                Arc::new(MemoryScoreLedger::new())
            }
        };

        let rate_limiter = match config.redis_uri.as_deref() {
            Some(uri) => RateLimiter::Redis(connect_redis(uri).await?),
            None => {
                tracing::warn!("REDIS_URI not set, rate limit counters are per process");
                RateLimiter::in_memory()
            }
        };

        Self::with_backends(config, ledger, rate_limiter)
    }

    /// Assembles state around already constructed backends.
    pub fn with_backends(
        config: Config,
        ledger: Arc<dyn ScoreLedger>,
        rate_limiter: RateLimiter,
    ) -> anyhow::Result<Self> {
        let identity =
            JwtService::from_config(&config.auth).context("Failed to load identity verifier")?;

        Ok(Self {
            config,
            ledger,
            rate_limiter,
            identity,
        })
    }
}

async fn connect_redis(uri: &str) -> anyhow::Result<ConnectionManager> {
    let client = redis::Client::open(uri).context("Invalid Redis URI")?;

    tracing::info!("Attempting to connect to Redis...");

    let redis = tokio::time::timeout(Duration::from_secs(30), ConnectionManager::new(client))
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

    tracing::info!("Redis ConnectionManager created, testing with PING...");

    let mut conn = redis.clone();
    tokio::time::timeout(
        Duration::from_secs(5),
        redis::cmd("PING").query_async::<String>(&mut conn),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

    tracing::info!("Redis connection established successfully");

    Ok(redis)
}
