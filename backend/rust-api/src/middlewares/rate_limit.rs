use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::ApiError;
use crate::metrics::RATE_LIMITED_REQUESTS_TOTAL;
use crate::services::AppState;

const REJECTION_MESSAGE: &str = "Too many requests, please try again later.";

// Expired windows are pruned once the map grows past this
const MEMORY_PRUNE_THRESHOLD: usize = 10_000;

/// Fixed-window request counter keyed by client address.
pub enum RateLimiter {
    /// Shared counters, atomic through a Lua script.
    Redis(ConnectionManager),
    /// Per-process counters.
    Memory(Mutex<HashMap<String, FixedWindow>>),
}

#[derive(Debug, Clone, Copy)]
pub struct FixedWindow {
    started_at: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn in_memory() -> Self {
        RateLimiter::Memory(Mutex::new(HashMap::new()))
    }

    /// Counts one request against `key` and reports whether it is allowed.
    pub async fn check(&self, key: &str, limit: u32, window: Duration) -> anyhow::Result<bool> {
        match self {
            RateLimiter::Redis(redis) => check_rate_limit_redis(redis, key, limit, window).await,
            RateLimiter::Memory(windows) => {
                let mut windows = windows
                    .lock()
                    .map_err(|_| anyhow::anyhow!("rate limit state poisoned"))?;
                let now = Instant::now();

                if windows.len() > MEMORY_PRUNE_THRESHOLD {
                    windows.retain(|_, w| now.duration_since(w.started_at) < window);
                }

                let entry = windows.entry(key.to_string()).or_insert(FixedWindow {
                    started_at: now,
                    count: 0,
                });
                if now.duration_since(entry.started_at) >= window {
                    *entry = FixedWindow {
                        started_at: now,
                        count: 0,
                    };
                }
                if entry.count >= limit {
                    return Ok(false);
                }
                entry.count += 1;
                Ok(true)
            }
        }
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match self {
            RateLimiter::Redis(redis) => {
                let mut conn = redis.clone();
                redis::cmd("PING").query_async::<String>(&mut conn).await?;
                Ok(())
            }
            RateLimiter::Memory(_) => Ok(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            RateLimiter::Redis(_) => "redis",
            RateLimiter::Memory(_) => "memory",
        }
    }
}

fn extract_client_ip_from(headers: &HeaderMap, extensions: &axum::http::Extensions) -> String {
    // Preferred order: X-Forwarded-For, Forwarded, X-Real-IP, ConnectInfo
    if let Some(v) = headers.get("x-forwarded-for") {
        if let Ok(s) = v.to_str() {
            // x-forwarded-for can be a comma separated list; take first
            return s.split(',').next().unwrap_or(s).trim().to_string();
        }
    }

    if let Some(v) = headers.get("forwarded") {
        if let Ok(s) = v.to_str() {
            // forwarded: for=1.2.3.4; proto=http; by=...
            for part in s.split(';') {
                let p = part.trim();
                if p.starts_with("for=") {
                    let val = p.trim_start_matches("for=").trim().trim_matches('\"');
                    return val.to_string();
                }
            }
        }
    }

    if let Some(v) = headers.get("x-real-ip") {
        if let Ok(s) = v.to_str() {
            return s.trim().to_string();
        }
    }

    // Fall back to ConnectInfo socket address if available
    if let Some(ci) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return ci.0.ip().to_string();
    }

    "unknown".to_string()
}

/// Caps requests per client address within a fixed window.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let settings = &state.config.rate_limit;
    if settings.disabled {
        tracing::debug!("Rate limiting disabled by configuration");
        return Ok(next.run(request).await);
    }

    let client_ip = extract_client_ip_from(request.headers(), request.extensions());

    let allowed = state
        .rate_limiter
        .check(
            &format!("ratelimit:ip:{}", client_ip),
            settings.max_requests,
            Duration::from_secs(settings.window_seconds),
        )
        .await
        .map_err(|e| {
            tracing::error!("Rate limit check failed: {}", e);
            ApiError::internal("Rate limit check failed")
        })?;

    if !allowed {
        RATE_LIMITED_REQUESTS_TOTAL.inc();
        tracing::warn!("Rate limit exceeded for IP: {}", client_ip);
        return Err(ApiError::too_many_requests(REJECTION_MESSAGE));
    }

    Ok(next.run(request).await)
}

/// Check rate limit using Redis with Lua script for atomicity
async fn check_rate_limit_redis(
    redis: &ConnectionManager,
    key: &str,
    limit: u32,
    window: Duration,
) -> anyhow::Result<bool> {
    let mut conn = redis.clone();

    // The first request of a window sets the expiry; the window does not slide
    let lua_script = r#"
        local key = KEYS[1]
        local limit = tonumber(ARGV[1])
        local window = tonumber(ARGV[2])

        local current = redis.call('GET', key)

        if current == false then
            redis.call('SET', key, 1, 'EX', window)
            return 1
        end

        current = tonumber(current)

        if current >= limit then
            return 0
        end

        redis.call('INCR', key)
        return 1
    "#;

    let allowed: u32 = redis::Script::new(lua_script)
        .key(key)
        .arg(limit)
        .arg(window.as_secs().max(1))
        .invoke_async(&mut conn)
        .await?;

    Ok(allowed == 1)
}
