use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub redis_uri: Option<String>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub sync: SyncConfig,
    pub leaderboard_limit: usize,
    /// `username:password` expected on `/metrics`.
    pub metrics_auth: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum IdentityAlgorithm {
    /// Shared secret, for self-issued tokens.
    HS256,
    /// Identity provider's public key (PEM).
    RS256,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub algorithm: IdentityAlgorithm,
    pub jwt_secret: Option<String>,
    pub public_key_pem: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub max_batch_entries: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            mongo_uri: None,
            mongo_database: "daily_puzzle".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: IdentityAlgorithm::HS256,
            jwt_secret: None,
            public_key_pem: None,
            issuer: None,
            audience: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_seconds: 60,
            disabled: false,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_batch_entries: 400,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            redis_uri: None,
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            sync: SyncConfig::default(),
            leaderboard_limit: 10,
            metrics_auth: "admin:changeme".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Local .env is optional; real deployments set the environment directly
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let lookup = |key: &str, env_key: &str| -> Option<String> {
            settings
                .get_string(key)
                .ok()
                .or_else(|| env::var(env_key).ok())
                .filter(|value| !value.trim().is_empty())
        };

        let server = ServerConfig {
            host: lookup("server.host", "HOST").unwrap_or(defaults.server.host),
            port: parse_or("server.port", lookup("server.port", "PORT"), defaults.server.port)?,
        };

        let mongo_uri = lookup("storage.mongo_uri", "MONGO_URI");
        let backend = match lookup("storage.backend", "STORAGE_BACKEND").as_deref() {
            Some("mongo") => StorageBackend::Mongo,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(config::ConfigError::Message(format!(
                    "storage.backend must be 'memory' or 'mongo', got '{}'",
                    other
                )))
            }
            // A configured Mongo URI implies the Mongo ledger
            None if mongo_uri.is_some() => StorageBackend::Mongo,
            None => StorageBackend::Memory,
        };
        if backend == StorageBackend::Mongo && mongo_uri.is_none() {
            return Err(config::ConfigError::Message(
                "storage.mongo_uri (or MONGO_URI) is required for the mongo backend".to_string(),
            ));
        }
        let storage = StorageConfig {
            backend,
            mongo_uri,
            mongo_database: lookup("storage.mongo_database", "MONGO_DATABASE")
                .unwrap_or(defaults.storage.mongo_database),
        };

        let algorithm = match lookup("auth.algorithm", "JWT_ALGORITHM").as_deref() {
            None | Some("HS256") => IdentityAlgorithm::HS256,
            Some("RS256") => IdentityAlgorithm::RS256,
            Some(other) => {
                return Err(config::ConfigError::Message(format!(
                    "auth.algorithm must be HS256 or RS256, got '{}'",
                    other
                )))
            }
        };
        let mut jwt_secret = lookup("auth.jwt_secret", "JWT_SECRET");
        let public_key_pem = lookup("auth.public_key_pem", "JWT_PUBLIC_KEY_PEM");
        match algorithm {
            IdentityAlgorithm::HS256 if jwt_secret.is_none() => {
                if app_env == "prod" {
                    return Err(config::ConfigError::Message(
                        "JWT_SECRET must be set in production".to_string(),
                    ));
                }
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                jwt_secret = Some("dev-secret-only-for-local-testing".to_string());
            }
            IdentityAlgorithm::RS256 if public_key_pem.is_none() => {
                return Err(config::ConfigError::Message(
                    "auth.public_key_pem (or JWT_PUBLIC_KEY_PEM) is required for RS256".to_string(),
                ));
            }
            _ => {}
        }
        let auth = AuthConfig {
            algorithm,
            jwt_secret,
            public_key_pem,
            issuer: lookup("auth.issuer", "JWT_ISSUER"),
            audience: lookup("auth.audience", "JWT_AUDIENCE"),
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_or(
                "rate_limit.max_requests",
                lookup("rate_limit.max_requests", "RATE_LIMIT_MAX_REQUESTS"),
                defaults.rate_limit.max_requests,
            )?,
            window_seconds: parse_or(
                "rate_limit.window_seconds",
                lookup("rate_limit.window_seconds", "RATE_LIMIT_WINDOW_SECONDS"),
                defaults.rate_limit.window_seconds,
            )?,
            disabled: lookup("rate_limit.disabled", "RATE_LIMIT_DISABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        require_positive("rate_limit.max_requests", rate_limit.max_requests as usize)?;

        let sync = SyncConfig {
            max_batch_entries: parse_or(
                "sync.max_batch_entries",
                lookup("sync.max_batch_entries", "SYNC_MAX_BATCH_ENTRIES"),
                defaults.sync.max_batch_entries,
            )?,
        };

        let leaderboard_limit = parse_or(
            "leaderboard.limit",
            lookup("leaderboard.limit", "LEADERBOARD_LIMIT"),
            defaults.leaderboard_limit,
        )?;
        require_positive("leaderboard.limit", leaderboard_limit)?;

        Ok(Config {
            server,
            storage,
            redis_uri: lookup("redis.uri", "REDIS_URI"),
            auth,
            rate_limit,
            sync,
            leaderboard_limit,
            metrics_auth: lookup("metrics.auth", "METRICS_AUTH").unwrap_or(defaults.metrics_auth),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, config::ConfigError>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| {
            config::ConfigError::Message(format!("{} has an invalid value: '{}'", key, value))
        }),
    }
}

// Mongo reads a zero limit as unbounded; the memory backends as none allowed
fn require_positive(key: &str, value: usize) -> Result<(), config::ConfigError> {
    if value == 0 {
        return Err(config::ConfigError::Message(format!(
            "{} must be greater than zero",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "APP_ENV",
        "STORAGE_BACKEND",
        "MONGO_URI",
        "JWT_SECRET",
        "JWT_ALGORITHM",
        "JWT_PUBLIC_KEY_PEM",
        "RATE_LIMIT_MAX_REQUESTS",
        "LEADERBOARD_LIMIT",
        "PORT",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial_test::serial]
    fn defaults_to_memory_backend_in_dev() {
        clear_env();
        let config = Config::load().unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.leaderboard_limit, 10);
        assert!(config.auth.jwt_secret.is_some());
    }

    #[test]
    #[serial_test::serial]
    fn mongo_uri_selects_mongo_backend() {
        clear_env();
        env::set_var("MONGO_URI", "mongodb://localhost:27017");
        let config = Config::load().unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Mongo);
        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn production_requires_identity_key() {
        clear_env();
        env::set_var("APP_ENV", "prod");
        assert!(Config::load().is_err());
        env::set_var("JWT_SECRET", "prod-secret");
        assert!(Config::load().is_ok());
        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn rejects_unparseable_numbers() {
        clear_env();
        env::set_var("RATE_LIMIT_MAX_REQUESTS", "lots");
        assert!(Config::load().is_err());
        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn rejects_zero_limits() {
        clear_env();
        env::set_var("RATE_LIMIT_MAX_REQUESTS", "0");
        assert!(Config::load().is_err());

        clear_env();
        env::set_var("LEADERBOARD_LIMIT", "0");
        assert!(Config::load().is_err());

        env::set_var("LEADERBOARD_LIMIT", "5");
        assert_eq!(Config::load().unwrap().leaderboard_limit, 5);
        clear_env();
    }
}
