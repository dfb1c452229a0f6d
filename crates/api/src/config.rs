use folio_core::edit_lock::LOCK_SWEEP_INTERVAL_SECS;
use folio_core::rate_limit::DEFAULT_EDIT_RATE_LIMIT;
use folio_engine::EngineConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT verification settings.
    pub jwt: JwtConfig,
    /// Edit actions allowed per actor per rate window (default: `20`).
    pub edit_rate_limit: i64,
    /// Whether callers without a token may propose edits (default: `false`).
    pub anonymous_can_edit: bool,
    /// Seconds between maintenance passes (default: `60`).
    pub lock_sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `EDIT_RATE_LIMIT`          | `20`                       |
    /// | `ANONYMOUS_CAN_EDIT`       | `false`                    |
    /// | `LOCK_SWEEP_INTERVAL_SECS` | `60`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let edit_rate_limit: i64 = std::env::var("EDIT_RATE_LIMIT")
            .unwrap_or_else(|_| DEFAULT_EDIT_RATE_LIMIT.to_string())
            .parse()
            .expect("EDIT_RATE_LIMIT must be a valid i64");
        assert!(edit_rate_limit > 0, "EDIT_RATE_LIMIT must be positive");

        let anonymous_can_edit: bool = std::env::var("ANONYMOUS_CAN_EDIT")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("ANONYMOUS_CAN_EDIT must be true or false");

        let lock_sweep_interval_secs: u64 = std::env::var("LOCK_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| LOCK_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("LOCK_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(
            lock_sweep_interval_secs > 0,
            "LOCK_SWEEP_INTERVAL_SECS must be positive"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            edit_rate_limit,
            anonymous_can_edit,
            lock_sweep_interval_secs,
        }
    }

    /// The engine tunables carried by this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            edit_rate_limit: self.edit_rate_limit,
            anonymous_can_edit: self.anonymous_can_edit,
        }
    }
}
