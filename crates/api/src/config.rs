//! Application configuration loaded from environment variables.

use std::time::Duration;

use storage::{DatabaseConfig, RetryPolicy};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `APP_NAME`: service name reported by `/health` (default: `"storefront"`)
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset selects the in-memory backend
/// - `DB_MAX_CONNECTIONS`, `DB_MIN_CONNECTIONS`: pool bounds (`100`, `5`)
/// - `DB_ACQUIRE_TIMEOUT_SECS`, `DB_MAX_LIFETIME_SECS`, `DB_IDLE_TIMEOUT_SECS`:
///   pool timeouts (`5`, `300`, `300`)
/// - `DB_CONNECT_RETRIES`, `DB_RETRY_INTERVAL_SECS`: startup retry (`5`, `2`)
/// - `LOG_REDACT_FIELDS`: comma separated field names added to the log deny-list
/// - `RUN_MIGRATIONS`: apply schema migrations at startup (default: `true`)
///
/// Unparseable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_max_lifetime_secs: u64,
    pub db_idle_timeout_secs: u64,
    pub db_connect_retries: u32,
    pub db_retry_interval_secs: u64,
    pub redact_fields: Vec<String>,
    pub run_migrations: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_max_connections: number("DB_MAX_CONNECTIONS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.db_max_connections),
            db_min_connections: number("DB_MIN_CONNECTIONS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.db_min_connections),
            db_acquire_timeout_secs: number("DB_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or(defaults.db_acquire_timeout_secs),
            db_max_lifetime_secs: number("DB_MAX_LIFETIME_SECS")
                .unwrap_or(defaults.db_max_lifetime_secs),
            db_idle_timeout_secs: number("DB_IDLE_TIMEOUT_SECS")
                .unwrap_or(defaults.db_idle_timeout_secs),
            db_connect_retries: number("DB_CONNECT_RETRIES")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.db_connect_retries),
            db_retry_interval_secs: number("DB_RETRY_INTERVAL_SECS")
                .unwrap_or(defaults.db_retry_interval_secs),
            redact_fields: lookup("LOG_REDACT_FIELDS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            run_migrations: lookup("RUN_MIGRATIONS")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(defaults.run_migrations),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pool settings, or `None` when no database is configured.
    pub fn database(&self) -> Option<DatabaseConfig> {
        let url = self.database_url.as_ref()?;
        let mut db = DatabaseConfig::new(url.clone());
        db.max_connections = self.db_max_connections;
        db.min_connections = self.db_min_connections;
        db.acquire_timeout = Duration::from_secs(self.db_acquire_timeout_secs);
        db.max_lifetime = Duration::from_secs(self.db_max_lifetime_secs);
        db.idle_timeout = Duration::from_secs(self.db_idle_timeout_secs);
        Some(db)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.db_connect_retries,
            interval: Duration::from_secs(self.db_retry_interval_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "storefront".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            db_max_connections: 100,
            db_min_connections: 5,
            db_acquire_timeout_secs: 5,
            db_max_lifetime_secs: 300,
            db_idle_timeout_secs: 300,
            db_connect_retries: 5,
            db_retry_interval_secs: 2,
            redact_fields: Vec::new(),
            run_migrations: true,
        }
    }
}
