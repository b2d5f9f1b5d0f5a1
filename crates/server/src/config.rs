//! Server configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::db::StoreConfig;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub cors_origins: Vec<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_connections: usize,
    pub log_level: String,
    /// Also write JSON logs to a daily rolling file in this directory
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "host=localhost user=postgres dbname=medibridge".into()),
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| vec!["*".to_string()]),
            connect_timeout: Duration::from_secs(env_or("DB_CONNECT_TIMEOUT_SECS", 5)),
            read_timeout: Duration::from_millis(env_or("DB_READ_TIMEOUT_MS", 3000)),
            max_connections: env_or("DB_MAX_CONNECTIONS", 16),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().map(PathBuf::from),
        }
    }

    /// Connection settings for the document store
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url.clone(),
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            max_connections: self.max_connections,
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when unset or malformed
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_origin_list() {
        assert_eq!(
            parse_list("https://a.example, https://b.example ,,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn malformed_numbers_fall_back() {
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var("MEDIBRIDGE_TEST_TIMEOUT", "soon") };
        assert_eq!(env_or("MEDIBRIDGE_TEST_TIMEOUT", 5u64), 5);
        assert_eq!(env_or("MEDIBRIDGE_TEST_UNSET", 7usize), 7);
    }
}
