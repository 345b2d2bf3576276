use candle_core::config::{parse_env, required_env};
use candle_core::{ConflictPolicy, Result};
use serde::Deserialize;

/// Postgres caps bind parameters per statement at 65535; a candle row binds 8
pub const MAX_INSERT_CHUNK_SIZE: usize = 8000;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Rows per INSERT statement inside a batch transaction
    #[serde(default = "default_insert_chunk_size")]
    pub insert_chunk_size: usize,

    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_insert_chunk_size() -> usize {
    3000
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            insert_chunk_size: default_insert_chunk_size(),
            conflict_policy: ConflictPolicy::default(),
        }
    }

    /// Whether `DATABASE_URL` is set at all
    pub fn requested() -> bool {
        std::env::var("DATABASE_URL").is_ok()
    }

    pub fn from_env() -> Result<Self> {
        let conflict_policy = match std::env::var("CANDLE_CONFLICT_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => ConflictPolicy::default(),
        };

        let insert_chunk_size = parse_env("CANDLE_INSERT_CHUNK_SIZE")?
            .unwrap_or_else(default_insert_chunk_size)
            .clamp(1, MAX_INSERT_CHUNK_SIZE);

        Ok(Self {
            url: required_env("DATABASE_URL")?,
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS")?
                .unwrap_or_else(default_max_connections),
            min_connections: parse_env("DATABASE_MIN_CONNECTIONS")?
                .unwrap_or_else(default_min_connections),
            connect_timeout_secs: parse_env("DATABASE_CONNECT_TIMEOUT")?
                .unwrap_or_else(default_connect_timeout),
            idle_timeout_secs: parse_env("DATABASE_IDLE_TIMEOUT")?
                .unwrap_or_else(default_idle_timeout),
            insert_chunk_size,
            conflict_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::new("postgres://localhost/candles");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.insert_chunk_size, 3000);
        assert_eq!(config.conflict_policy, ConflictPolicy::Fail);
    }
}
