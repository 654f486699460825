use crate::{env_parse, env_required, ConfigError, FromEnv};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Postgres connection settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    /// Upper bound of the connection pool
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl FromEnv for DatabaseConfig {
    /// `DATABASE_URL` is required; `DATABASE_MAX_CONNECTIONS` defaults to 10
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("DATABASE_URL")?,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
        })
    }
}
