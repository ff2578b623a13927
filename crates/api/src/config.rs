//! API configuration.

use chrono::Duration;
use thiserror::Error;

use jobly_observability::LogFormat;

const DEV_JWT_SECRET: &str = "jobly-dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("{0} must be set to a non-default value when ENVIRONMENT=production")]
    MissingInProduction(&'static str),
}

/// API server configuration.
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_format: LogFormat,
    /// Environment (development/production)
    pub environment: String,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token_ttl", &self.token_ttl)
            .field("database", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("log_format", &self.log_format)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: Duration::hours(24),
            database_url: None,
            database_max_connections: 5,
            log_format: LogFormat::Pretty,
            environment: "development".to_string(),
        }
    }
}

fn parse_var<T: core::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid { name, value })
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let ttl_secs: i64 = parse_var("TOKEN_TTL_SECS", var("TOKEN_TTL_SECS"), 86_400)?;
        if ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_SECS",
                value: ttl_secs.to_string(),
            });
        }

        let config = Self {
            host: var("API_HOST").unwrap_or(defaults.host),
            port: parse_var("API_PORT", var("API_PORT"), defaults.port)?,
            jwt_secret: var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl: Duration::seconds(ttl_secs),
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                var("DATABASE_MAX_CONNECTIONS"),
                defaults.database_max_connections,
            )?,
            log_format: parse_var("LOG_FORMAT", var("LOG_FORMAT"), defaults.log_format)?,
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
        };

        if config.is_production() && config.uses_dev_secret() {
            return Err(ConfigError::MissingInProduction("JWT_SECRET"));
        }
        Ok(config)
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// True when tokens are signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
