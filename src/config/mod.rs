use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

use crate::auth::{validate_secret, TokenError};

/// Errors raised while assembling configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid JWT_SECRET: {0}")]
    InvalidSecret(#[from] TokenError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    /// Schema migrations run on startup everywhere except production.
    pub fn auto_migrate(&self) -> bool {
        !matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
    /// Empty means permissive CORS.
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(self.ssl_mode)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("connection_timeout", &self.connection_timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub bcrypt_cost: u32,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Environment presets are chosen by `APP_ENV`, then individual
    /// variables override them. The result is validated before return.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_name(lookup("APP_ENV").as_deref());

        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        self.server.port = parse_or(lookup, "APP_PORT", self.server.port)?;
        if let Some(v) = lookup("LOG_LEVEL") {
            self.server.log_level = v;
        }
        self.server.request_timeout_secs =
            parse_or(lookup, "REQUEST_TIMEOUT_SECS", self.server.request_timeout_secs)?;
        self.server.shutdown_grace_secs =
            parse_or(lookup, "SHUTDOWN_GRACE_SECS", self.server.shutdown_grace_secs)?;
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database overrides
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        self.database.port = parse_or(lookup, "DB_PORT", self.database.port)?;
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASS") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        self.database.ssl_mode = parse_or(lookup, "DB_SSLMODE", self.database.ssl_mode)?;
        self.database.max_connections =
            parse_or(lookup, "DATABASE_MAX_CONNECTIONS", self.database.max_connections)?;
        self.database.connection_timeout =
            parse_or(lookup, "DATABASE_CONNECTION_TIMEOUT", self.database.connection_timeout)?;

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        self.security.jwt_expiry_hours =
            parse_or(lookup, "JWT_EXPIRY_HOURS", self.security.jwt_expiry_hours)?;
        self.security.bcrypt_cost = parse_or(lookup, "BCRYPT_COST", self.security.bcrypt_cost)?;

        Ok(self)
    }

    /// Reject configurations the server must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_secret(&self.security.jwt_secret)?;

        if self.security.jwt_expiry_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRY_HOURS",
                value: self.security.jwt_expiry_hours.to_string(),
            });
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "BCRYPT_COST",
                value: self.security.bcrypt_cost.to_string(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3001,
                log_level: "info".to_string(),
                request_timeout_secs: 30,
                shutdown_grace_secs: 10,
                cors_origins: Vec::new(),
            },
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: String::new(),
                name: "nexo".to_string(),
                ssl_mode: PgSslMode::Disable,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.ssl_mode = PgSslMode::Prefer;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.server.request_timeout_secs = 15;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.ssl_mode = PgSslMode::Require;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.server.request_timeout_secs = 15;
        config
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, current: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(current),
    }
}
