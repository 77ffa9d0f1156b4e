//! Process-wide configuration loaded from the environment (and `.env` via `dotenv`).

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::auth::password::DEFAULT_COST;
use crate::auth::token::DEFAULT_TTL_SECS;

/// Placeholder signing secret. Accepted outside production only.
pub const DEV_JWT_SECRET: &str = "dev-secret-key-change-me";

const MIN_SECRET_LEN: usize = 10;

/// Longest accepted session lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Declared deployment mode (`APP_ENV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            "test" => Ok(AppEnv::Test),
            _ => Err(ConfigError::Invalid {
                key: "APP_ENV",
                reason: format!("`{}` is not one of development, production, test", value),
            }),
        }
    }
}

/// Startup failures. `main` logs these and exits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("JWT_SECRET must be set to a strong, unique value when APP_ENV=production")]
    InsecureSecret,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub bcrypt_cost: u32,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_statement_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Builds a config from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let app_env = match get("APP_ENV") {
            Some(value) => value.parse()?,
            None => AppEnv::Development,
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match (get("JWT_SECRET"), app_env) {
            (None, AppEnv::Production) => return Err(ConfigError::InsecureSecret),
            (Some(secret), AppEnv::Production) if secret == DEV_JWT_SECRET => {
                return Err(ConfigError::InsecureSecret)
            }
            (Some(secret), _) => secret,
            (None, _) => DEV_JWT_SECRET.to_string(),
        };
        if jwt_secret.chars().count() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} characters long", MIN_SECRET_LEN),
            });
        }

        let bcrypt_cost = parse_or(&get, "BCRYPT_COST", DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: "must be between 4 and 31".into(),
            });
        }

        let token_ttl_secs = parse_or(&get, "TOKEN_TTL_SECS", DEFAULT_TTL_SECS)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&token_ttl_secs) {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                reason: format!("must be between 1 and {} seconds", MAX_TOKEN_TTL_SECS),
            });
        }

        Ok(Self {
            app_env,
            database_url,
            server_port: parse_or(&get, "SERVER_PORT", 8080u16)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl_secs,
            bcrypt_cost,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10u32)?,
            db_acquire_timeout_secs: parse_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", 5u64)?,
            db_statement_timeout_ms: parse_or(&get, "DB_STATEMENT_TIMEOUT_MS", 5000u64)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T, F>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
