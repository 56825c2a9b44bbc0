use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::AppError;

/// Client-credentials app registration used for mailbox auto-replies.
#[derive(Clone, Debug)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    pub login_url: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Out-of-office runner
    pub ooo_enabled: bool,
    pub ooo_interval: Duration,
    pub graph: Option<GraphConfig>,

    pub holiday_cache_ttl: Duration,
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Config(format!("{key} must be set")))
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        // All three credentials or none.
        let graph = match (
            env::var("GRAPH_TENANT_ID"),
            env::var("GRAPH_CLIENT_ID"),
            env::var("GRAPH_CLIENT_SECRET"),
        ) {
            (Ok(tenant_id), Ok(client_id), Ok(client_secret)) => Some(GraphConfig {
                tenant_id,
                client_id,
                client_secret,
                base_url: env::var("GRAPH_BASE_URL")
                    .unwrap_or_else(|_| "https://graph.microsoft.com/v1.0".to_string()),
                login_url: env::var("GRAPH_LOGIN_URL")
                    .unwrap_or_else(|_| "https://login.microsoftonline.com".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            ooo_enabled: parsed_or("OOO_ENABLED", true)?,
            ooo_interval: Duration::from_secs(parsed_or("OOO_INTERVAL_SECS", 300)?),
            graph,

            holiday_cache_ttl: Duration::from_secs(parsed_or("HOLIDAY_CACHE_TTL_SECS", 86400)?), // 24h
        })
    }
}
