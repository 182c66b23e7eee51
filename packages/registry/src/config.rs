use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::common::PageLimits;

/// Application configuration loaded from environment variables
///
/// The token signing secret is deliberately absent: the credential verifier
/// generates its own at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub token_issuer: String,
    pub token_ttl_hours: i64,
    /// argon2 time cost
    pub password_hash_cost: u32,
    pub document_root: PathBuf,
    pub max_document_bytes: usize,
    pub default_page_limit: i64,
    pub max_page_limit: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let config = Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            token_issuer: env::var("TOKEN_ISSUER")
                .unwrap_or_else(|_| "expert-registry".to_string()),
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", 24)?,
            password_hash_cost: parse_or("PASSWORD_HASH_COST", 3)?,
            document_root: env::var("DOCUMENT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./uploads")),
            max_document_bytes: parse_or("MAX_DOCUMENT_BYTES", 10 * 1024 * 1024)?,
            default_page_limit: parse_or("DEFAULT_PAGE_LIMIT", 100)?,
            max_page_limit: parse_or("MAX_PAGE_LIMIT", 500)?,
        };

        if config.token_ttl_hours <= 0 {
            anyhow::bail!("TOKEN_TTL_HOURS must be positive");
        }
        if config.default_page_limit <= 0 || config.default_page_limit > config.max_page_limit {
            anyhow::bail!("DEFAULT_PAGE_LIMIT must be between 1 and MAX_PAGE_LIMIT");
        }

        Ok(config)
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}
