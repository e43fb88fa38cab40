use anyhow::{bail, Result};
use std::env;
use std::str::FromStr;
use tracing::Level;

use crate::dynamodb::Tables;

/// Which record store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(StoreBackend::DynamoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND '{other}' (expected 'dynamodb' or 'memory')"),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// AWS credentials, region and endpoint are not part of this; the SDK reads them
/// from its own standard variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    pub tables: Tables,
    pub log_level: Level,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `STORE_BACKEND` - `dynamodb` or `memory` (default: `dynamodb`)
    /// - `USERS_TABLE` - (default: "Users")
    /// - `INCOME_TABLE` - (default: "Income")
    /// - `BUDGET_TABLE` - (default: "Budget")
    /// - `EXPENSES_TABLE` - (default: "Expenses")
    /// - `LOG_LEVEL` - trace/debug/info/warn/error (default: info)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let backend: StoreBackend = var("STORE_BACKEND", "dynamodb").parse()?;
        let log_level = match Level::from_str(&var("LOG_LEVEL", "info")) {
            Ok(level) => level,
            Err(e) => bail!("invalid LOG_LEVEL: {e}"),
        };

        Ok(Self {
            backend,
            tables: Tables::new(
                var("USERS_TABLE", "Users"),
                var("INCOME_TABLE", "Income"),
                var("BUDGET_TABLE", "Budget"),
                var("EXPENSES_TABLE", "Expenses"),
            ),
            log_level,
        })
    }
}
