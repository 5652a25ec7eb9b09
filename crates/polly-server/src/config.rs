use std::path::PathBuf;

use anyhow::{Context, Result};

pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("POLLY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("POLLY_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("POLLY_PORT is not a valid port: {raw:?}"))?,
            None => 3000,
        };

        let db_path = lookup("POLLY_DB_PATH").unwrap_or_else(|| "polly.db".into());
        let db_path = (db_path.trim() != IN_MEMORY).then(|| PathBuf::from(db_path));

        let seed_demo = lookup("POLLY_SEED_DEMO")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            db_path,
            seed_demo,
        })
    }
}
