//! Simulation settings, read from the environment (after `.env` is loaded).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Standard (non-mining) participants of every simulation run.
pub const STANDARD_USERS: [&str; 10] = [
    "Nick",
    "Bob",
    "Alice",
    "Anna",
    "John",
    "Erick",
    "FastFood",
    "PcParts",
    "CarShop",
    "ClothesStore",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is not a valid value")]
    Invalid { key: &'static str, value: String },

    #[error("LEDGER_SPEND_CHANCE must be within [0, 1], got {0}")]
    SpendChanceOutOfRange(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub miners: usize,
    pub target_blocks: u64,
    pub spend_chance: f64,
    pub spend_pause: Duration,
    pub users: Vec<String>,
    pub snapshot: Option<PathBuf>,
    pub resume: bool,
    pub api_enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            miners: 10,
            target_blocks: 15,
            spend_chance: 0.05,
            spend_pause: Duration::from_millis(100),
            users: STANDARD_USERS.iter().map(|s| s.to_string()).collect(),
            snapshot: None,
            resume: false,
            api_enabled: false,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let spend_chance: f64 = parse(&lookup, "LEDGER_SPEND_CHANCE", d.spend_chance)?;
        if !(0.0..=1.0).contains(&spend_chance) {
            return Err(ConfigError::SpendChanceOutOfRange(spend_chance.to_string()));
        }
        Ok(Self {
            miners: parse(&lookup, "LEDGER_MINERS", d.miners)?,
            target_blocks: parse(&lookup, "LEDGER_TARGET_BLOCKS", d.target_blocks)?,
            spend_chance,
            spend_pause: Duration::from_millis(parse(&lookup, "LEDGER_SPEND_PAUSE_MS", 100u64)?),
            users: d.users,
            snapshot: lookup("LEDGER_SNAPSHOT")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            resume: parse(&lookup, "LEDGER_RESUME", d.resume)?,
            api_enabled: parse(&lookup, "LEDGER_API", d.api_enabled)?,
            host: lookup("HOST").unwrap_or(d.host),
            port: parse(&lookup, "PORT", d.port)?,
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
