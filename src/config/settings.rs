//! Application settings loaded from environment variables.
//!
//! Settings come from the process environment (optionally seeded from a
//! `.env` file loaded in `main`). Everything has a default so the binary
//! starts without any configuration.

use crate::errors::{Error, Result};

/// Default database location when `DATABASE_URL` is unset
const DEFAULT_DATABASE_URL: &str = "sqlite://data/tallybook.sqlite?mode=rwc";
/// Default threshold engine period in minutes
const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 15;

/// Runtime configuration for the ledger process
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SeaORM connection URL for the ledger database
    pub database_url: String,
    /// How often the threshold alert engine runs, in minutes
    pub check_interval_minutes: u64,
}

impl AppConfig {
    /// Loads configuration from the environment, falling back to defaults.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `TALLYBOOK_CHECK_INTERVAL_MINUTES` is set
    /// but is not a positive integer.
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let raw_interval = std::env::var("TALLYBOOK_CHECK_INTERVAL_MINUTES").ok();
        let check_interval_minutes = parse_interval(raw_interval.as_deref())?;

        Ok(Self {
            database_url,
            check_interval_minutes,
        })
    }
}

/// Parses the check interval from its raw environment value.
///
/// `None` (unset) falls back to the default; a set value must be a positive
/// integer number of minutes.
fn parse_interval(raw: Option<&str>) -> Result<u64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_CHECK_INTERVAL_MINUTES);
    };
    let minutes: u64 = raw.parse().map_err(|_| Error::Config {
        message: format!(
            "TALLYBOOK_CHECK_INTERVAL_MINUTES must be a positive integer, got {raw:?}"
        ),
    })?;
    if minutes == 0 {
        return Err(Error::Config {
            message: "TALLYBOOK_CHECK_INTERVAL_MINUTES must be at least 1".to_string(),
        });
    }
    Ok(minutes)
}
