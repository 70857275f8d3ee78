use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::quiz::{ThresholdError, Thresholds};

pub const BANK_PATH_VAR: &str = "QUIZ_BANK_PATH";
pub const THRESHOLDS_VAR: &str = "QUIZ_THRESHOLDS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {source}")]
    Thresholds {
        var: &'static str,
        #[source]
        source: ThresholdError,
    },
    #[error("{0} is not valid unicode")]
    NotUnicode(&'static str),
}

/// Runtime settings. The bot token is not part of it: teloxide reads
/// `TELOXIDE_TOKEN` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Replaces the compiled-in question bank when set.
    pub bank_path: Option<PathBuf>,
    /// Feedback thresholds for subjects that do not define their own.
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bank_path: None,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_err() {
            log::debug!("No .env file found, using the process environment only");
        }
        Self::from_lookup(|var| env::var(var))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, env::VarError>,
    {
        let bank_path = optional(&lookup, BANK_PATH_VAR)?.map(PathBuf::from);
        let thresholds = match optional(&lookup, THRESHOLDS_VAR)? {
            Some(raw) => raw.parse().map_err(|source| ConfigError::Thresholds {
                var: THRESHOLDS_VAR,
                source,
            })?,
            None => Thresholds::default(),
        };

        Ok(Self {
            bank_path,
            thresholds,
        })
    }
}

fn optional<F>(lookup: &F, var: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&'static str) -> Result<String, env::VarError>,
{
    match lookup(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(var)),
    }
}
