//! Import configuration
//!
//! Read from a JSON file:
//!
//! ```json
//! {
//!   "banks": ["dkb", "postbank"],
//!   "knownSecurities": [{ "isin": "DE0008404005", "name": "Allianz SE" }],
//!   "stopOnError": true
//! }
//! ```

use crate::pdf_import::{get_parsers, BankExtractor, ExtractionError, Security};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown bank '{0}'")]
    UnknownBank(String),

    #[error(transparent)]
    RuleSet(#[from] ExtractionError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConfig {
    /// Rule set ids to enable; all of them when absent.
    pub banks: Option<Vec<String>>,
    pub known_securities: Vec<Security>,
    /// Exit with a failure code when any block could not be extracted.
    pub stop_on_error: bool,
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "Config: loaded {} ({} known securities)",
            path.display(),
            config.known_securities.len()
        );
        Ok(config)
    }

    /// Enabled rule sets, in registry order, aware of the known securities.
    pub fn extractors(&self) -> Result<Vec<BankExtractor>, ConfigError> {
        let all = get_parsers()?;

        if let Some(banks) = &self.banks {
            if let Some(unknown) = banks.iter().find(|b| !all.iter().any(|e| e.id() == b.as_str())) {
                return Err(ConfigError::UnknownBank(unknown.clone()));
            }
        }

        Ok(all
            .into_iter()
            .filter(|e| {
                self.banks
                    .as_ref()
                    .map_or(true, |banks| banks.iter().any(|b| b == e.id()))
            })
            .map(|e| e.with_known_securities(self.known_securities.clone()))
            .collect())
    }
}
