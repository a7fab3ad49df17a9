//! # CLI Configuration
//!
//! Read from an optional YAML file, then overridden from the environment.
//! Every field has a default, so an absent file is not an error. A file that
//! exists but does not parse is.
//!
//! ```yaml
//! store_dir: .disputes
//! collection_key: commission-disputes
//! comment_preview_len: 50
//! sla:
//!   assignment_window_business_days: 5
//!   resolution_window_days: 15
//!   escalation_after_days: 10
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dispute_lifecycle::config::{DEFAULT_COLLECTION_KEY, DEFAULT_PREVIEW_LEN};
use dispute_lifecycle::{LedgerConfig, SlaPolicy};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "disputes.yaml";

/// Environment variable that replaces `store_dir`.
pub const STORE_DIR_ENV: &str = "DISPUTES_STORE_DIR";

/// Everything the CLI needs to open a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding one JSON file per collection.
    pub store_dir: PathBuf,
    /// Collection key of the dispute ledger.
    pub collection_key: String,
    /// Characters kept in audit previews.
    pub comment_preview_len: usize,
    /// SLA thresholds.
    pub sla: SlaPolicy,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".disputes"),
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
            comment_preview_len: DEFAULT_PREVIEW_LEN,
            sla: SlaPolicy::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// [`DEFAULT_CONFIG_FILE`] is read if present and defaults apply
    /// otherwise. [`STORE_DIR_ENV`] is applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a YAML config file. An empty file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Parse YAML config text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(STORE_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.store_dir = PathBuf::from(dir);
        }
    }

    /// The library-side ledger configuration.
    pub fn ledger(&self) -> LedgerConfig {
        LedgerConfig {
            collection_key: self.collection_key.clone(),
            comment_preview_len: self.comment_preview_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(CliConfig::from_yaml("").unwrap(), CliConfig::default());
        assert_eq!(CliConfig::from_yaml("   \n").unwrap(), CliConfig::default());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = CliConfig::from_yaml(
            "comment_preview_len: 80\nsla:\n  resolution_window_days: 30\n",
        )
        .unwrap();
        assert_eq!(config.comment_preview_len, 80);
        assert_eq!(config.sla.resolution_window_days, 30);
        assert_eq!(config.sla.assignment_window_business_days, 5);
        assert_eq!(config.collection_key, "commission-disputes");
        assert_eq!(config.store_dir, PathBuf::from(".disputes"));
    }

    #[test]
    fn malformed_yaml_is_error() {
        assert!(CliConfig::from_yaml("comment_preview_len: [oops").is_err());
        assert!(CliConfig::from_yaml("comment_preview_len: lots").is_err());
    }

    #[test]
    fn env_overrides_store_dir() {
        let mut config = CliConfig::default();
        config.apply_env(|name| (name == STORE_DIR_ENV).then(|| "/var/lib/disputes".to_string()));
        assert_eq!(config.store_dir, PathBuf::from("/var/lib/disputes"));
    }

    #[test]
    fn blank_env_is_ignored() {
        let mut config = CliConfig::default();
        config.apply_env(|_| Some(" ".to_string()));
        assert_eq!(config.store_dir, PathBuf::from(".disputes"));
    }

    #[test]
    fn ledger_carries_key_and_preview() {
        let config = CliConfig {
            collection_key: "q1-disputes".to_string(),
            comment_preview_len: 20,
            ..CliConfig::default()
        };
        let ledger = config.ledger();
        assert_eq!(ledger.collection_key, "q1-disputes");
        assert_eq!(ledger.comment_preview_len, 20);
    }
}
