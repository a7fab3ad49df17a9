//! Ledger configuration shared by every [`DisputeManager`](crate::DisputeManager).

use serde::{Deserialize, Serialize};

/// Default collection key under which disputes are stored.
pub const DEFAULT_COLLECTION_KEY: &str = "commission-disputes";

/// Default number of characters kept in audit previews.
pub const DEFAULT_PREVIEW_LEN: usize = 50;

/// Where disputes live and how much free text the audit trail keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Record store key holding the dispute collection.
    pub collection_key: String,
    /// Characters of comment and evidence text copied into audit entries.
    pub comment_preview_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
            comment_preview_len: DEFAULT_PREVIEW_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: LedgerConfig = serde_json::from_str(r#"{"comment_preview_len": 80}"#).unwrap();
        assert_eq!(config.collection_key, DEFAULT_COLLECTION_KEY);
        assert_eq!(config.comment_preview_len, 80);
    }
}
