//! Nexus configuration

use serde::{Deserialize, Serialize};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Configuration for the transaction nexus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Maximum undo depth; the oldest entry is dropped beyond it.
    /// `0` keeps every entry.
    pub max_history: usize,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl NexusConfig {
    /// A configuration that never drops history
    pub fn unbounded() -> Self {
        Self { max_history: 0 }
    }

    /// The bound as an option (`None` = unbounded)
    pub fn history_bound(&self) -> Option<usize> {
        (self.max_history > 0).then_some(self.max_history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: NexusConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NexusConfig::default());
        assert_eq!(config.history_bound(), Some(DEFAULT_MAX_HISTORY));
    }

    #[test]
    fn test_unbounded() {
        let config: NexusConfig = serde_json::from_str(r#"{"max_history":0}"#).unwrap();
        assert_eq!(config.history_bound(), None);
        assert_eq!(config, NexusConfig::unbounded());
    }
}
