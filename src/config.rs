// Calculator configuration
// Loaded from environment variables, optionally seeded from a .env file

use std::path::PathBuf;
use validator::Validate;

use crate::error::{CalcResult, CalculatorError};
use crate::ledger::IdStrategy;
use crate::persistence::{JsonFileStore, KeyValueStore, MemoryStore, StateKeys, DEFAULT_KEY_PREFIX};
use crate::validation::validate_storage_prefix;

pub const ENV_STORAGE_PREFIX: &str = "CALCULATOR_STORAGE_PREFIX";
pub const ENV_STATE_PATH: &str = "CALCULATOR_STATE_PATH";
pub const ENV_ID_STRATEGY: &str = "CALCULATOR_ID_STRATEGY";

/// Settings for a calculator session
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct CalculatorConfig {
    /// Namespace prepended to every persisted key
    #[validate(custom = "validate_storage_prefix")]
    pub storage_prefix: String,

    /// JSON file holding persisted state; in-memory storage when unset
    pub state_path: Option<PathBuf>,

    pub id_strategy: IdStrategy,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            storage_prefix: DEFAULT_KEY_PREFIX.to_string(),
            state_path: None,
            id_strategy: IdStrategy::default(),
        }
    }
}

impl CalculatorConfig {
    /// Load configuration from the process environment
    ///
    /// Reads a `.env` file first when one is present.
    pub fn from_env() -> CalcResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> CalcResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let storage_prefix = lookup(ENV_STORAGE_PREFIX).unwrap_or(defaults.storage_prefix);
        let state_path = lookup(ENV_STATE_PATH)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let id_strategy = match lookup(ENV_ID_STRATEGY) {
            Some(raw) => raw
                .parse::<IdStrategy>()
                .map_err(CalculatorError::InvalidConfiguration)?,
            None => defaults.id_strategy,
        };

        let config = Self {
            storage_prefix,
            state_path,
            id_strategy,
        };
        config.validate()?;

        tracing::debug!(
            "Calculator config: prefix={}, state_path={:?}, ids={}",
            config.storage_prefix,
            config.state_path,
            config.id_strategy
        );
        Ok(config)
    }

    pub fn state_keys(&self) -> StateKeys {
        StateKeys::new(self.storage_prefix.clone())
    }

    /// Open the configured storage backend
    pub fn open_store(&self) -> CalcResult<Box<dyn KeyValueStore>> {
        match &self.state_path {
            Some(path) => Ok(Box::new(JsonFileStore::open(path)?)),
            None => Ok(Box::new(MemoryStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = CalculatorConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CalculatorConfig::default());
        assert_eq!(config.storage_prefix, "calculator_");
        assert_eq!(config.id_strategy, IdStrategy::Sequential);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = CalculatorConfig::from_lookup(lookup_from(&[
            (ENV_STORAGE_PREFIX, "fba_"),
            (ENV_STATE_PATH, "/tmp/calculator.json"),
            (ENV_ID_STRATEGY, "timestamp"),
        ]))
        .unwrap();

        assert_eq!(config.storage_prefix, "fba_");
        assert_eq!(config.state_path, Some(PathBuf::from("/tmp/calculator.json")));
        assert_eq!(config.id_strategy, IdStrategy::Timestamp);
        assert_eq!(config.state_keys().key("cost"), "fba_cost");
    }

    #[test]
    fn test_blank_state_path_means_memory() {
        let config =
            CalculatorConfig::from_lookup(lookup_from(&[(ENV_STATE_PATH, "  ")])).unwrap();
        assert!(config.state_path.is_none());
    }

    #[test]
    fn test_rejects_bad_id_strategy() {
        let err = CalculatorConfig::from_lookup(lookup_from(&[(ENV_ID_STRATEGY, "random")]))
            .unwrap_err();
        assert!(matches!(err, CalculatorError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_rejects_empty_prefix() {
        let err = CalculatorConfig::from_lookup(lookup_from(&[(ENV_STORAGE_PREFIX, "")]))
            .unwrap_err();
        assert!(matches!(err, CalculatorError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_open_store_uses_file_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let config = CalculatorConfig {
            state_path: Some(dir.path().join("state.json")),
            ..CalculatorConfig::default()
        };

        let mut store = config.open_store().unwrap();
        store.set("calculator_cost", "5").unwrap();
        assert!(dir.path().join("state.json").exists());
    }
}
