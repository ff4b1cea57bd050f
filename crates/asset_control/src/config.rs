//! Guarded asset configuration
//!
//! Values are read from a TOML file and may be overridden through
//! environment variables:
//!
//! - `IPPAN_ASSET_LOCK_PERIOD_MS`
//! - `IPPAN_ASSET_MAX_TX_PER_WINDOW`

use crate::errors::{AccessControlError, Result};
use crate::governance::LOCK_PERIOD_MS;
use crate::rate_limit::MAX_TRANSACTIONS_PER_WINDOW;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const ENV_LOCK_PERIOD_MS: &str = "IPPAN_ASSET_LOCK_PERIOD_MS";
pub const ENV_MAX_TX_PER_WINDOW: &str = "IPPAN_ASSET_MAX_TX_PER_WINDOW";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetControlConfig {
    /// Delay between proposal creation and execution
    pub lock_period_ms: u64,
    /// Maximum mint transactions retained per window
    pub max_transactions_per_window: usize,
}

impl Default for AssetControlConfig {
    fn default() -> Self {
        Self {
            lock_period_ms: LOCK_PERIOD_MS,
            max_transactions_per_window: MAX_TRANSACTIONS_PER_WINDOW,
        }
    }
}

impl AssetControlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AccessControlError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AccessControlError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        // Overrides land on a copy; `self` only changes once every one parses
        let mut updated = self.clone();

        if let Some(value) = lookup(ENV_LOCK_PERIOD_MS) {
            updated.lock_period_ms = value.trim().parse().map_err(|e| {
                AccessControlError::Config(format!("Invalid {ENV_LOCK_PERIOD_MS}: {e}"))
            })?;
        }

        if let Some(value) = lookup(ENV_MAX_TX_PER_WINDOW) {
            updated.max_transactions_per_window = value.trim().parse().map_err(|e| {
                AccessControlError::Config(format!("Invalid {ENV_MAX_TX_PER_WINDOW}: {e}"))
            })?;
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_transactions_per_window == 0 {
            return Err(AccessControlError::Config(
                "max_transactions_per_window must be greater than zero".to_string(),
            ));
        }

        if self.lock_period_ms == 0 {
            warn!(target: "asset_control", "Lock period is zero; proposals execute immediately");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AssetControlConfig::default();
        assert_eq!(config.lock_period_ms, 604_800_000);
        assert_eq!(config.max_transactions_per_window, 7500);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AssetControlConfig::from_toml_str("lock_period_ms = 60000\n").unwrap();
        assert_eq!(config.lock_period_ms, 60_000);
        assert_eq!(config.max_transactions_per_window, MAX_TRANSACTIONS_PER_WINDOW);
    }

    #[test]
    fn test_zero_transaction_cap_rejected() {
        assert!(matches!(
            AssetControlConfig::from_toml_str("max_transactions_per_window = 0\n"),
            Err(AccessControlError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "lock_period_ms = 10").unwrap();
        writeln!(file, "max_transactions_per_window = 3").unwrap();

        let config = AssetControlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.lock_period_ms, 10);
        assert_eq!(config.max_transactions_per_window, 3);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AssetControlConfig::from_file(dir.path().join("missing.toml")),
            Err(AccessControlError::Config(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_LOCK_PERIOD_MS, "1000"),
            (ENV_MAX_TX_PER_WINDOW, " 25 "),
        ]
        .into_iter()
        .collect();

        let mut config = AssetControlConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.lock_period_ms, 1_000);
        assert_eq!(config.max_transactions_per_window, 25);

        let mut config = AssetControlConfig::default();
        let bad = config.apply_overrides(|key| {
            (key == ENV_LOCK_PERIOD_MS).then(|| "soon".to_string())
        });
        assert!(matches!(bad, Err(AccessControlError::Config(_))));
    }

    #[test]
    fn test_failed_override_leaves_config_untouched() {
        let vars: HashMap<&str, &str> = [
            (ENV_LOCK_PERIOD_MS, "5"),
            (ENV_MAX_TX_PER_WINDOW, "bad"),
        ]
        .into_iter()
        .collect();

        let mut config = AssetControlConfig::default();
        let result = config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert!(matches!(result, Err(AccessControlError::Config(_))));
        assert_eq!(config, AssetControlConfig::default());

        let mut config = AssetControlConfig::default();
        let result = config.apply_overrides(|key| {
            (key == ENV_MAX_TX_PER_WINDOW).then(|| "0".to_string())
        });
        assert!(matches!(result, Err(AccessControlError::Config(_))));
        assert_eq!(config, AssetControlConfig::default());
    }
}
