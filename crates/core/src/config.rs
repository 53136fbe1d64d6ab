use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Runtime knobs for the page script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Key that, together with Ctrl or Meta, requests input focus.
    #[serde(default = "default_shortcut_key")]
    pub shortcut_key: String,
    /// Delay between a detected navigation and the follow-up rescan.
    #[serde(default = "default_rescan_delay_ms")]
    pub rescan_delay_ms: u64,
    /// Delay between start and the one-off diagnostic scan.
    #[serde(default = "default_startup_scan_delay_ms")]
    pub startup_scan_delay_ms: u64,
    /// Cancel a still-pending rescan when a newer navigation arrives.
    #[serde(default = "default_coalesce_rescans")]
    pub coalesce_rescans: bool,
}

fn default_shortcut_key() -> String {
    "v".to_string()
}

fn default_rescan_delay_ms() -> u64 {
    1000
}

fn default_startup_scan_delay_ms() -> u64 {
    2000
}

fn default_coalesce_rescans() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shortcut_key: default_shortcut_key(),
            rescan_delay_ms: default_rescan_delay_ms(),
            startup_scan_delay_ms: default_startup_scan_delay_ms(),
            coalesce_rescans: default_coalesce_rescans(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.shortcut_key.is_empty() {
            return Err(Error::Config("shortcutKey must not be empty".to_string()));
        }
        if self.rescan_delay_ms == 0 {
            return Err(Error::Config("rescanDelayMs must be greater than zero".to_string()));
        }
        if self.startup_scan_delay_ms == 0 {
            return Err(Error::Config(
                "startupScanDelayMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rescan_delay(&self) -> Duration {
        Duration::from_millis(self.rescan_delay_ms)
    }

    pub fn startup_scan_delay(&self) -> Duration {
        Duration::from_millis(self.startup_scan_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.shortcut_key, "v");
        assert_eq!(cfg.rescan_delay(), Duration::from_millis(1000));
        assert_eq!(cfg.startup_scan_delay(), Duration::from_millis(2000));
        assert!(cfg.coalesce_rescans);
    }

    #[test]
    fn test_camel_case_fields() {
        let raw = r#"{ "shortcutKey": "b", "rescanDelayMs": 250, "coalesceRescans": false }"#;
        let cfg = Config::from_json(raw).unwrap();
        assert_eq!(cfg.shortcut_key, "b");
        assert_eq!(cfg.rescan_delay_ms, 250);
        assert_eq!(cfg.startup_scan_delay_ms, 2000);
        assert!(!cfg.coalesce_rescans);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            Config::from_json(r#"{ "shortcutKey": "" }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "rescanDelayMs": 0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(Config::from_json("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pastefocus.json");
        let cfg = Config {
            rescan_delay_ms: 400,
            ..Config::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), cfg);
        assert_eq!(Config::load_or_default(Some(&path)).unwrap(), cfg);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(Config::load_or_default(Some(&path)).unwrap(), Config::default());
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
