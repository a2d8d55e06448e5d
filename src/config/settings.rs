//! User settings for the ledger
//!
//! Manages the default currency, which pipeline layers wrap each command,
//! where the command journal is written and whether lookups are cached.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;
use crate::models::DEFAULT_CURRENCY;
use crate::pipeline::Decorations;
use crate::storage::DEFAULT_CACHE_TTL;

/// User settings for the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency for new accounts when none is given
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Pipeline layers applied to every command
    /// (performance, logging, validation, transaction, all, none)
    #[serde(default = "default_decorations")]
    pub decorations: Vec<String>,

    /// Whether commands are written to the journal file
    #[serde(default = "default_true")]
    pub journal_enabled: bool,

    /// Journal destination, relative to the base directory unless absolute
    #[serde(default = "default_journal_file")]
    pub journal_file: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Recalculate an account's balance after an operation is edited or deleted
    #[serde(default = "default_true")]
    pub auto_fix_after_edit: bool,

    /// Answer lookups by id from a read cache
    #[serde(default)]
    pub use_caching: bool,

    /// How long a cached entity stays valid, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Whether initial setup has been completed
    #[serde(default)]
    pub setup_completed: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_decorations() -> Vec<String> {
    vec!["performance".to_string(), "logging".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_journal_file() -> String {
    "command.log".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: default_currency(),
            decorations: default_decorations(),
            journal_enabled: true,
            journal_file: default_journal_file(),
            date_format: default_date_format(),
            auto_fix_after_edit: true,
            use_caching: false,
            cache_ttl_secs: default_cache_ttl_secs(),
            setup_completed: false,
        }
    }
}

impl Settings {
    /// Parse the configured pipeline layers
    pub fn decorations(&self) -> Result<Decorations, LedgerError> {
        Decorations::from_names(self.decorations.iter().map(String::as_str))
    }

    /// Cache lifetime, or `None` when caching is switched off
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.use_caching
            .then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    /// Load settings from disk, or create default settings if the file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_currency, "RUB");
        assert!(settings.journal_enabled);
        assert_eq!(
            settings.decorations().unwrap(),
            Decorations::PERFORMANCE | Decorations::LOGGING
        );
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.default_currency = "USD".into();
        settings.decorations = vec!["all".into()];
        settings.setup_completed = true;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.default_currency, "USD");
        assert_eq!(loaded.decorations().unwrap(), Decorations::ALL);
        assert!(loaded.setup_completed);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        std::fs::write(paths.settings_file(), r#"{"default_currency": "EUR"}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.default_currency, "EUR");
        assert_eq!(loaded.journal_file, "command.log");
        assert!(loaded.auto_fix_after_edit);
        assert!(loaded.cache_ttl().is_none());
    }

    #[test]
    fn test_cache_ttl_when_enabled() {
        let settings: Settings =
            serde_json::from_str(r#"{"use_caching": true, "cache_ttl_secs": 5}"#).unwrap();
        assert_eq!(settings.cache_ttl(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_unknown_decoration_is_config_error() {
        let mut settings = Settings::default();
        settings.decorations = vec!["caching".into()];
        assert!(matches!(
            settings.decorations().unwrap_err(),
            LedgerError::Config(_)
        ));
    }
}
