//! Configuration for the clause compiler.
//!
//! Config file resolution order for [`Config::load`]:
//! 1. MAILQ_CONFIG environment variable
//! 2. Built-in defaults

use std::path::Path;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable naming the config file used by [`Config::load`].
pub const MAILQ_CONFIG_VAR: &str = "MAILQ_CONFIG";

/// Clause compiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Locale retried once when an absolute date fails under the caller's locale.
    #[serde(default = "default_fallback_locale")]
    pub fallback_locale: String,

    /// First day of the week for week-granularity dates.
    #[serde(default = "default_week_start", with = "weekday_name")]
    pub week_start: Weekday,

    /// Full-text field holding contact data.
    #[serde(default = "default_contact_field")]
    pub contact_field: String,

    /// Timezone offset used when an account has none.
    #[serde(default)]
    pub default_tz_offset_minutes: i32,
}

fn default_fallback_locale() -> String {
    "en".to_string()
}

fn default_week_start() -> Weekday {
    Weekday::Sun
}

fn default_contact_field() -> String {
    "contact_data".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_locale: default_fallback_locale(),
            week_start: default_week_start(),
            contact_field: default_contact_field(),
            default_tz_offset_minutes: 0,
        }
    }
}

impl Config {
    /// Load config from MAILQ_CONFIG, or use defaults.
    pub fn load() -> Result<Self> {
        match std::env::var(MAILQ_CONFIG_VAR) {
            Ok(path) => Self::load_from(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or use defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::parse(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

/// Weekdays are stored by name ("sunday", "mon", ...).
mod weekday_name {
    use chrono::Weekday;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Weekday, s: S) -> Result<S::Ok, S::Error> {
        let name = match day {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
            Weekday::Sun => "sunday",
        };
        s.serialize_str(name)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Weekday, D::Error> {
        let name = String::deserialize(d)?;
        name.parse::<Weekday>()
            .map_err(|_| D::Error::custom(format!("unknown weekday: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.fallback_locale, "en");
        assert_eq!(config.week_start, Weekday::Sun);
        assert_eq!(config.contact_field, "contact_data");
        assert_eq!(config.default_tz_offset_minutes, 0);
    }

    #[test]
    fn test_config_parse_partial() {
        let config = Config::parse("week_start = \"monday\"\ndefault_tz_offset_minutes = 60\n").unwrap();
        assert_eq!(config.week_start, Weekday::Mon);
        assert_eq!(config.default_tz_offset_minutes, 60);
        assert_eq!(config.fallback_locale, "en");
    }

    #[test]
    fn test_config_parse_invalid() {
        let err = Config::parse("week_start = \"someday\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mailq.toml");

        let config = Config {
            fallback_locale: "de".to_string(),
            week_start: Weekday::Mon,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_to_toml_names_weekday() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("week_start = \"sunday\""), "{}", toml);
    }
}
