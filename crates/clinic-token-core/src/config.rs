use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors raised while assembling a [`Config`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("could not read {path}: {source}")]
    Read {
        /// Path of the configuration file
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML or has invalid values
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// An environment variable or option carries an invalid value
    #[error("{key} takes {expected}, got {value:?}")]
    Value {
        /// Name of the setting
        key: String,
        /// Description of the accepted values
        expected: &'static str,
        /// The rejected value
        value: String,
    },
}

/// Configuration of the clinic token desk
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct Config {
    /// Number of tokens that can be handed out per day
    pub max_tokens_per_day: u32,
    /// Same-day bookings are accepted strictly before this time of day
    #[serde(deserialize_with = "deserialize_time")]
    pub session_start: NaiveTime,
    /// End of the consultation session
    ///
    /// Loaded for completeness; no booking rule consults it.
    #[serde(deserialize_with = "deserialize_time")]
    pub session_end: NaiveTime,

    /// Name of the administrator account
    pub admin_username: String,
    /// Argon2 PHC string of the administrator password
    ///
    /// Without a hash, administrator logins always fail.
    pub admin_password_hash: Option<String>,
    /// Lifetime of an administrator session in seconds
    pub admin_session_ttl: u32,

    /// Require an administrator session for closing today's bookings
    pub close_requires_admin: bool,
    /// Reset today's booked count to zero when closing today's bookings
    pub close_resets_count: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tokens_per_day: 30,
            session_start: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            session_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            admin_username: String::from("admin"),
            admin_password_hash: None,
            admin_session_ttl: 3600,
            close_requires_admin: false,
            close_resets_count: true,
        }
    }
}

impl Config {
    /// Parse a configuration from a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse the TOML configuration file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Apply overrides from `CLINIC_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `var`
    ///
    /// Recognized keys are the field names in upper case, prefixed with
    /// `CLINIC_`.
    pub fn apply_vars(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = var("CLINIC_MAX_TOKENS_PER_DAY") {
            self.max_tokens_per_day =
                parse_value("CLINIC_MAX_TOKENS_PER_DAY", &v, "a decimal u32")?;
        }
        if let Some(v) = var("CLINIC_SESSION_START") {
            self.session_start = parse_time("CLINIC_SESSION_START", &v)?;
        }
        if let Some(v) = var("CLINIC_SESSION_END") {
            self.session_end = parse_time("CLINIC_SESSION_END", &v)?;
        }
        if let Some(v) = var("CLINIC_ADMIN_USERNAME") {
            self.admin_username = v;
        }
        if let Some(v) = var("CLINIC_ADMIN_PASSWORD_HASH") {
            self.admin_password_hash = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = var("CLINIC_ADMIN_SESSION_TTL") {
            self.admin_session_ttl =
                parse_value("CLINIC_ADMIN_SESSION_TTL", &v, "a decimal u32")?;
        }
        if let Some(v) = var("CLINIC_CLOSE_REQUIRES_ADMIN") {
            self.close_requires_admin = parse_flag("CLINIC_CLOSE_REQUIRES_ADMIN", &v)?;
        }
        if let Some(v) = var("CLINIC_CLOSE_RESETS_COUNT") {
            self.close_resets_count = parse_flag("CLINIC_CLOSE_RESETS_COUNT", &v)?;
        }
        Ok(())
    }
}

/// Parse a time of day written as `HH:MM` or `HH:MM:SS`
pub fn parse_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ConfigError::Value {
            key: key.into(),
            expected: "a time of day (HH:MM)",
            value: value.into(),
        })
}

fn parse_value<T: std::str::FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Value {
        key: key.into(),
        expected,
        value: value.into(),
    })
}

fn parse_flag(key: &str, v: &str) -> Result<bool, ConfigError> {
    if v == "1" || ["true", "yes", "on", "y", "t"].iter().any(|t| v.eq_ignore_ascii_case(t)) {
        Ok(true)
    } else if v == "0" || ["false", "no", "off", "n", "f"].iter().any(|f| v.eq_ignore_ascii_case(f)) {
        Ok(false)
    } else {
        Err(ConfigError::Value {
            key: key.into(),
            expected: "a boolean",
            value: v.into(),
        })
    }
}

fn deserialize_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_time("time", &s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = Config::from_toml(
            r#"
            max_tokens_per_day = 12
            session_start = "16:30"
            admin_username = "desk"
            close_requires_admin = true
            "#,
        )
        .unwrap();
        assert_eq!(config.max_tokens_per_day, 12);
        assert_eq!(config.session_start, NaiveTime::from_hms_opt(16, 30, 0).unwrap());
        assert_eq!(config.session_end, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
        assert_eq!(config.admin_username, "desk");
        assert!(config.close_requires_admin);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml("max_tokens = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn environment_overrides() {
        let vars = HashMap::from([
            ("CLINIC_MAX_TOKENS_PER_DAY", "5"),
            ("CLINIC_SESSION_START", "09:15:30"),
            ("CLINIC_CLOSE_RESETS_COUNT", "off"),
            ("CLINIC_ADMIN_PASSWORD_HASH", ""),
        ]);
        let mut config = Config {
            admin_password_hash: Some("x".into()),
            ..Config::default()
        };
        config
            .apply_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.max_tokens_per_day, 5);
        assert_eq!(config.session_start, NaiveTime::from_hms_opt(9, 15, 30).unwrap());
        assert!(!config.close_resets_count);
        assert_eq!(config.admin_password_hash, None);
    }

    #[test]
    fn invalid_environment_value() {
        let err = Config::default()
            .apply_vars(|k| (k == "CLINIC_ADMIN_SESSION_TTL").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Value { ref key, .. } if key == "CLINIC_ADMIN_SESSION_TTL"));
    }
}
