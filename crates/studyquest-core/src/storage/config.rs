//! TOML-based application configuration.
//!
//! Stores the interval timer defaults and the streak continuity policy
//! at `~/.config/studyquest/config.toml`. Every field carries a serde
//! default, so a malformed or missing section falls back to documented
//! defaults instead of failing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::streak::StreakPolicy;
use crate::timer::IntervalConfig;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Owner of the local profile and sessions.
    #[serde(default = "default_user_ref")]
    pub user_ref: String,
    #[serde(default)]
    pub pomodoro: IntervalConfig,
    #[serde(default)]
    pub streak: StreakPolicy,
}

fn default_user_ref() -> String {
    "local".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_ref: default_user_ref(),
            pomodoro: IntervalConfig::default(),
            streak: StreakPolicy::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?
            .join("config.toml"))
    }

    /// Load from disk, writing the default config on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::warn!("using default configuration: {e}");
            Self::default()
        })
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = get_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        set_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

fn get_by_path<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    if key.is_empty() {
        return None;
    }
    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn set_by_path(
    root: &mut serde_json::Value,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let unknown = || ConfigError::UnknownKey(key.to_string());
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    let (parent_path, leaf) = match key.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(unknown());
    }

    let mut current = root;
    if let Some(parent_path) = parent_path {
        for part in parent_path.split('.') {
            current = current.get_mut(part).ok_or_else(unknown)?;
        }
    }
    let obj = current.as_object_mut().ok_or_else(unknown)?;
    let existing = obj.get(leaf).ok_or_else(unknown)?;

    let new_value = match existing {
        serde_json::Value::Bool(_) => serde_json::Value::Bool(
            value
                .parse::<bool>()
                .map_err(|e| invalid(e.to_string()))?,
        ),
        serde_json::Value::Number(_) => {
            if let Ok(n) = value.parse::<u64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(n) = value.parse::<f64>() {
                serde_json::Number::from_f64(n)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
            } else {
                return Err(invalid(format!("cannot parse '{value}' as number")));
            }
        }
        _ => serde_json::Value::String(value.into()),
    };
    obj.insert(leaf.to_string(), new_value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streak::StreakMode;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.user_ref, "local");
        assert_eq!(parsed.pomodoro.focus_minutes, 25);
        assert_eq!(parsed.streak.min_minutes, 25);
        assert_eq!(parsed.streak.mode, StreakMode::Any);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("user_ref = \"tester\"").unwrap();
        assert_eq!(cfg.user_ref, "tester");
        assert_eq!(cfg.pomodoro.cycles_before_long_break, 4);
        assert_eq!(cfg.streak.min_tasks, 1);
    }

    #[test]
    fn partial_section_keeps_field_defaults() {
        let cfg: Config = toml::from_str("[pomodoro]\nfocus_minutes = 50\n").unwrap();
        assert_eq!(cfg.pomodoro.focus_minutes, 50);
        assert_eq!(cfg.pomodoro.short_break_minutes, 5);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("pomodoro.focus_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("streak.mode").as_deref(), Some("any"));
        assert!(cfg.get("pomodoro.missing_key").is_none());
    }

    #[test]
    fn set_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        set_by_path(&mut json, "streak.min_minutes", "45").unwrap();
        assert_eq!(
            get_by_path(&json, "streak.min_minutes").unwrap(),
            &serde_json::Value::Number(45.into())
        );
    }

    #[test]
    fn set_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(set_by_path(&mut json, "streak.nonexistent", "1").is_err());
        assert!(set_by_path(&mut json, "", "1").is_err());
    }

    #[test]
    fn set_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = set_by_path(&mut json, "pomodoro.auto_start_break", "not_a_bool");
        assert!(result.is_err());
    }
}
