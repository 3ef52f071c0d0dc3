use crate::clock::ModeDurations;
use crate::error::DeckError;
use crate::storage::Storage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub durations: ModeDurations,
}

impl Config {
    pub fn validate(&self) -> Result<(), DeckError> {
        if !self.durations.is_valid() {
            return Err(DeckError::InvalidDuration);
        }
        Ok(())
    }
}

pub fn load_config() -> Result<Config> {
    let path = Storage::get_base_dir()?.join("config.json");
    load_config_from(&path)
}

/// Reads the config at `path`, writing the defaults there first if missing.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(path, data)?;
        return Ok(config);
    }

    let data = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&data)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MAX_MODE_MINS;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_writes_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");

        let config = load_config_from(&path)?;

        assert_eq!(config, Config::default());
        assert!(path.exists());
        let written = fs::read_to_string(&path)?;
        assert!(written.contains("\"focus_mins\": 25"));
        Ok(())
    }

    #[test]
    fn test_load_config_partial_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"focus_mins": 50}"#)?;

        let config = load_config_from(&path)?;

        assert_eq!(config.durations.focus_mins, 50);
        assert_eq!(config.durations.short_break_mins, 5);
        assert_eq!(config.durations.long_break_mins, 15);
        Ok(())
    }

    #[test]
    fn test_load_config_rejects_zero_duration() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"short_break_mins": 0}"#)?;

        let err = load_config_from(&path).unwrap_err();
        assert_eq!(err.downcast_ref::<DeckError>(), Some(&DeckError::InvalidDuration));
        Ok(())
    }

    #[test]
    fn test_load_config_rejects_oversized_duration() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"focus_mins": 80000000}"#)?;

        let err = load_config_from(&path).unwrap_err();
        assert_eq!(err.downcast_ref::<DeckError>(), Some(&DeckError::InvalidDuration));
        Ok(())
    }

    #[test]
    fn test_validate_accepts_one_day() {
        let mut config = Config::default();
        config.durations.long_break_mins = MAX_MODE_MINS;
        assert_eq!(config.validate(), Ok(()));

        config.durations.long_break_mins = MAX_MODE_MINS + 1;
        assert_eq!(config.validate(), Err(DeckError::InvalidDuration));
    }
}
