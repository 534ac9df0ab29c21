//! `sillage set` / `sillage unset`.

use std::error::Error;
use std::fmt;

use crate::core::config::{Config, ConfigKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    UnknownKey(String),
    InvalidValue(String),
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(message) | SettingError::InvalidValue(message) => {
                write!(f, "{message}")
            }
        }
    }
}

impl Error for SettingError {}

pub fn run_set(config: &mut Config, key: &str, value: &[String]) -> Result<String, SettingError> {
    let key: ConfigKey = key.parse().map_err(SettingError::UnknownKey)?;
    // Values may arrive split on whitespace.
    let value = value.join(" ");
    config
        .set(key, &value)
        .map_err(SettingError::InvalidValue)?;
    Ok(format!("Set {} to: {}", key.as_str(), value.trim()))
}

pub fn run_unset(config: &mut Config, key: &str) -> Result<String, SettingError> {
    let key: ConfigKey = key.parse().map_err(SettingError::UnknownKey)?;
    config.unset(key);
    Ok(format!("Unset {}", key.as_str()))
}
