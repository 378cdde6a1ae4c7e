use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use twentyone_engine::rules::{MAX_PLAYERS, MIN_PLAYERS};

use crate::events::DEFAULT_EVENT_BUFFER;

pub const CONFIG_ENV: &str = "TWENTYONE_CONFIG";
pub const MAX_PLAYERS_ENV: &str = "TWENTYONE_MAX_PLAYERS";
pub const SEED_ENV: &str = "TWENTYONE_SEED";
pub const EVENT_BUFFER_ENV: &str = "TWENTYONE_EVENT_BUFFER";

/// Settings for the session manager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    /// Seat cap for new sessions (2-7)
    pub max_players: usize,
    /// Base seed; session N is seeded with `seed + N`. Random when unset.
    pub seed: Option<u64>,
    /// Per-subscriber event channel capacity
    pub event_buffer: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            seed: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(default)]
    max_players: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    event_buffer: Option<usize>,
}

impl ServerSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(SettingsError::InvalidValue(format!(
                "max_players must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
            )));
        }
        if self.event_buffer == 0 {
            return Err(SettingsError::InvalidValue(
                "event_buffer must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Defaults, then the TOML file named by `TWENTYONE_CONFIG`, then
    /// individual variables. Empty variables are ignored.
    pub fn load_from<F>(env: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(path) = var(CONFIG_ENV) {
            let file = read_file(Path::new(&path))?;
            if let Some(v) = file.max_players {
                settings.max_players = v;
            }
            if let Some(v) = file.seed {
                settings.seed = Some(v);
            }
            if let Some(v) = file.event_buffer {
                settings.event_buffer = v;
            }
        }

        if let Some(v) = var(MAX_PLAYERS_ENV) {
            settings.max_players = parse(MAX_PLAYERS_ENV, &v)?;
        }
        if let Some(v) = var(SEED_ENV) {
            settings.seed = Some(parse(SEED_ENV, &v)?);
        }
        if let Some(v) = var(EVENT_BUFFER_ENV) {
            settings.event_buffer = parse(EVENT_BUFFER_ENV, &v)?;
        }

        settings.validate()?;
        tracing::debug!(?settings, "server settings loaded");
        Ok(settings)
    }

    /// Seed for the session created `ordinal`-th, if a base seed is configured.
    pub fn session_seed(&self, ordinal: u64) -> Option<u64> {
        self.seed.map(|base| base.wrapping_add(ordinal))
    }
}

fn read_file(path: &Path) -> Result<FileSettings, SettingsError> {
    let text = fs::read_to_string(path).map_err(|e| SettingsError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    toml::from_str(&text).map_err(|e| SettingsError::Parse(e.to_string()))
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidValue(format!("{key}: cannot parse '{value}'")))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
    #[error("Cannot read settings file {path}: {message}")]
    Io { path: String, message: String },
    #[error("Invalid settings file: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = ServerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_players, 7);
        assert_eq!(settings.event_buffer, 1000);
    }

    #[test]
    fn validates_player_cap_range() {
        for (cap, ok) in [(1, false), (2, true), (7, true), (8, false)] {
            let settings = ServerSettings {
                max_players: cap,
                ..Default::default()
            };
            assert_eq!(settings.validate().is_ok(), ok, "cap {cap}");
        }
    }

    #[test]
    fn validates_event_buffer_positive() {
        let settings = ServerSettings {
            event_buffer: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn env_overrides_defaults() {
        let settings = ServerSettings::load_from(env(&[
            (MAX_PLAYERS_ENV, "4"),
            (SEED_ENV, "99"),
            (EVENT_BUFFER_ENV, ""),
        ]))
        .expect("load");
        assert_eq!(settings.max_players, 4);
        assert_eq!(settings.seed, Some(99));
        assert_eq!(settings.event_buffer, DEFAULT_EVENT_BUFFER);
    }

    #[test]
    fn unparsable_env_is_rejected() {
        let err = ServerSettings::load_from(env(&[(SEED_ENV, "abc")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(msg) if msg.contains(SEED_ENV)));
    }

    #[test]
    fn out_of_range_env_is_rejected() {
        assert!(ServerSettings::load_from(env(&[(MAX_PLAYERS_ENV, "9")])).is_err());
    }

    #[test]
    fn session_seed_offsets_by_ordinal() {
        let seeded = ServerSettings {
            seed: Some(10),
            ..Default::default()
        };
        assert_eq!(seeded.session_seed(0), Some(10));
        assert_eq!(seeded.session_seed(5), Some(15));
        assert_eq!(ServerSettings::default().session_seed(5), None);
    }
}
