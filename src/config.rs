use crate::app_dirs::AppDirs;
use crate::feedback::DEFAULT_CLEAR_AFTER_SECS;
use crate::playback::Voice;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Speech synthesis rate multiplier.
    pub speech_rate: f32,
    pub language: String,
    pub feedback_clear_secs: i64,
    /// Session log database; the platform state dir when unset.
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speech_rate: 1.0,
            language: "en-US".to_string(),
            feedback_clear_secs: DEFAULT_CLEAR_AFTER_SECS,
            store_path: None,
        }
    }
}

impl Config {
    /// Negative delays clamp to zero, oversized ones to `TimeDelta::MAX`.
    pub fn feedback_clear_after(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.feedback_clear_secs.max(0)).unwrap_or(TimeDelta::MAX)
    }

    pub fn voice(&self) -> Voice {
        Voice {
            rate: self.speech_rate,
            language: self.language.clone(),
        }
    }

    pub fn resolved_store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(AppDirs::store_path)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable config falls back to defaults.
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed config");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            speech_rate: 1.5,
            language: "en-GB".into(),
            feedback_clear_secs: 8,
            store_path: Some(dir.path().join("sessions.db")),
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_or_corrupt_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());

        fs::write(&path, b"{ nope").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"speech_rate": 0.75}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.speech_rate, 0.75);
        assert_eq!(cfg.feedback_clear_secs, 5);
    }

    #[test]
    fn negative_clear_delay_is_clamped() {
        let cfg = Config {
            feedback_clear_secs: -3,
            ..Config::default()
        };
        assert_eq!(cfg.feedback_clear_after(), TimeDelta::zero());
    }

    #[test]
    fn oversized_clear_delay_saturates() {
        let cfg = Config {
            feedback_clear_secs: i64::MAX,
            ..Config::default()
        };
        assert_eq!(cfg.feedback_clear_after(), TimeDelta::MAX);
    }

    #[test]
    fn voice_carries_rate_and_language() {
        let cfg = Config {
            speech_rate: 0.8,
            language: "fr-FR".into(),
            ..Config::default()
        };
        assert_eq!(
            cfg.voice(),
            Voice {
                rate: 0.8,
                language: "fr-FR".into()
            }
        );
    }
}
