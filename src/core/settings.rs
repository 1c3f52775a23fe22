//! Settings persistence
//!
//! Saves and loads [`AppSettings`] to/from a JSON file in the user's
//! configuration directory.
//!
//! # Error Handling
//!
//! [`AppSettings::load_or_default`] never fails: a missing, unreadable or
//! invalid file is logged and replaced by the defaults. Command-line flags are
//! applied on top of whatever was loaded.

use crate::core::{CoreError, CoreResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uci_bridge::{SessionConfig, DEFAULT_LOG_CAPACITY};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

/// Resolve the settings file path
///
/// Returns `settings.json` in the platform configuration directory, e.g.
/// `~/.config/chessdesk/settings.json`. Falls back to the current directory
/// when no home directory can be determined.
pub fn settings_path() -> PathBuf {
    match ProjectDirs::from("com", "chessdesk", "chessdesk") {
        Some(dirs) => dirs.config_dir().join(SETTINGS_FILENAME),
        None => PathBuf::from(SETTINGS_FILENAME),
    }
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Engine executable, looked up on `PATH` when not absolute
    pub engine_path: String,
    /// Extra arguments passed to the engine
    pub engine_args: Vec<String>,
    /// Skill level requested from the engine; clamped to 1-20 when applied
    pub difficulty: i64,
    /// Time budget per engine search in milliseconds
    pub thinking_time_ms: u64,
    /// Depth limit for the engine's replies in play mode
    pub max_depth: u32,
    /// Depth limit on the analysis screen
    pub analysis_depth: u32,
    /// Protocol lines kept per engine session
    pub log_capacity: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            engine_path: "stockfish".to_string(),
            engine_args: Vec::new(),
            difficulty: 10,
            thinking_time_ms: 1000,
            max_depth: 20,
            analysis_depth: 20,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl AppSettings {
    /// Read settings from `path`
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: AppSettings = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from `path`, falling back to the defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("[SETTINGS] No settings file found at {:?}. Using defaults.", path);
            return Self::default();
        }

        match Self::load(path) {
            Ok(settings) => {
                info!("[SETTINGS] Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!(
                    "[SETTINGS] Failed to load settings file at {:?}: {}. Using defaults.",
                    path, e
                );
                Self::default()
            }
        }
    }

    /// Write settings to `path`, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("[SETTINGS] Saved settings to {:?}", path);
        Ok(())
    }

    /// Reject values no engine search could use
    pub fn validate(&self) -> CoreResult<()> {
        if self.engine_path.trim().is_empty() {
            return Err(CoreError::InvalidSetting {
                field: "engine_path",
                message: "must not be empty".to_string(),
            });
        }
        if self.max_depth == 0 || self.analysis_depth == 0 {
            return Err(CoreError::InvalidSetting {
                field: "max_depth",
                message: "search depth must be at least 1".to_string(),
            });
        }
        if self.thinking_time_ms == 0 {
            return Err(CoreError::InvalidSetting {
                field: "thinking_time_ms",
                message: "must be at least 1ms".to_string(),
            });
        }
        Ok(())
    }

    /// Session settings derived from these preferences
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            difficulty: self.difficulty,
            log_capacity: self.log_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("chessdesk-test-{}", Uuid::new_v4()))
            .join(SETTINGS_FILENAME)
    }

    #[test]
    fn test_defaults_match_engine_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.difficulty, 10);
        assert_eq!(settings.thinking_time_ms, 1000);
        assert_eq!(settings.max_depth, 20);
        assert_eq!(settings.log_capacity, 100);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path();
        let settings = AppSettings {
            engine_path: "/opt/engines/stockfish".to_string(),
            difficulty: 4,
            ..AppSettings::default()
        };

        settings.save(&path).expect("save settings");
        let loaded = AppSettings::load(&path).expect("load settings");
        assert_eq!(loaded, settings);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = scratch_path();
        assert_eq!(AppSettings::load_or_default(&path), AppSettings::default());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{ "difficulty": 3 }"#).expect("partial settings");
        assert_eq!(settings.difficulty, 3);
        assert_eq!(settings.engine_path, "stockfish");
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let path = scratch_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).expect("create scratch dir");
        }
        fs::write(&path, "{ not json").expect("write scratch file");

        assert!(matches!(
            AppSettings::load(&path),
            Err(CoreError::SettingsSerialization(_))
        ));
        assert_eq!(AppSettings::load_or_default(&path), AppSettings::default());

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let settings = AppSettings {
            max_depth: 0,
            ..AppSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(CoreError::InvalidSetting { field: "max_depth", .. })
        ));
    }
}
