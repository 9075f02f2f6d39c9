use crate::recorder::hotkey::Hotkey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CAPTURE_HALF_SIZE: i32 = 150;

/// User settings, stored as JSON in the platform config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Folder created under the user's Documents directory for recordings.
    pub output_folder_name: String,
    /// Half the edge length of the square captured around each click.
    pub capture_half_size: i32,
    pub stop_hotkey: Hotkey,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_folder_name: "StepSnap".to_string(),
            capture_half_size: DEFAULT_CAPTURE_HALF_SIZE,
            stop_hotkey: Hotkey::stop_default(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("com.stepsnap.app").join("config.json"))
}

pub fn load() -> RecorderConfig {
    let Some(path) = config_path() else {
        return RecorderConfig::default();
    };
    load_from(&path)
}

/// Unreadable or invalid files yield the defaults. A missing file is created
/// with the defaults so there is something to edit.
pub fn load_from(path: &Path) -> RecorderConfig {
    let config = match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), "ignoring invalid config: {err}");
            RecorderConfig::default()
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let config = RecorderConfig::default();
            match save_to(path, &config) {
                Ok(()) => tracing::info!(path = %path.display(), "wrote default config"),
                Err(err) => tracing::warn!(path = %path.display(), "could not write default config: {err}"),
            }
            config
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), "could not read config: {err}");
            RecorderConfig::default()
        }
    };
    if config.capture_half_size <= 0 {
        tracing::warn!(
            "capture_half_size must be positive, using {DEFAULT_CAPTURE_HALF_SIZE}"
        );
        return RecorderConfig {
            capture_half_size: DEFAULT_CAPTURE_HALF_SIZE,
            ..config
        };
    }
    config
}

pub fn save_to(path: &Path, config: &RecorderConfig) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let json = serde_json::to_string_pretty(config).map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recording_layout() {
        let config = RecorderConfig::default();
        assert_eq!(config.output_folder_name, "StepSnap");
        assert_eq!(config.capture_half_size, 150);
        assert_eq!(config.stop_hotkey.to_string(), "ctrl+alt+s");
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("nested").join("config.json");

        let config = RecorderConfig {
            output_folder_name: "Guides".to_string(),
            capture_half_size: 200,
            stop_hotkey: "ctrl+shift+x".parse().unwrap(),
        };
        save_to(&path, &config).expect("save");

        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"capture_half_size": 75}"#).expect("write");

        let config = load_from(&path);
        assert_eq!(config.capture_half_size, 75);
        assert_eq!(config.output_folder_name, "StepSnap");
    }

    #[test]
    fn missing_file_returns_default_and_writes_it() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("com.stepsnap.app").join("config.json");
        let config = load_from(&path);
        assert_eq!(config, RecorderConfig::default());

        let written = std::fs::read_to_string(&path).expect("default config written");
        assert!(written.contains("\"stop_hotkey\": \"ctrl+alt+s\""));
        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn corrupt_file_is_not_overwritten() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ half edited").expect("write");
        assert_eq!(load_from(&path), RecorderConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ half edited");
    }

    #[test]
    fn corrupt_json_returns_default() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not valid json").expect("write corrupt file");
        assert_eq!(load_from(&path), RecorderConfig::default());
    }

    #[test]
    fn invalid_hotkey_or_size_falls_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"stop_hotkey": "s"}"#).expect("write");
        assert_eq!(load_from(&path), RecorderConfig::default());

        std::fs::write(&path, r#"{"capture_half_size": 0}"#).expect("write");
        assert_eq!(load_from(&path).capture_half_size, 150);
    }
}
