//! User settings
//!
//! Stored in `{config_dir}/sculpt/settings.json`. Command-line flags take
//! precedence over anything loaded here.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Settings that persist across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Samples along each axis of a slice
    pub slice_resolution: u32,
    /// Half width of the square a slice covers, in world units
    pub slice_extent: f32,
    /// Characters for terminal slices, from deep inside to far outside
    pub ascii_ramp: String,
    /// Debounce window for `sculpt watch`
    pub watch_debounce_ms: u64,
    /// Maximum number of REPL history entries kept
    pub history_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            slice_resolution: 48,
            slice_extent: 2.0,
            ascii_ramp: "@#*+=-:. ".to_string(),
            watch_debounce_ms: 100,
            history_size: 1000,
        }
    }
}

impl Settings {
    /// The ASCII ramp as characters, falling back to the default when the
    /// configured one is too short to show an edge.
    pub fn ramp(&self) -> Vec<char> {
        let ramp: Vec<char> = self.ascii_ramp.chars().collect();
        if ramp.len() < 2 {
            Self::default().ascii_ramp.chars().collect()
        } else {
            ramp
        }
    }
}

/// Get the path to the settings file
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sculpt").join("settings.json"))
}

/// Load settings from disk, returning defaults if the file doesn't exist or
/// is invalid
pub fn load_settings() -> Settings {
    let Some(path) = settings_path() else {
        return Settings::default();
    };

    if !path.exists() {
        return Settings::default();
    }

    match fs::read_to_string(&path) {
        Ok(contents) => parse_settings(&contents),
        Err(e) => {
            tracing::warn!("Could not read {}: {}", path.display(), e);
            Settings::default()
        }
    }
}

fn parse_settings(contents: &str) -> Settings {
    serde_json::from_str(contents).unwrap_or_else(|e| {
        tracing::warn!("Ignoring invalid settings file: {}", e);
        Settings::default()
    })
}

/// Save settings to disk
pub fn save_settings(settings: &Settings) -> Result<()> {
    let Some(path) = settings_path() else {
        bail!("Could not determine config directory");
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

    fs::write(&path, json).context("Failed to write settings file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = parse_settings(r#"{ "slice_resolution": 16 }"#);
        assert_eq!(settings.slice_resolution, 16);
        assert_eq!(settings.history_size, Settings::default().history_size);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        assert_eq!(parse_settings("not json"), Settings::default());
    }

    #[test]
    fn short_ramp_is_replaced() {
        let settings = Settings {
            ascii_ramp: "#".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.ramp(), Settings::default().ramp());
    }
}
