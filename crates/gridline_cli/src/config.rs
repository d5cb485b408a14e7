//! Gridline configuration file handling

use anyhow::{Context, Result};
use gridline_replay::ReplayConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = "gridline.toml";

/// Top-level configuration (gridline.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GridlineConfig {
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Terminal output settings
#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Clear the screen before each frame
    #[serde(default = "default_true")]
    pub clear_screen: bool,
    /// Print the key legend under the leaderboard
    #[serde(default = "default_true")]
    pub show_controls: bool,
    /// Seconds the starting grid is shown before playback
    #[serde(default = "default_intro_hold")]
    pub intro_hold_secs: f64,
    /// Colour teams, sectors, tyres and track status with ANSI escapes
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

fn default_intro_hold() -> f64 {
    5.0
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            clear_screen: true,
            show_controls: true,
            intro_hold_secs: default_intro_hold(),
            color: true,
        }
    }
}

impl DisplayConfig {
    pub fn intro_hold(&self) -> Duration {
        Duration::try_from_secs_f64(self.intro_hold_secs).unwrap_or_default()
    }
}

impl GridlineConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `gridline.toml` in the
    /// working directory is used if present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file {} does not exist", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = Path::new(CONFIG_FILE);
                if !path.exists() {
                    tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
                path.to_path_buf()
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        tracing::debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GridlineConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = GridlineConfig::from_toml("").unwrap();
        assert_eq!(config.replay, ReplayConfig::default());
        assert!(config.display.clear_screen);
        assert!(config.display.show_controls);
        assert!(config.display.color);
        assert_eq!(config.display.intro_hold(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_tables() {
        let config = GridlineConfig::from_toml(
            r#"
            [replay]
            initial_speed = 8.0
            skip_seconds = 30.0

            [display]
            clear_screen = false
            color = false
            "#,
        )
        .unwrap();
        assert_eq!(config.replay.initial_speed, 8.0);
        assert_eq!(config.replay.skip_seconds, 30.0);
        assert_eq!(config.replay.frame_rate, 20.0);
        assert!(!config.display.clear_screen);
        assert!(!config.display.color);
        assert_eq!(config.display.intro_hold_secs, 5.0);
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(GridlineConfig::from_toml("[replay]\nframe_rate = \"fast\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = GridlineConfig::load(Some(Path::new("/nonexistent/gridline.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_negative_intro_hold_is_zero() {
        let display = DisplayConfig {
            intro_hold_secs: -2.0,
            ..DisplayConfig::default()
        };
        assert_eq!(display.intro_hold(), Duration::ZERO);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = GridlineConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = GridlineConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.replay, config.replay);
    }
}
