use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::gesture::GestureConfig;
use crate::spotlight::SpotlightSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub slides: SlideConfig,
    pub gestures: GestureConfig,
    pub spotlight: SpotlightSettings,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub mirror: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    pub dir: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub stroke_thickness: u32,
    pub stroke_color_hex: String, // e.g. "#00C8C8"
    pub pointer_color_hex: String,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub status_scale: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            mirror: true,
        }
    }
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self {
            dir: "Resources".to_string(),
            width: 960,
            height: 540,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            stroke_thickness: 5,
            stroke_color_hex: "#00C8C8".to_string(),
            pointer_color_hex: "#FF0000".to_string(),
            thumbnail_width: 213,
            thumbnail_height: 120,
            status_scale: 3,
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "config.json";

    /// Loads `path`, falling back to defaults, then writes the file back so
    /// that newly added fields show up in it.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            // Missing fields take their Default thanks to #[serde(default)].
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    info!(path = %path.display(), "loaded configuration");
                    c
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error parsing config, using defaults");
                    Self::default()
                }
            }
        } else {
            info!(path = %path.display(), "configuration file not found, creating default");
            Self::default()
        };

        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// `#RRGGBB` to an RGB triple; anything malformed becomes red.
pub fn parse_hex(hex: &str) -> (u8, u8, u8) {
    if hex.len() == 7 && hex.is_ascii() && hex.starts_with('#') {
        let r = u8::from_str_radix(&hex[1..3], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[3..5], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[5..7], 16).unwrap_or(0);
        (r, g, b)
    } else {
        (255, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#FF0000"), (255, 0, 0));
        assert_eq!(parse_hex("#00C8C8"), (0, 200, 200));
        assert_eq!(parse_hex("#FFFFFF"), (255, 255, 255));
        assert_eq!(parse_hex("invalid"), (255, 0, 0));
        assert_eq!(parse_hex("#a\u{e9}bcd"), (255, 0, 0));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{ "spotlight": { "radius": 220 }, "gestures": { "debounce_ticks": 5 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.spotlight.radius, 220);
        assert_eq!(config.spotlight.dim_opacity, 0.7);
        assert_eq!(config.gestures.debounce_ticks, 5);
        assert_eq!(config.gestures.pinch_threshold, 40.0);
        assert_eq!(config.slides.width, 960);
        assert_eq!(config.capture.height, 720);
    }

    #[test]
    fn test_load_writes_defaults_back() {
        let path = std::env::temp_dir().join(format!("gesture_deck_config_{}.json", std::process::id()));
        let _ = fs::remove_file(&path);
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.slides.dir, "Resources");
        assert!(path.exists());
        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded.ui.thumbnail_width, 213);
        let _ = fs::remove_file(&path);
    }
}
