use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Persisted display settings for the demo front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Registry name of the preferred blitter backend.
    pub blitter: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl DisplayConfig {
    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&json).map_err(|e| e.to_string())
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            blitter: "32bpp-anim".to_string(),
            width: 640,
            height: 480,
            vsync: true,
        }
    }
}
