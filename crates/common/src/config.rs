//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where to look for the media engine binaries.
    pub tools: ToolsConfig,

    /// Defaults for timeline editing.
    pub editing: EditingDefaults,

    /// Defaults for export.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Engine binary lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Explicit ffmpeg binary, checked before any search directory.
    pub ffmpeg: Option<PathBuf>,

    /// Explicit ffprobe binary.
    pub ffprobe: Option<PathBuf>,

    /// Extra directories searched before `PATH` (e.g. a bundled `./bin`).
    pub search_dirs: Vec<PathBuf>,
}

/// Timeline editing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingDefaults {
    /// Shortest piece a split or trim may leave behind (seconds).
    pub min_piece_sec: f64,

    /// Duration used when a transition is added without one (seconds).
    pub default_transition_sec: f64,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Audio selection mode: `mix`, `a1_only` or `v1_only`.
    pub audio_mode: String,

    /// Raw encode settings, normalized before use.
    pub settings: serde_json::Value,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelcut=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for EditingDefaults {
    fn default() -> Self {
        Self {
            min_piece_sec: 0.08,
            default_transition_sec: 0.5,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            audio_mode: "mix".to_string(),
            settings: serde_json::json!({}),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelcut").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"tools": {"search_dirs": ["./bin"]}}"#).unwrap();
        assert_eq!(config.tools.search_dirs, vec![PathBuf::from("./bin")]);
        assert!((config.editing.min_piece_sec - 0.08).abs() < 1e-9);
        assert_eq!(config.export.audio_mode, "mix");
        assert_eq!(config.logging.level, "info");
    }
}
