use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for record-extra
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool settings
    pub transcoder: TranscoderConfig,

    /// Timeline synthesis settings
    pub timeline: TimelineConfig,

    /// Final concatenation settings
    pub concat: ConcatConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.transcoder.validate()?;
        self.timeline.validate()?;
        Ok(())
    }
}

/// ffmpeg/ffprobe invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    /// ffmpeg executable
    pub ffmpeg_path: String,

    /// ffprobe executable
    pub ffprobe_path: String,

    /// Value passed to `-loglevel`
    pub log_level: String,

    /// Pixel format forced on every synthesized clip
    pub pixel_format: String,

    /// JPEG quality for extracted stills (`-q:v`, 1 is best, 31 is worst)
    pub still_quality: u8,

    /// Directory for intermediate files (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            log_level: "error".to_string(),
            pixel_format: "yuv420p".to_string(),
            still_quality: 2,
            temp_dir: None,
        }
    }
}

impl TranscoderConfig {
    fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "transcoder.ffmpeg_path".to_string(),
                value: self.ffmpeg_path.clone()
            }.into());
        }

        if self.ffprobe_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "transcoder.ffprobe_path".to_string(),
                value: self.ffprobe_path.clone()
            }.into());
        }

        if !(1..=31).contains(&self.still_quality) {
            return Err(ConfigError::InvalidValue {
                key: "transcoder.still_quality".to_string(),
                value: self.still_quality.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Timeline synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Accepted gap (seconds) between a requested and a produced clip duration
    pub duration_tolerance: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            duration_tolerance: 0.1,
        }
    }
}

impl TimelineConfig {
    fn validate(&self) -> Result<()> {
        if !self.duration_tolerance.is_finite() || self.duration_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "timeline.duration_tolerance".to_string(),
                value: self.duration_tolerance.to_string()
            }.into());
        }

        Ok(())
    }
}

/// How synthesized clips are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcatMode {
    /// Concat demuxer with stream copy
    #[default]
    Demuxer,

    /// Concat filter, re-encodes every clip
    Filter,
}

/// Concatenation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcatConfig {
    pub mode: ConcatMode,

    /// Refuse to join clips whose known stream parameters disagree
    pub verify_streams: bool,
}

impl Default for ConcatConfig {
    fn default() -> Self {
        Self {
            mode: ConcatMode::Demuxer,
            verify_streams: true,
        }
    }
}
