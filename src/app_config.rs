use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::matcher::DEFAULT_MASK_CHAR;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Profanity list (one phrase per line, optional `=> replacement`)
    #[serde(default = "default_swears_file")]
    pub swears_file: PathBuf,

    /// Matching and segment settings
    #[serde(default)]
    pub cleaning: CleaningConfig,

    /// Extra artifacts to produce
    #[serde(default)]
    pub outputs: OutputConfig,

    /// Settings for the ffmpeg/ffprobe collaborators
    #[serde(default)]
    pub media: MediaConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Matching and mute segment settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CleaningConfig {
    /// Seconds of padding around every scrubbed entry
    #[serde(default)]
    pub pad_secs: f64,

    /// Character used to mask matches without explicit replacement
    #[serde(default = "default_mask_char")]
    pub mask_char: char,

    /// Mute segments closer than this many milliseconds are merged
    #[serde(default)]
    pub merge_epsilon_ms: u64,

    /// Include every subtitle in the clean subtitle file, not just scrubbed ones
    #[serde(default)]
    pub full_subs: bool,

    /// Only produce subtitle-derived artifacts, leave audio alone
    #[serde(default)]
    pub subs_only: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            pad_secs: 0.0,
            mask_char: default_mask_char(),
            merge_epsilon_ms: 0,
            full_subs: false,
            subs_only: false,
        }
    }
}

/// Optional artifacts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct OutputConfig {
    /// Write an MPlayer EDL file
    #[serde(default)]
    pub edl: bool,

    /// Write a diagnostic JSON file
    #[serde(default)]
    pub json: bool,

    /// Write a flat skip-marker JSON file
    #[serde(default)]
    pub skip_markers: bool,

    /// Content identifier for skip markers and PlexAutoSkip documents
    #[serde(default)]
    pub plex_auto_skip_id: Option<String>,
}

/// Settings passed to the media tools
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MediaConfig {
    /// Subtitle language used to pick an embedded track
    #[serde(default = "default_subtitle_language")]
    pub subtitle_language: String,

    /// ffmpeg audio encoding parameters
    #[serde(default = "default_audio_params")]
    pub audio_params: String,

    /// ffmpeg video encoding parameters (only used when re-encoding)
    #[serde(default = "default_video_params")]
    pub video_params: String,

    /// Re-encode video instead of copying it
    #[serde(default)]
    pub re_encode_video: bool,

    /// Downmix multichannel audio to stereo
    #[serde(default)]
    pub downmix: bool,

    /// Index of the audio stream to clean (first one if unset)
    #[serde(default)]
    pub audio_stream_index: Option<usize>,

    /// Embed the clean subtitles into the output video
    #[serde(default)]
    pub embed_subs: bool,

    /// Timeout for a single ffmpeg run
    #[serde(default = "default_ffmpeg_timeout_secs")]
    pub ffmpeg_timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            subtitle_language: default_subtitle_language(),
            audio_params: default_audio_params(),
            video_params: default_video_params(),
            re_encode_video: false,
            downmix: false,
            audio_stream_index: None,
            embed_subs: false,
            ffmpeg_timeout_secs: default_ffmpeg_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_swears_file() -> PathBuf {
    PathBuf::from("swears.txt")
}

fn default_mask_char() -> char {
    DEFAULT_MASK_CHAR
}

fn default_subtitle_language() -> String {
    "eng".to_string()
}

fn default_audio_params() -> String {
    "-c:a aac -ab 224k -ar 44100".to_string()
}

fn default_video_params() -> String {
    "-c:v libx264 -preset slow -crf 22".to_string()
}

fn default_ffmpeg_timeout_secs() -> u64 {
    4 * 60 * 60 // long movies re-encode slowly
}

impl Config {
    /// Load a configuration file, creating it with defaults if missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            log::warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let pad = self.cleaning.pad_secs;
        if !pad.is_finite() || pad < 0.0 {
            return Err(anyhow!("Pad must be a non-negative number of seconds, got {}", pad));
        }

        if self.cleaning.mask_char.is_whitespace() || self.cleaning.mask_char.is_control() {
            return Err(anyhow!("Mask character must be visible, got {:?}", self.cleaning.mask_char));
        }

        if crate::media::normalize_language(&self.media.subtitle_language).is_none() {
            return Err(anyhow!("Unknown subtitle language code: {}", self.media.subtitle_language));
        }

        if self.media.ffmpeg_timeout_secs == 0 {
            return Err(anyhow!("ffmpeg timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Pad converted to whole milliseconds
    pub fn pad_ms(&self) -> u64 {
        (self.cleaning.pad_secs * 1000.0).round() as u64
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            swears_file: default_swears_file(),
            cleaning: CleaningConfig::default(),
            outputs: OutputConfig::default(),
            media: MediaConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
