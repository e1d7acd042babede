use crate::error::{Result, SubfetchError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// External tool used to attach the caption track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuxBackend {
    #[default]
    Mkvmerge,
    Ffmpeg,
}

impl std::fmt::Display for MuxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MuxBackend::Mkvmerge => write!(f, "mkvmerge"),
            MuxBackend::Ffmpeg => write!(f, "ffmpeg"),
        }
    }
}

impl std::str::FromStr for MuxBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mkvmerge" => Ok(MuxBackend::Mkvmerge),
            "ffmpeg" => Ok(MuxBackend::Ffmpeg),
            _ => Err(format!(
                "Unknown mux backend: {}. Use 'mkvmerge' or 'ffmpeg'",
                s
            )),
        }
    }
}

/// Granularity of caption translation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslateMode {
    /// One request per cue; the cue's text lines are sent together.
    #[default]
    Block,
    /// One request per text line.
    Line,
}

impl std::fmt::Display for TranslateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateMode::Block => write!(f, "block"),
            TranslateMode::Line => write!(f, "line"),
        }
    }
}

impl std::str::FromStr for TranslateMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(TranslateMode::Block),
            "line" => Ok(TranslateMode::Line),
            _ => Err(format!("Unknown translate mode: {}. Use 'block' or 'line'", s)),
        }
    }
}

/// Program names (or absolute paths) of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub yt_dlp: String,
    pub mkvmerge: String,
    pub ffmpeg: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            mkvmerge: "mkvmerge".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_lang: String,
    pub target_lang: String,
    /// Name given to the muxed caption track.
    pub track_name: String,
    /// Container extension requested from the fetch tool.
    pub container: String,
    pub mux_backend: MuxBackend,
    pub translate_mode: TranslateMode,
    /// Temporary workspace the fetch tool writes into.
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub primary_endpoint: String,
    pub fallback_endpoint: String,
    pub request_timeout_secs: u64,
    /// Lines sampled for language detection in folder translation.
    pub detect_sample_lines: usize,
    pub tools: ToolPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            track_name: "Español".to_string(),
            container: "mkv".to_string(),
            mux_backend: MuxBackend::default(),
            translate_mode: TranslateMode::default(),
            temp_dir: std::env::temp_dir().join("yt_downloader"),
            output_dir: PathBuf::from("Descargas_YT"),
            primary_endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            fallback_endpoint: "https://clients5.google.com/translate_a/t".to_string(),
            request_timeout_secs: 10,
            detect_sample_lines: 20,
            tools: ToolPaths::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = toml::from_str::<Config>(&contents)?;
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style variables.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(lang) = var("SUBFETCH_SOURCE_LANG") {
            self.source_lang = lang;
        }
        if let Some(lang) = var("SUBFETCH_TARGET_LANG") {
            self.target_lang = lang;
        }
        if let Some(dir) = var("SUBFETCH_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("SUBFETCH_TEMP_DIR") {
            self.temp_dir = PathBuf::from(dir);
        }
        if let Some(backend) = var("SUBFETCH_MUX_BACKEND") {
            if let Ok(b) = backend.parse() {
                self.mux_backend = b;
            }
        }
        if let Some(mode) = var("SUBFETCH_TRANSLATE_MODE") {
            if let Ok(m) = mode.parse() {
                self.translate_mode = m;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_lang.trim().is_empty() || self.target_lang.trim().is_empty() {
            return Err(SubfetchError::Config(
                "Source and target language codes must not be empty".to_string(),
            ));
        }
        if self.container.trim().is_empty() {
            return Err(SubfetchError::Config(
                "Container extension must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(SubfetchError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        if self.detect_sample_lines == 0 {
            return Err(SubfetchError::Config(
                "Detection sample must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Program name of the tool backing the configured mux backend.
    pub fn mux_tool(&self) -> &str {
        match self.mux_backend {
            MuxBackend::Mkvmerge => &self.tools.mkvmerge,
            MuxBackend::Ffmpeg => &self.tools.ffmpeg,
        }
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subfetch").join("config.toml"))
    }
}
