use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubfetchError {
    #[error("{0}")]
    Usage(String),

    #[error("Missing dependencies: {}", .0.join(", "))]
    DependenciesMissing(Vec<String>),

    #[error("Download failed: {0}")]
    FetchFailed(String),

    #[error("Could not decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Muxing failed: {0}")]
    Mux(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SubfetchError {
    /// Errors caused by bad user input rather than by the environment.
    pub fn is_usage(&self) -> bool {
        matches!(self, SubfetchError::Usage(_) | SubfetchError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, SubfetchError>;
