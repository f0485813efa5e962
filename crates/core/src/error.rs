use thiserror::Error;

/// Why a generation call produced no SiteContent
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("prompt is empty")]
    EmptyPrompt,

    /// Network, quota or upstream failure
    #[error("generative backend failed: {0}")]
    Backend(String),

    /// Payload did not satisfy the response schema
    #[error("generation result is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Site not found")]
    NotFound,

    #[error("This site is not yet published by the author")]
    NotPublished,

    /// Store-level authorization rejection
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
