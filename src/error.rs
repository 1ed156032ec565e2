use thiserror::Error;

/// Errors produced by the dream architect core
#[derive(Error, Debug)]
pub enum ArchitectError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode Gemini response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown persona id '{0}'")]
    UnknownPersona(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArchitectError {
    /// True for failures reported by the service itself (auth, quota, server errors)
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

pub type Result<T> = std::result::Result<T, ArchitectError>;
