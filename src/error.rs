use thiserror::Error;

/// Failures talking to the agent suite backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error! Status: {status} ({url})")]
    Status { status: u16, url: String },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

impl BackendError {
    pub fn decode(url: &str, err: impl std::fmt::Display) -> Self {
        BackendError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}
