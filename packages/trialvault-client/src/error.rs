use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message} ({code})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
