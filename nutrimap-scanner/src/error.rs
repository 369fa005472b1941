use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether another attempt at the same URL could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            FetchError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Timeout { .. } => true,
            FetchError::InvalidUrl(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
