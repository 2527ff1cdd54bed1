use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single call against the catalog API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, timeout, ...)
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("{url} returned {status}: {message}")]
    Status {
        url: String,
        status: StatusCode,
        message: String,
    },

    /// The response body did not match the expected shape
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The catalog refused the mutation (duplicate id, unknown id, ...)
    #[error("{0}")]
    Rejected(String),

    /// The catalog could not be reached (offline catalog failure injection)
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// Message suitable for showing to the user.
    ///
    /// Server-supplied messages are passed through as-is; transport details
    /// stay in the log.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Rejected(message) => message.clone(),
            ApiError::Transport { .. } | ApiError::Unavailable(_) => {
                "Could not reach the catalog server".to_string()
            }
            ApiError::Decode { .. } => "The catalog server sent an unexpected response".to_string(),
        }
    }
}
