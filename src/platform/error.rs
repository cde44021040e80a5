use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {0}")]
    BodyRead(String, #[source] reqwest::Error),

    #[error("Failed to decode open-data platform JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}
