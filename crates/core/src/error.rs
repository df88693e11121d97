//! Error taxonomy for configuration, catalog, and poster failures.
//!
//! Every kind is converted into a log entry (and optionally a status-line
//! update) at the boundary where it occurs; none of them aborts the
//! process. The one exception is [`ConfigError`], which is terminal for
//! the startup flow before any network access happens.

use thiserror::Error;

/// Failure while fetching or decoding one catalog page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection-level failure or a non-success HTTP status.
    #[error("catalog request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The response body was not the JSON shape the API documents.
    #[error("catalog response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure while downloading a single poster image.
#[derive(Debug, Error)]
pub enum PosterError {
    /// Connection-level failure or a non-success HTTP status.
    #[error("poster request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The server answered 2xx but sent no bytes.
    #[error("poster response was empty")]
    EmptyBody,
}

/// Configuration problem detected before the first network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither `GAME_API_KEY`, the config file, nor the compiled-in
    /// fallback provided a usable credential.
    #[error("API key not found; set GAME_API_KEY or add api_key to the config file")]
    MissingApiKey,
}
