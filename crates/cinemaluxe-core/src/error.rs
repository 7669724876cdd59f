//! Error types for the CinemaLuxe scraper
//!
//! Provides the error enum shared by every operation, with human-readable
//! messages and string serialization for the addon boundary.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all CinemaLuxe scraper operations
///
/// Implements Display for human-readable messages and Serialize so the
/// addon-serving layer can forward errors as plain strings.
#[derive(Error, Debug)]
pub enum CinemaluxeError {
    /// HTTP request failed at the transport level
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote site answered with a non-success status
    #[error("unexpected status {status} for {url}")]
    BadStatus { status: u16, url: String },

    /// Rate limited by the remote site (HTTP 429)
    #[error("rate limited - too many requests")]
    RateLimited,

    /// Page or required markup was not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed embedded data or HTML structure
    #[error("failed to parse page data: {0}")]
    Parse(String),

    /// URL could not be resolved against the site base
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Caller supplied a malformed top-level request
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Serialize for CinemaluxeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for CinemaLuxe operations
pub type Result<T> = std::result::Result<T, CinemaluxeError>;
