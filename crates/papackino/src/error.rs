//! Error types for Papackino

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while packing a document
#[derive(Debug, Error)]
pub enum InlineError {
    /// Input document does not exist
    #[error("file {} not found.", .0.display())]
    InputNotFound(PathBuf),

    /// Failed to read or write a local file
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reference could not be turned into a locator
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Extension has no media type for data URI embedding
    #[error("Unsupported media type for {reference}: unknown extension {extension:?}")]
    UnsupportedMediaType {
        reference: String,
        extension: String,
    },

    /// Server answered with a non-success status
    #[error("Request failed for {url}: status code {status}")]
    HttpStatus { url: String, status: u16 },

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// No registered fetcher accepts the locator
    #[error("Fetcher error: {0}")]
    FetcherError(String),
}

impl InlineError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            InlineError::Timeout
        } else if err.is_connect() {
            InlineError::ConnectError(err)
        } else {
            InlineError::RequestError(err.to_string())
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InlineError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            InlineError::InputNotFound(PathBuf::from("missing.html")).to_string(),
            "file missing.html not found."
        );
        assert_eq!(
            InlineError::HttpStatus {
                url: "https://example.com/a.css".to_string(),
                status: 404
            }
            .to_string(),
            "Request failed for https://example.com/a.css: status code 404"
        );
        assert_eq!(
            InlineError::UnsupportedMediaType {
                reference: "pic.xyz".to_string(),
                extension: ".xyz".to_string()
            }
            .to_string(),
            "Unsupported media type for pic.xyz: unknown extension \".xyz\""
        );
        assert_eq!(InlineError::Timeout.to_string(), "Request timed out");
    }

    #[test]
    fn test_io_error_names_path() {
        let err = InlineError::io(
            "assets/app.js",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        );
        let message = err.to_string();
        assert!(message.contains("assets/app.js"));
        assert!(message.contains("No such file"));
    }
}
