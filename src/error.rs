//! Unified error type for the file manager.
//!
//! Every failure in the resolve/load/upload paths funnels into [`Error`],
//! which carries enough context for route handlers to derive an HTTP status
//! via [`Error::http_status`]. Errors are rendered to callers as plain text.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Unified error type covering all request-scoped failure modes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required request parameter is missing or unusable.
    #[error("{0}")]
    Validation(String),

    /// A resolved path could not be opened on disk.
    #[error("File was not found in file system: {}", path.display())]
    FileNotFound {
        /// The composed path that failed to open.
        path: PathBuf,
        /// The underlying open error.
        #[source]
        source: std::io::Error,
    },

    /// The metadata service has no image path recorded for the entity.
    #[error("No image found for entity {entity_id}")]
    ImageNotFound {
        /// The entity that has no recorded image.
        entity_id: String,
    },

    /// A file was opened but its contents could not be read.
    #[error("Unable to read file {}: {source}", path.display())]
    ReadFailed {
        /// The file being read.
        path: PathBuf,
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },

    /// The metadata service could not be reached.
    #[error("Error in communication with metadata service at {url}: {source}")]
    UpstreamUnreachable {
        /// The request URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The metadata service answered with a status other than 200.
    #[error("Metadata service returned {status}: {message}")]
    Upstream {
        /// The upstream HTTP status code.
        status: u16,
        /// The upstream response body, when one could be read.
        message: String,
    },

    /// The metadata service response did not match the expected shape.
    #[error("Unable to decode metadata service response: {0}")]
    Decode(String),

    /// The inbound request body could not be decoded.
    #[error("Unable to decode request body: {0}")]
    MalformedRequest(String),

    /// Writing an uploaded image to disk failed.
    #[error("Unable to persist {}: {source}", path.display())]
    Persistence {
        /// The directory or file being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The image was written but the metadata service did not accept the record.
    #[error("Image stored for entity {entity_id} but registration failed: {source}")]
    UpstreamNotify {
        /// The entity whose upload could not be registered.
        entity_id: String,
        /// The resolver failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::FileNotFound { .. } => 400,
            Error::ImageNotFound { .. } => 500,
            Error::ReadFailed { .. } => 500,
            Error::UpstreamUnreachable { .. } => 500,
            Error::Upstream { .. } => 500,
            Error::Decode(_) => 500,
            Error::MalformedRequest(_) => 500,
            Error::Persistence { .. } => 500,
            Error::UpstreamNotify { .. } => 500,
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Convenience constructor for [`Error::ImageNotFound`].
    pub fn image_not_found(entity_id: impl Into<String>) -> Self {
        Error::ImageNotFound {
            entity_id: entity_id.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Server error in API handler");
        } else {
            tracing::warn!(status = %status, error = %self, "Request rejected");
        }

        (status, self.to_string()).into_response()
    }
}
