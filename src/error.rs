//! Common error types used throughout tubegate.
//!
//! Every core failure propagates to the request boundary as one of these
//! variants; handlers convert them to HTTP responses via [`IntoResponse`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Common error type for tubegate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The extraction engine returned no data after exhausting all retries.
    #[error("no data received from origin site after {attempts} attempts")]
    NoData { attempts: u32 },

    /// The extraction engine itself failed (bad exit status, unparsable output).
    #[error("extractor failed: {0}")]
    Extractor(String),

    /// An upstream fetch answered with a failure status; relayed 1:1.
    #[error("upstream returned status {status}")]
    Upstream { status: u16 },

    /// A raw record failed classification or structural validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A media stream did not contain the structure needed for segmentation.
    #[error("unsupported media container: {0}")]
    UnsupportedContainer(String),

    /// An outbound HTTP request failed before producing a response.
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Extractor error.
    pub fn extractor<S: Into<String>>(msg: S) -> Self {
        Self::Extractor(msg.into())
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status this error maps to at the request boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoData { .. } | Self::Extractor(_) => StatusCode::BAD_GATEWAY,
            Self::Upstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnsupportedContainer(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Http(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Validation(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{self}");
        }
        (status, self.to_string()).into_response()
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
