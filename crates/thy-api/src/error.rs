//! Errors that can occur when talking to the vault API

use reqwest::{header::InvalidHeaderValue, StatusCode};
use thiserror::Error;

/// Errors from building or performing network requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// A request or response body could not be (de)serialized.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// A configured header (token, user agent) contains invalid characters.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    /// The server answered with an error status and a message.
    #[error("Received error message from server: [{}] {}", .status, .message)]
    ResponseContent {
        /// HTTP status code.
        status: StatusCode,
        /// Message extracted from the response body.
        message: String,
    },

    /// The server answered with an error status and no body.
    #[error("Error processing API response: [{status}]")]
    EmptyResponse {
        /// HTTP status code.
        status: StatusCode,
    },

    /// Both a path and an id were given for the same resource.
    #[error("only one of --id and --path (or [path]) may be set")]
    AmbiguousResource,

    /// Neither a path nor an id was given.
    #[error("must specify --id or --path (or [path])")]
    MissingResource,
}

impl ApiError {
    /// Whether the error carries no explanation from the server, so the request log shown in
    /// verbose mode is the only way to diagnose it.
    pub fn lacks_detail(&self) -> bool {
        matches!(self, ApiError::EmptyResponse { .. } | ApiError::Reqwest(_))
    }

    /// The HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::ResponseContent { status, .. } | ApiError::EmptyResponse { status } => {
                Some(*status)
            }
            ApiError::Reqwest(e) => e.status(),
            _ => None,
        }
    }
}
