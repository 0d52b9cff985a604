/// An error returned by an API operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be delivered or the response could not be
    /// received: connection failures, DNS failures, timeouts.
    #[error("Request failed")]
    Transport(#[from] reqwest::Error),
    /// The API responded with a non-success HTTP status. Client errors and
    /// server errors are not distinguished.
    #[error("{status}: {body}")]
    Http {
        /// The HTTP status of the response.
        status: http::StatusCode,
        /// The raw response body.
        body: String,
    },
    /// The response body was not valid JSON, or was missing a field
    /// required by the response type.
    #[error("Invalid response ({status}): {source}")]
    InvalidResponse {
        /// The HTTP status of the response.
        status: http::StatusCode,
        /// The decoding error, including the path to the offending field.
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    /// The configured API URL, joined with the operation's path, is not a
    /// valid URL.
    #[error("Invalid API URL")]
    InvalidUrl(#[from] url::ParseError),
    /// A request could not be built from the resolved URL.
    #[error("Invalid request")]
    InvalidRequest(#[from] http::Error),
    /// Reading the response body failed.
    #[error("Failed to read response body")]
    Io(#[from] std::io::Error),
    /// The client was used after it was closed.
    #[error("Client is closed")]
    Closed,
}

impl ApiError {
    /// The HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            ApiError::Http { status, .. } | ApiError::InvalidResponse { status, .. } => {
                Some(*status)
            }
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// The path of the field that failed to decode, for
    /// [`ApiError::InvalidResponse`] errors.
    pub fn field_path(&self) -> Option<String> {
        match self {
            ApiError::InvalidResponse { source, .. } => Some(source.path().to_string()),
            _ => None,
        }
    }
}
