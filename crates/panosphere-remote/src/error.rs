//! Remote client error taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the remote collaborators.
///
/// `Timeout` and `JobFailed` are deliberately distinct variants: a caller
/// that hits the polling deadline may retry later, while a failed job will
/// fail again with the same inputs.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file access failed while building a request.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The service answered with a non-success status or error payload.
    #[error("remote api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The submitted job reached a terminal failure state.
    #[error("remote job failed: {0}")]
    JobFailed(String),

    /// The job did not reach a terminal state before the polling deadline.
    #[error("remote job did not complete within {waited:?}")]
    Timeout { waited: Duration },

    /// A response parsed as JSON but no known shape matched.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// A response body was not valid JSON.
    #[error("invalid json in response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Map a non-success HTTP response to [`RemoteError::Api`] with its body.
pub(crate) fn ensure_success(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}
