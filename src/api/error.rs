//! Errors of the HTTP layer.
//!
//! [`ApiError`] only says *how* a call failed; the caller decides what the
//! failure means (an upload rejection, a launch rejection, a skipped poll).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status. The body is kept
    /// verbatim, plain text or JSON.
    #[error("server rejected request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    /// A success response whose body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Protocol(String),

    /// Connection, DNS or timeout failure.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
