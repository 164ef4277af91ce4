use thiserror::Error;

use crate::api::ApiError;
use crate::inputs::Slot;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Precondition failed: {0}")]
    Precondition(#[from] Precondition),

    #[error("Upload failed ({status}): {body}")]
    Upload { status: u16, body: String },

    #[error("Job launch failed ({status}): {body}")]
    Launch { status: u16, body: String },

    #[error("Server returned status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Invalid response from server: {0}")]
    Protocol(String),

    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RunnerError {
    /// Maps an HTTP-layer failure of `POST /upload`.
    pub fn from_upload(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { status, body } => RunnerError::Upload { status, body },
            other => other.into(),
        }
    }

    /// Maps an HTTP-layer failure of `POST /run`.
    pub fn from_launch(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { status, body } => RunnerError::Launch { status, body },
            other => other.into(),
        }
    }
}

impl From<ApiError> for RunnerError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { status, body } => RunnerError::Remote { status, body },
            ApiError::Protocol(msg) => RunnerError::Protocol(msg),
            ApiError::Transport(e) => RunnerError::Transport(e),
        }
    }
}

/// Client-side checks that fail before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing input file: {0}")]
    MissingInput(Slot),

    #[error("invalid extension for {slot}: {filename} (expected .xlsx)")]
    BadExtension { slot: Slot, filename: String },

    #[error("header text is empty")]
    EmptyHeader,

    #[error("no session: upload the input files first")]
    NoSession,
}

/// What an operation was missing, or what it would have raced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("no valid session")]
    Session,

    #[error("header has not been committed since the last edit")]
    CommittedHeader,

    #[error("a job is already tracked; reset before starting another")]
    JobAlreadyTracked,

    #[error("no job has been launched")]
    Job,

    #[error("an upload is in progress; wait for its session")]
    UploadInFlight,

    #[error("a launch is in progress; wait for its job")]
    LaunchInFlight,
}
