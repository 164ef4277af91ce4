pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, Endpoints};
pub use error::ApiError;
pub use types::{
    JobId, JobState, JobStatus, ResultItem, RunRequest, RunResponse, SessionId, UploadResponse,
};

use crate::inputs::UploadPart;

/// The remote calls the lifecycle core depends on.
///
/// [`ApiClient`] talks HTTP; tests drive the core with a scripted double.
#[allow(async_fn_in_trait)]
pub trait RemoteService {
    async fn upload(&self, parts: Vec<UploadPart>) -> Result<UploadResponse, ApiError>;

    async fn run(&self, request: &RunRequest) -> Result<RunResponse, ApiError>;

    async fn status(&self, job_id: &JobId) -> Result<JobStatus, ApiError>;

    async fn logs(&self, job_id: &JobId) -> Result<String, ApiError>;

    async fn results(&self, job_id: &JobId) -> Result<Vec<ResultItem>, ApiError>;
}
