use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::RemoteService;
use super::error::ApiError;
use super::types::{JobId, JobStatus, ResultItem, RunRequest, RunResponse, UploadResponse};
use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::inputs::{Slot, UploadPart};

/// Multipart field shared by all uploaded files.
pub const UPLOAD_FIELD: &str = "files";

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// URL builder for every endpoint under one base address.
///
/// An empty base yields origin-relative paths, which are fine for links but
/// cannot be requested by [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn upload(&self) -> String {
        self.url("/upload")
    }

    pub fn run(&self) -> String {
        self.url("/run")
    }

    pub fn status(&self, job_id: &JobId) -> String {
        self.url(&format!("/status/{job_id}"))
    }

    pub fn logs(&self, job_id: &JobId) -> String {
        self.url(&format!("/logs/{job_id}"))
    }

    pub fn results(&self, job_id: &JobId) -> String {
        self.url(&format!("/results/{job_id}"))
    }

    pub fn download_all(&self, job_id: &JobId) -> String {
        self.url(&format!("/download/{job_id}/all.zip"))
    }

    /// Absolute link for a result item; its `download_url` is origin-relative.
    pub fn artifact(&self, item: &ResultItem) -> String {
        if item.download_url.starts_with("http://") || item.download_url.starts_with("https://") {
            item.download_url.clone()
        } else {
            self.url(&item.download_url)
        }
    }

    pub fn example(&self, slot: Slot) -> String {
        self.url(&format!("/examples/{}", slot.standard_filename()))
    }
}

pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn from_config(config: &RunnerConfig) -> Result<Self, RunnerError> {
        Self::with_timeouts(
            &config.api_base,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a client with default timeouts (useful for testing).
    pub fn new(base_url: &str) -> Result<Self, RunnerError> {
        Self::with_timeouts(base_url, Duration::from_secs(10), Duration::from_secs(120))
    }

    pub fn with_timeouts(
        base_url: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, RunnerError> {
        let endpoints = Endpoints::new(base_url);
        if endpoints.base().is_empty() {
            return Err(RunnerError::Config(
                "api_base is empty; set it to the service address, e.g. http://localhost:8080"
                    .into(),
            ));
        }
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .map_err(RunnerError::Transport)?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetches an artifact or example file as raw bytes. The content is not
    /// interpreted.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        debug!(url, "downloading");
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn fetch_example(&self, slot: Slot) -> Result<Vec<u8>, ApiError> {
        self.download(&self.endpoints.example(slot)).await
    }
}

impl RemoteService for ApiClient {
    async fn upload(&self, parts: Vec<UploadPart>) -> Result<UploadResponse, ApiError> {
        let url = self.endpoints.upload();
        let mut form = Form::new();
        for part in parts {
            debug!(slot = %part.slot, filename = part.filename, "adding upload part");
            let file = Part::bytes(part.data)
                .file_name(part.filename)
                .mime_str(XLSX_MIME)?;
            form = form.part(UPLOAD_FIELD, file);
        }
        debug!(url = %url, "uploading inputs");
        let response = self.client.post(&url).multipart(form).send().await?;
        parse_json(response).await
    }

    async fn run(&self, request: &RunRequest) -> Result<RunResponse, ApiError> {
        let url = self.endpoints.run();
        debug!(url = %url, session_id = %request.session_id, "starting job");
        let response = self.client.post(&url).json(request).send().await?;
        parse_json(response).await
    }

    async fn status(&self, job_id: &JobId) -> Result<JobStatus, ApiError> {
        let response = self.client.get(self.endpoints.status(job_id)).send().await?;
        parse_json(response).await
    }

    async fn logs(&self, job_id: &JobId) -> Result<String, ApiError> {
        let response = self.client.get(self.endpoints.logs(job_id)).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.text().await?)
    }

    async fn results(&self, job_id: &JobId) -> Result<Vec<ResultItem>, ApiError> {
        let response = self.client.get(self.endpoints.results(job_id)).send().await?;
        parse_json(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    warn!(status = status.as_u16(), %body, "request rejected");
    Err(ApiError::Rejected {
        status: status.as_u16(),
        body,
    })
}

// Reads the body as text first so a non-JSON success body surfaces as a
// protocol error rather than a transport one.
async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        warn!(error = %e, body = %text, "unparseable response body");
        ApiError::Protocol(e.to_string())
    })
}
