//! Scripted [`RemoteService`] double with call counters.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::api::{
    ApiError, JobId, JobState, JobStatus, RemoteService, ResultItem, RunRequest, RunResponse,
    UploadResponse,
};
use crate::inputs::UploadPart;

#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    Rejected(u16, &'static str),
    Garbled,
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, ApiError> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Rejected(status, body) => Err(ApiError::Rejected {
                status,
                body: body.to_string(),
            }),
            Reply::Garbled => Err(ApiError::Protocol("expected value at line 1 column 1".into())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Calls {
    pub upload: usize,
    pub run: usize,
    pub status: usize,
    pub logs: usize,
    pub results: usize,
    pub uploaded_filenames: Vec<String>,
    pub run_requests: Vec<RunRequest>,
    /// Endpoint names in call order.
    pub sequence: Vec<&'static str>,
}

pub(crate) struct MockService {
    upload: Reply<String>,
    run: Reply<String>,
    // The last status is sticky once the script runs out.
    statuses: Mutex<VecDeque<Reply<JobStatus>>>,
    logs: Reply<String>,
    results: Reply<Vec<ResultItem>>,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Calls>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            upload: Reply::Ok("abc123".into()),
            run: Reply::Ok("job1".into()),
            statuses: Mutex::new(VecDeque::from([Reply::Ok(running(40))])),
            logs: Reply::Ok(String::new()),
            results: Reply::Ok(Vec::new()),
            gate: None,
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn with_upload(mut self, reply: Reply<String>) -> Self {
        self.upload = reply;
        self
    }

    pub fn with_run(mut self, reply: Reply<String>) -> Self {
        self.run = reply;
        self
    }

    pub fn with_statuses(self, script: Vec<Reply<JobStatus>>) -> Self {
        *self.statuses.lock() = script.into();
        self
    }

    pub fn with_logs(mut self, reply: Reply<String>) -> Self {
        self.logs = reply;
        self
    }

    pub fn with_results(mut self, reply: Reply<Vec<ResultItem>>) -> Self {
        self.results = reply;
        self
    }

    /// Makes upload and run wait for a notification before answering.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().clone()
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }

    fn next_status(&self) -> Reply<JobStatus> {
        let mut script = self.statuses.lock();
        if script.len() > 1 {
            script.pop_front().unwrap_or(Reply::Rejected(500, "empty script"))
        } else {
            script
                .front()
                .cloned()
                .unwrap_or(Reply::Rejected(500, "empty script"))
        }
    }
}

impl RemoteService for MockService {
    async fn upload(&self, parts: Vec<UploadPart>) -> Result<UploadResponse, ApiError> {
        {
            let mut calls = self.calls.lock();
            calls.upload += 1;
            calls.sequence.push("upload");
            calls.uploaded_filenames = parts.iter().map(|p| p.filename.to_string()).collect();
        }
        self.wait_gate().await;
        self.upload.clone().into_result().map(|session_id| UploadResponse {
            session_id,
            files: parts.iter().map(|p| p.filename.to_string()).collect(),
            total_bytes: parts.iter().map(|p| p.data.len() as u64).sum(),
        })
    }

    async fn run(&self, request: &RunRequest) -> Result<RunResponse, ApiError> {
        {
            let mut calls = self.calls.lock();
            calls.run += 1;
            calls.sequence.push("run");
            calls.run_requests.push(request.clone());
        }
        self.wait_gate().await;
        self.run
            .clone()
            .into_result()
            .map(|job_id| RunResponse { job_id })
    }

    async fn status(&self, _job_id: &JobId) -> Result<JobStatus, ApiError> {
        {
            let mut calls = self.calls.lock();
            calls.status += 1;
            calls.sequence.push("status");
        }
        self.next_status().into_result()
    }

    async fn logs(&self, _job_id: &JobId) -> Result<String, ApiError> {
        {
            let mut calls = self.calls.lock();
            calls.logs += 1;
            calls.sequence.push("logs");
        }
        self.logs.clone().into_result()
    }

    async fn results(&self, _job_id: &JobId) -> Result<Vec<ResultItem>, ApiError> {
        {
            let mut calls = self.calls.lock();
            calls.results += 1;
            calls.sequence.push("results");
        }
        self.results.clone().into_result()
    }
}

pub(crate) fn running(progress: u8) -> JobStatus {
    JobStatus::new(JobState::Running, progress, "In esecuzione")
}

pub(crate) fn succeeded() -> JobStatus {
    JobStatus::new(JobState::Succeeded, 100, "Completato")
}

pub(crate) fn failed(progress: u8, message: &str) -> JobStatus {
    JobStatus::new(JobState::Failed, progress, message)
}

pub(crate) fn out_xlsx() -> ResultItem {
    ResultItem {
        filename: "out.xlsx".into(),
        size_bytes: 2_097_152,
        download_url: "/download/job1/out.xlsx".into(),
    }
}
