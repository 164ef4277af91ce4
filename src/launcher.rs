//! Job Launcher: session + committed options → job id.

use tracing::{debug, info};

use crate::api::{JobId, RemoteService, RunRequest, SessionId};
use crate::error::{Precondition, RunnerError};
use crate::guard::InFlight;
use crate::options::OptionSet;

#[derive(Debug, Default)]
pub struct JobLauncher {
    in_flight: InFlight,
}

impl JobLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_launching(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Starts a job. Returns `Ok(None)` when another launch is outstanding,
    /// so rapid repeated calls create at most one job.
    ///
    /// The header sent is the committed one; a missing session or an
    /// uncommitted header fails before any request is made.
    pub async fn launch<S: RemoteService>(
        &self,
        service: &S,
        session: Option<&SessionId>,
        options: &OptionSet,
    ) -> Result<Option<JobId>, RunnerError> {
        let session_id = match session {
            Some(id) if !id.as_str().trim().is_empty() => id.clone(),
            _ => return Err(Precondition::Session.into()),
        };
        let Some(options) = options.payload() else {
            return Err(Precondition::CommittedHeader.into());
        };

        let Some(_flight) = self.in_flight.try_begin() else {
            debug!("launch already in flight, ignoring");
            return Ok(None);
        };

        let request = RunRequest {
            session_id,
            options,
        };
        let response = service
            .run(&request)
            .await
            .map_err(RunnerError::from_launch)?;

        if response.job_id.trim().is_empty() {
            return Err(RunnerError::Protocol(
                "run response has an empty job_id".into(),
            ));
        }
        info!(job_id = %response.job_id, session_id = %request.session_id, "job launched");
        Ok(Some(JobId::new(response.job_id)))
    }
}
