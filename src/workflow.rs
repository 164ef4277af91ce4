//! The session/job lifecycle: Input Set → session → committed options →
//! job → monitor → results.
//!
//! [`Workflow`] owns one instance of each stage. All operations take `&self`:
//! state lives behind a short synchronous lock that is never held across a
//! remote call, so an upload, a launch and the watch loop can be in flight on
//! the same task while [`reset`](Workflow::reset) stays callable. Upload and
//! launch are single-flight; a second concurrent call is a no-op that
//! returns `Ok(None)`. An upload and a launch never overlap: whichever
//! starts second is rejected with a [`Precondition`].

use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{JobId, JobStatus, RemoteService, SessionId};
use crate::config::RunnerConfig;
use crate::error::{Precondition, RunnerError, ValidationError};
use crate::guard::InFlight;
use crate::inputs::{InputFile, InputSet, Slot};
use crate::launcher::JobLauncher;
use crate::monitor::{JobMonitor, MonitorState, Transition, drive};
use crate::options::OptionSet;
use crate::results::ResultSet;
use crate::session::SessionClient;

#[derive(Debug, Default)]
struct Stages {
    inputs: InputSet,
    options: OptionSet,
    session: Option<SessionId>,
    monitor: JobMonitor,
    cancel: Option<CancellationToken>,
    // Bumped by reset and by every new session. Completions that started
    // under an older generation are discarded.
    generation: u64,
}

impl Stages {
    fn teardown_job(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.monitor.reset();
    }
}

/// Copy of every tracked field, for display and assertions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub filled_slots: usize,
    pub session: Option<SessionId>,
    pub committed_header: Option<String>,
    pub job_id: Option<JobId>,
    pub state: MonitorState,
    pub status: Option<JobStatus>,
    pub log_text: String,
    pub results: Option<ResultSet>,
}

pub struct Workflow<S> {
    service: S,
    poll_interval: Duration,
    sessions: SessionClient,
    launcher: JobLauncher,
    watching: InFlight,
    stages: Mutex<Stages>,
}

impl<S: RemoteService> Workflow<S> {
    pub fn new(service: S, options: OptionSet, poll_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
            sessions: SessionClient::new(),
            launcher: JobLauncher::new(),
            watching: InFlight::new(),
            stages: Mutex::new(Stages {
                options,
                ..Stages::default()
            }),
        }
    }

    pub fn from_config(service: S, config: &RunnerConfig) -> Self {
        Self::new(
            service,
            OptionSet::new(config.locale.clone(), config.check_schema),
            config.poll_interval(),
        )
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn set_slot(&self, slot: Slot, file: Option<InputFile>) {
        self.stages.lock().inputs.set_slot(slot, file);
    }

    pub fn clear_slot(&self, slot: Slot) {
        self.set_slot(slot, None);
    }

    pub fn is_complete(&self) -> bool {
        self.stages.lock().inputs.is_complete()
    }

    /// Uploads the Input Set and makes the returned session current.
    ///
    /// The previous session and any tracked job are dropped before anything
    /// is sent, so a failed upload never leaves a session pointing at older
    /// inputs. The Input Set and header draft are kept for a retry.
    ///
    /// Fails with [`Precondition::LaunchInFlight`] while a launch is
    /// outstanding.
    pub async fn upload(&self) -> Result<Option<SessionId>, RunnerError> {
        if self.launcher.is_launching() {
            return Err(Precondition::LaunchInFlight.into());
        }
        if self.sessions.is_uploading() {
            debug!("upload already in flight, ignoring");
            return Ok(None);
        }

        let (inputs, generation) = {
            let mut stages = self.stages.lock();
            stages.teardown_job();
            stages.session = None;
            (stages.inputs.clone(), stages.generation)
        };

        let Some(session) = self.sessions.upload(&self.service, &inputs).await? else {
            return Ok(None);
        };

        let mut stages = self.stages.lock();
        if stages.generation != generation {
            debug!(%session, "workflow reset during upload, discarding session");
            return Ok(None);
        }
        stages.session = Some(session.clone());
        stages.generation += 1;
        Ok(Some(session))
    }

    pub fn draft_header(&self, text: impl Into<String>) {
        self.stages.lock().options.draft_header(text);
    }

    /// Confirms the current header draft. Only meaningful once a session
    /// exists.
    pub fn commit_header(&self) -> Result<String, RunnerError> {
        let mut stages = self.stages.lock();
        if stages.session.is_none() {
            return Err(ValidationError::NoSession.into());
        }
        Ok(stages.options.commit_header()?.to_string())
    }

    pub fn set_locale(&self, locale: impl Into<String>) {
        self.stages.lock().options.locale = locale.into();
    }

    pub fn set_check_schema(&self, check_schema: bool) {
        self.stages.lock().options.check_schema = check_schema;
    }

    /// Starts a job for the current session and committed header and moves
    /// the monitor to `Polling`.
    ///
    /// Nothing polls the job until [`watch`](Self::watch) runs;
    /// [`launch_and_watch`](Self::launch_and_watch) does both. Fails with
    /// [`Precondition::UploadInFlight`] while an upload is outstanding.
    pub async fn launch(&self) -> Result<Option<JobId>, RunnerError> {
        if self.sessions.is_uploading() {
            return Err(Precondition::UploadInFlight.into());
        }
        let (session, options, generation) = {
            let stages = self.stages.lock();
            if stages.monitor.job_id().is_some() {
                return Err(Precondition::JobAlreadyTracked.into());
            }
            (
                stages.session.clone(),
                stages.options.clone(),
                stages.generation,
            )
        };

        let Some(job_id) = self
            .launcher
            .launch(&self.service, session.as_ref(), &options)
            .await?
        else {
            return Ok(None);
        };

        let mut stages = self.stages.lock();
        if stages.generation != generation {
            warn!(%job_id, "workflow changed during launch, job will not be tracked");
            return Ok(None);
        }
        stages.monitor.start(job_id.clone())?;
        stages.cancel = Some(CancellationToken::new());
        Ok(Some(job_id))
    }

    /// Launches a job and polls it at once, returning its final state.
    /// `Ok(None)` when another launch was already in flight.
    pub async fn launch_and_watch<F>(&self, observe: F) -> Result<Option<MonitorState>, RunnerError>
    where
        F: FnMut(&JobMonitor),
    {
        if self.launch().await?.is_none() {
            return Ok(None);
        }
        self.watch(observe).await.map(Some)
    }

    /// Polls the tracked job until it is terminal or the workflow is reset.
    /// The first cycle runs immediately; `observe` sees the monitor after
    /// every applied cycle.
    ///
    /// A second concurrent `watch` returns at once with the current state,
    /// so a job never has two poll loops.
    pub async fn watch<F>(&self, mut observe: F) -> Result<MonitorState, RunnerError>
    where
        F: FnMut(&JobMonitor),
    {
        let Some(_flight) = self.watching.try_begin() else {
            debug!("already watching");
            return Ok(self.stages.lock().monitor.state());
        };

        let (job_id, cancel) = {
            let stages = self.stages.lock();
            match (stages.monitor.job_id(), &stages.cancel) {
                (Some(id), Some(token)) if stages.monitor.state() == MonitorState::Polling => {
                    (id.clone(), token.clone())
                }
                (Some(_), _) => return Ok(stages.monitor.state()),
                (None, _) => return Err(Precondition::Job.into()),
            }
        };

        drive(&self.service, &job_id, self.poll_interval, &cancel, |cycle| {
            let (transition, monitor) = {
                let mut stages = self.stages.lock();
                let transition = stages.monitor.apply(&job_id, cycle);
                (transition, stages.monitor.clone())
            };
            if transition != Transition::Ignored {
                observe(&monitor);
            }
            transition
        })
        .await;

        Ok(self.stages.lock().monitor.state())
    }

    /// Tears every stage down: cancels polling and clears job, status, log,
    /// results, session, committed header and the Input Set. The header
    /// draft is kept. Safe to call at any time, any number of times.
    pub fn reset(&self) {
        let mut stages = self.stages.lock();
        stages.teardown_job();
        stages.inputs.clear();
        stages.session = None;
        stages.options.uncommit_header();
        stages.generation += 1;
        info!("workflow reset");
    }

    pub fn header_draft(&self) -> String {
        self.stages.lock().options.header_draft().to_string()
    }

    pub fn snapshot(&self) -> Snapshot {
        let stages = self.stages.lock();
        Snapshot {
            filled_slots: stages.inputs.filled(),
            session: stages.session.clone(),
            committed_header: stages.options.committed_header().map(str::to_string),
            job_id: stages.monitor.job_id().cloned(),
            state: stages.monitor.state(),
            status: stages.monitor.status().cloned(),
            log_text: stages.monitor.log_text().to_string(),
            results: stages.monitor.results().cloned(),
        }
    }

    /// The current monitor, cloned.
    pub fn monitor(&self) -> JobMonitor {
        self.stages.lock().monitor.clone()
    }
}
