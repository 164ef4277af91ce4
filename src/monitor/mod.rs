//! Job Monitor: polls a launched job until it reaches a terminal state.
//!
//! Fetching and applying are split: [`fetch_cycle`] performs the remote
//! calls of one cycle (status, then logs, then results on success) without
//! touching any state, and [`JobMonitor::apply`] folds the outcome into the
//! monitor synchronously. [`drive`] runs the loop with a fixed pause after
//! each cycle and stops on a terminal state or when its cancellation token
//! fires.

mod logs;
mod state;

pub use logs::clean_log;
pub use state::{MonitorState, Observation, Transition};

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{JobId, JobState, JobStatus, RemoteService, ResultItem};
use crate::error::{Precondition, RunnerError};
use crate::results::ResultSet;

/// Pause between the end of one cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

/// Outcome of the remote calls of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollCycle {
    /// The status fetch failed. Nothing else was fetched.
    Skipped,
    Observed {
        status: JobStatus,
        /// `None` when the log fetch failed; the previous text is kept.
        log_text: Option<String>,
        /// Fetched only for a succeeded status. `None` when not fetched or
        /// the fetch failed.
        results: Option<Vec<ResultItem>>,
    },
}

impl PollCycle {
    pub fn observation(&self) -> Observation {
        match self {
            PollCycle::Skipped => Observation::Skipped,
            PollCycle::Observed { status, .. } => Observation::Status(status.state),
        }
    }
}

/// Performs one cycle: status, then logs, then (on success only) results.
///
/// A failed status fetch skips the cycle; it is logged, never escalated.
pub async fn fetch_cycle<S: RemoteService>(service: &S, job_id: &JobId) -> PollCycle {
    let status = match service.status(job_id).await {
        Ok(status) => status,
        Err(e) => {
            warn!(%job_id, error = %e, "status poll failed, skipping cycle");
            return PollCycle::Skipped;
        }
    };

    let log_text = match service.logs(job_id).await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(%job_id, error = %e, "log fetch failed, keeping previous log");
            None
        }
    };

    let results = if status.state == JobState::Succeeded {
        match service.results(job_id).await {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(%job_id, error = %e, "result manifest fetch failed");
                None
            }
        }
    } else {
        None
    };

    PollCycle::Observed {
        status,
        log_text,
        results,
    }
}

/// Polls until `apply` reports anything other than [`Transition::Stay`] or
/// `cancel` fires. The first cycle starts immediately.
///
/// Returns the last transition, or `None` when cancelled.
pub async fn drive<S, F>(
    service: &S,
    job_id: &JobId,
    interval: Duration,
    cancel: &CancellationToken,
    mut apply: F,
) -> Option<Transition>
where
    S: RemoteService,
    F: FnMut(PollCycle) -> Transition,
{
    loop {
        let cycle = tokio::select! {
            _ = cancel.cancelled() => return None,
            cycle = fetch_cycle(service, job_id) => cycle,
        };

        let transition = apply(cycle);
        if !transition.keeps_polling() {
            debug!(%job_id, ?transition, "polling stopped");
            return Some(transition);
        }

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Monitor state for at most one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobMonitor {
    job_id: Option<JobId>,
    state: MonitorState,
    status: Option<JobStatus>,
    log_text: String,
    results: Option<ResultSet>,
}

impl JobMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Idle → Polling` for `job_id`. Starting the job already being polled
    /// is a no-op; any other tracked job is an error.
    pub fn start(&mut self, job_id: JobId) -> Result<(), RunnerError> {
        match &self.job_id {
            None => {
                info!(%job_id, "monitoring job");
                self.job_id = Some(job_id);
                self.state = MonitorState::Polling;
                Ok(())
            }
            Some(current) if *current == job_id && self.state == MonitorState::Polling => Ok(()),
            Some(_) => Err(Precondition::JobAlreadyTracked.into()),
        }
    }

    /// Folds one cycle into the monitor.
    ///
    /// Cycles for another job id are ignored, as is anything after a
    /// terminal state; results are stored only on the transition into
    /// `Succeeded`, so they can never be duplicated.
    pub fn apply(&mut self, job_id: &JobId, cycle: PollCycle) -> Transition {
        if self.job_id.as_ref() != Some(job_id) {
            return Transition::Ignored;
        }
        let transition = self.state.advance(cycle.observation());
        if transition == Transition::Ignored {
            return transition;
        }

        if let PollCycle::Observed {
            status,
            log_text,
            results,
        } = cycle
        {
            debug!(%job_id, state = %status.state, progress = status.progress, "status");
            self.status = Some(status);
            if let Some(text) = log_text {
                self.log_text = text;
            }
            if transition == Transition::Enter(MonitorState::Succeeded) && self.results.is_none() {
                let set = ResultSet::new(results.unwrap_or_default());
                info!(%job_id, artifacts = set.len(), "job succeeded");
                self.results = Some(set);
            }
        }

        if let Transition::Enter(next) = transition {
            if next == MonitorState::Failed {
                info!(%job_id, message = self.message(), "job failed");
            }
            self.state = next;
        }
        transition
    }

    /// Back to `Idle`, dropping everything about the job.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Polls `job_id` to a terminal state with a monitor of its own, calling
    /// `observe` after every applied cycle.
    pub async fn watch<S, F>(
        service: &S,
        job_id: JobId,
        interval: Duration,
        cancel: &CancellationToken,
        mut observe: F,
    ) -> Result<JobMonitor, RunnerError>
    where
        S: RemoteService,
        F: FnMut(&JobMonitor),
    {
        let mut monitor = JobMonitor::new();
        monitor.start(job_id.clone())?;
        drive(service, &job_id, interval, cancel, |cycle| {
            let transition = monitor.apply(&job_id, cycle);
            observe(&monitor);
            transition
        })
        .await;
        Ok(monitor)
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn status(&self) -> Option<&JobStatus> {
        self.status.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.status.as_ref().map_or(0, |s| s.progress)
    }

    pub fn message(&self) -> &str {
        self.status.as_ref().map_or("", |s| s.message.as_str())
    }

    pub fn log_text(&self) -> &str {
        &self.log_text
    }

    /// Log text without the banner and inputs-summary lines.
    pub fn cleaned_log(&self) -> String {
        clean_log(&self.log_text)
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockService, Reply, failed, out_xlsx, running, succeeded};

    fn job1() -> JobId {
        JobId::new("job1")
    }

    fn observed(status: JobStatus, log: &str, results: Option<Vec<ResultItem>>) -> PollCycle {
        PollCycle::Observed {
            status,
            log_text: Some(log.to_string()),
            results,
        }
    }

    #[test]
    fn start_moves_idle_to_polling() {
        let mut m = JobMonitor::new();
        assert_eq!(m.state(), MonitorState::Idle);
        m.start(job1()).unwrap();
        assert_eq!(m.state(), MonitorState::Polling);
        assert_eq!(m.job_id(), Some(&job1()));
    }

    #[test]
    fn restarting_same_job_is_a_no_op() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        m.apply(&job1(), observed(running(40), "step 1", None));
        m.start(job1()).unwrap();
        assert_eq!(m.progress(), 40);
        assert_eq!(m.log_text(), "step 1");
    }

    #[test]
    fn second_job_is_rejected() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        let err = m.start(JobId::new("job2")).unwrap_err();
        assert!(matches!(
            err,
            RunnerError::Precondition(Precondition::JobAlreadyTracked)
        ));
    }

    #[test]
    fn running_updates_status_and_log() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        let t = m.apply(&job1(), observed(running(40), "working", None));
        assert_eq!(t, Transition::Stay);
        assert_eq!(m.progress(), 40);
        assert_eq!(m.message(), "In esecuzione");
        assert_eq!(m.log_text(), "working");
        assert!(m.results().is_none());
    }

    #[test]
    fn succeeded_stores_results_once() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        let t = m.apply(&job1(), observed(succeeded(), "done", Some(vec![out_xlsx()])));
        assert_eq!(t, Transition::Enter(MonitorState::Succeeded));
        assert_eq!(m.results().unwrap().len(), 1);

        // A second succeeded poll, if one ever happened, changes nothing.
        let t = m.apply(
            &job1(),
            observed(succeeded(), "again", Some(vec![out_xlsx(), out_xlsx()])),
        );
        assert_eq!(t, Transition::Ignored);
        assert_eq!(m.results().unwrap().len(), 1);
        assert_eq!(m.log_text(), "done");
    }

    #[test]
    fn failed_results_fetch_yields_empty_set() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        m.apply(&job1(), observed(succeeded(), "", None));
        assert_eq!(m.state(), MonitorState::Succeeded);
        assert!(m.results().unwrap().is_empty());
    }

    #[test]
    fn failed_keeps_message_and_log() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        let t = m.apply(
            &job1(),
            observed(failed(60, "parse error"), "=== Job job1\nboom\n", None),
        );
        assert_eq!(t, Transition::Enter(MonitorState::Failed));
        assert_eq!(m.message(), "parse error");
        assert_eq!(m.progress(), 60);
        assert_eq!(m.cleaned_log(), "boom\n");
        assert!(m.results().is_none());
    }

    #[test]
    fn skipped_cycle_changes_nothing() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        m.apply(&job1(), observed(running(40), "a", None));
        let t = m.apply(&job1(), PollCycle::Skipped);
        assert_eq!(t, Transition::Stay);
        assert_eq!(m.progress(), 40);
        assert_eq!(m.log_text(), "a");
    }

    #[test]
    fn missing_log_keeps_previous_text() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        m.apply(&job1(), observed(running(10), "first", None));
        m.apply(
            &job1(),
            PollCycle::Observed {
                status: running(20),
                log_text: None,
                results: None,
            },
        );
        assert_eq!(m.progress(), 20);
        assert_eq!(m.log_text(), "first");
    }

    #[test]
    fn cycles_for_other_jobs_are_ignored() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        let t = m.apply(&JobId::new("stale"), observed(succeeded(), "", Some(vec![out_xlsx()])));
        assert_eq!(t, Transition::Ignored);
        assert_eq!(m.state(), MonitorState::Polling);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut m = JobMonitor::new();
        m.start(job1()).unwrap();
        m.apply(&job1(), observed(succeeded(), "x", Some(vec![out_xlsx()])));
        m.reset();
        assert_eq!(m, JobMonitor::default());
    }

    #[tokio::test]
    async fn fetch_cycle_orders_calls() {
        let service = MockService::new()
            .with_statuses(vec![Reply::Ok(succeeded())])
            .with_results(Reply::Ok(vec![out_xlsx()]));
        let cycle = fetch_cycle(&service, &job1()).await;
        assert_eq!(cycle.observation(), Observation::Status(JobState::Succeeded));
        assert_eq!(service.calls().sequence, vec!["status", "logs", "results"]);
    }

    #[tokio::test]
    async fn fetch_cycle_never_fetches_results_before_success() {
        let service = MockService::new().with_statuses(vec![Reply::Ok(running(40))]);
        fetch_cycle(&service, &job1()).await;
        assert_eq!(service.calls().sequence, vec!["status", "logs"]);
    }

    #[tokio::test]
    async fn fetch_cycle_skips_on_status_failure() {
        let service = MockService::new().with_statuses(vec![Reply::Rejected(502, "bad gateway")]);
        let cycle = fetch_cycle(&service, &job1()).await;
        assert_eq!(cycle, PollCycle::Skipped);
        assert_eq!(service.calls().sequence, vec!["status"]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately_then_at_interval() {
        let service = MockService::new().with_statuses(vec![
            Reply::Ok(running(10)),
            Reply::Ok(running(50)),
            Reply::Ok(succeeded()),
        ]);
        let cancel = CancellationToken::new();
        let started = tokio::time::Instant::now();
        let mut seen = Vec::new();

        let monitor = JobMonitor::watch(&service, job1(), DEFAULT_POLL_INTERVAL, &cancel, |m| {
            seen.push(((tokio::time::Instant::now() - started).as_millis(), m.progress()));
        })
        .await
        .unwrap();

        assert_eq!(monitor.state(), MonitorState::Succeeded);
        assert_eq!(
            seen,
            vec![(0, 10), (2500, 50), (5000, 100)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_polls_after_terminal_state() {
        let service = MockService::new().with_statuses(vec![
            Reply::Ok(running(40)),
            Reply::Ok(failed(60, "parse error")),
        ]);
        let cancel = CancellationToken::new();
        let monitor = JobMonitor::watch(&service, job1(), DEFAULT_POLL_INTERVAL, &cancel, |_| {})
            .await
            .unwrap();
        assert_eq!(monitor.state(), MonitorState::Failed);

        let before = service.calls();
        tokio::time::sleep(Duration::from_secs(30)).await;
        let after = service.calls();
        assert_eq!(before.status, 2);
        assert_eq!(after.status, 2);
        assert_eq!(after.logs, 2);
        assert_eq!(after.results, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_status_failure_is_skipped() {
        let service = MockService::new().with_statuses(vec![
            Reply::Rejected(503, "unavailable"),
            Reply::Garbled,
            Reply::Ok(succeeded()),
        ]);
        let cancel = CancellationToken::new();
        let monitor = JobMonitor::watch(&service, job1(), DEFAULT_POLL_INTERVAL, &cancel, |_| {})
            .await
            .unwrap();
        assert_eq!(monitor.state(), MonitorState::Succeeded);
        let calls = service.calls();
        assert_eq!(calls.status, 3);
        assert_eq!(calls.logs, 1);
        assert_eq!(calls.results, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop() {
        let service = MockService::new();
        let cancel = CancellationToken::new();
        let id = job1();

        let (outcome, ()) = tokio::join!(
            drive(&service, &id, DEFAULT_POLL_INTERVAL, &cancel, |_| Transition::Stay),
            async {
                tokio::time::sleep(Duration::from_millis(6000)).await;
                cancel.cancel();
                // Cancelling twice is harmless.
                cancel.cancel();
            }
        );

        assert_eq!(outcome, None);
        // Cycles at 0, 2.5s and 5s; the one due at 7.5s never starts.
        assert_eq!(service.calls().status, 3);
    }
}
