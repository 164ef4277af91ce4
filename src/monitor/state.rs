use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::JobState;

/// The four states of the job monitor.
///
/// A job flows: IDLE → POLLING → SUCCEEDED | FAILED
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    #[default]
    Idle,
    Polling,
    Succeeded,
    Failed,
}

impl MonitorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MonitorState::Succeeded | MonitorState::Failed)
    }

    /// Compute the transition for one poll observation.
    ///
    /// - `Idle` and the terminal states ignore every observation.
    /// - In `Polling`, a skipped cycle or a queued/running status stays put;
    ///   a terminal status moves to the matching terminal state.
    pub fn advance(self, observation: Observation) -> Transition {
        match self {
            MonitorState::Idle | MonitorState::Succeeded | MonitorState::Failed => {
                Transition::Ignored
            }
            MonitorState::Polling => match observation {
                Observation::Skipped => Transition::Stay,
                Observation::Status(JobState::Queued | JobState::Running) => Transition::Stay,
                Observation::Status(JobState::Succeeded) => {
                    Transition::Enter(MonitorState::Succeeded)
                }
                Observation::Status(JobState::Failed) => Transition::Enter(MonitorState::Failed),
            },
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorState::Idle => write!(f, "IDLE"),
            MonitorState::Polling => write!(f, "POLLING"),
            MonitorState::Succeeded => write!(f, "SUCCEEDED"),
            MonitorState::Failed => write!(f, "FAILED"),
        }
    }
}

/// What one poll cycle saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The status fetch failed; the cycle is skipped.
    Skipped,
    Status(JobState),
}

/// The result of applying an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep polling.
    Stay,
    /// Move to a terminal state; polling stops.
    Enter(MonitorState),
    /// The observation does not apply (no job, job already terminal, or a
    /// poll for a job that is no longer tracked).
    Ignored,
}

impl Transition {
    pub fn keeps_polling(self) -> bool {
        matches!(self, Transition::Stay)
    }
}
