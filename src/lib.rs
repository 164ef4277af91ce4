//! Client orchestrator for the Excel Runner batch service.
//!
//! The pipeline is strictly one-way: six named workbooks are uploaded as a
//! session, a header is committed, a job is launched on the session and
//! polled until it succeeds or fails, and on success its artifact manifest
//! is collected once. [`Workflow`] ties the stages together; the remote
//! service sits behind [`RemoteService`] so every stage can be driven by a
//! test double.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod guard;
pub mod inputs;
pub mod launcher;
pub mod monitor;
pub mod options;
pub mod results;
pub mod session;
pub mod ui;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, Endpoints, JobId, RemoteService, SessionId};
pub use config::RunnerConfig;
pub use error::{Precondition, RunnerError, ValidationError};
pub use inputs::{InputFile, InputSet, Slot};
pub use monitor::{JobMonitor, MonitorState};
pub use options::OptionSet;
pub use results::ResultSet;
pub use workflow::{Snapshot, Workflow};
