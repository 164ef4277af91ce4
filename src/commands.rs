//! Handlers behind each CLI subcommand.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{ApiClient, JobId};
use crate::cli::RunArgs;
use crate::config::RunnerConfig;
use crate::inputs::{InputFile, Slot};
use crate::monitor::{JobMonitor, MonitorState};
use crate::ui::JobProgress;
use crate::workflow::Workflow;

/// Exit code after Ctrl-C, as shells report SIGINT.
const INTERRUPTED: u8 = 130;

/// Full cycle: read the six inputs, upload, commit the header, launch and
/// follow the job. Ctrl-C resets the workflow.
pub async fn run(config: &RunnerConfig, args: &RunArgs) -> Result<ExitCode> {
    let client = ApiClient::from_config(config)?;
    let workflow = Workflow::from_config(client, config);
    if let Some(locale) = &args.locale {
        workflow.set_locale(locale.as_str());
    }
    if args.check_schema {
        workflow.set_check_schema(true);
    }
    for (slot, path) in args.inputs() {
        let file = InputFile::from_path(path)
            .with_context(|| format!("reading {} input {}", slot, path.display()))?;
        workflow.set_slot(slot, Some(file));
    }

    let monitor = tokio::select! {
        monitor = follow(&workflow, &args.header) => monitor?,
        _ = tokio::signal::ctrl_c() => {
            workflow.reset();
            warn!("interrupted, workflow reset");
            return Ok(ExitCode::from(INTERRUPTED));
        }
    };

    if monitor.state() != MonitorState::Succeeded {
        return Ok(ExitCode::FAILURE);
    }
    if let (Some(dir), Some(job_id)) = (&args.output, monitor.job_id()) {
        let endpoints = workflow.service().endpoints();
        let archive = workflow
            .service()
            .download(&endpoints.download_all(job_id))
            .await
            .context("downloading all.zip")?;
        let path = save(dir, "all.zip", &archive)?;
        println!("  Saved {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

async fn follow(workflow: &Workflow<ApiClient>, header: &str) -> Result<JobMonitor> {
    let Some(session) = workflow.upload().await? else {
        bail!("an upload is already in progress");
    };
    println!("  Inputs uploaded (session {session})");

    workflow.draft_header(header);
    workflow.commit_header()?;

    let Some(job_id) = workflow.launch().await? else {
        bail!("a launch is already in progress");
    };
    println!("  Job {job_id} started");

    let progress = JobProgress::start(&job_id);
    workflow.watch(|monitor| progress.update(monitor)).await?;
    let monitor = workflow.monitor();
    progress.complete(&monitor, workflow.service().endpoints());
    Ok(monitor)
}

/// Follows an existing job until it is terminal. Ctrl-C stops polling.
pub async fn watch(config: &RunnerConfig, job_id: &str) -> Result<ExitCode> {
    let client = ApiClient::from_config(config)?;
    let job_id = JobId::new(job_id.trim());
    if job_id.as_str().is_empty() {
        bail!("job id must not be empty");
    }

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let progress = JobProgress::start(&job_id);
    let monitor = JobMonitor::watch(&client, job_id, config.poll_interval(), &cancel, |m| {
        progress.update(m)
    })
    .await?;
    progress.complete(&monitor, client.endpoints());

    Ok(match monitor.state() {
        MonitorState::Succeeded => ExitCode::SUCCESS,
        MonitorState::Failed => ExitCode::FAILURE,
        MonitorState::Idle | MonitorState::Polling => ExitCode::from(INTERRUPTED),
    })
}

/// Downloads the reference workbook of every slot into `output`.
pub async fn examples(config: &RunnerConfig, output: &Path) -> Result<ExitCode> {
    let client = ApiClient::from_config(config)?;
    for slot in Slot::ALL {
        let bytes = client
            .fetch_example(slot)
            .await
            .with_context(|| format!("downloading example for {slot}"))?;
        let path = save(output, slot.standard_filename(), &bytes)?;
        info!(%slot, bytes = bytes.len(), "example saved");
        println!("  Saved {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn save(dir: &Path, filename: &str, bytes: &[u8]) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(filename);
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
