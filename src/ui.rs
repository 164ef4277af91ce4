//! Interface de terminal do excel-runner: barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso e `console` para
//! estilização com cores. O [`JobProgress`] acompanha visualmente
//! a execução de um job no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{Endpoints, JobId};
use crate::monitor::{JobMonitor, MonitorState};
use crate::results::{ResultSet, format_megabytes};

/// Indicador visual de progresso para um job monitorado.
pub struct JobProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    dim: Style,
}

impl JobProgress {
    pub fn start(job_id: &JobId) -> Self {
        let pb = ProgressBar::new(100);
        // Template inválido: usa a barra padrão.
        let style = ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .map(|s| s.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(format!("job {job_id} queued"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Atualiza a barra com o progresso e a mensagem de status do monitor.
    pub fn update(&self, monitor: &JobMonitor) {
        self.pb.set_position(u64::from(monitor.progress()));
        let message = monitor.message();
        if !message.is_empty() {
            self.pb.set_message(message.to_string());
        }
    }

    /// Finaliza a barra e exibe o resultado final do job.
    ///
    /// Sucesso é mostrado em verde seguido da tabela de resultados; falha em
    /// vermelho com a mensagem de status e o log limpo.
    pub fn complete(&self, monitor: &JobMonitor, endpoints: &Endpoints) {
        self.pb.finish_and_clear();
        match monitor.state() {
            MonitorState::Succeeded => {
                println!("  {} Job completed", self.green.apply_to("✓"));
                if let (Some(job_id), Some(results)) = (monitor.job_id(), monitor.results()) {
                    println!();
                    for line in results_table(results, endpoints, job_id) {
                        println!("  {line}");
                    }
                }
            }
            MonitorState::Failed => {
                println!(
                    "  {} Job failed: {}",
                    self.red.apply_to("✗"),
                    monitor.message()
                );
                let log = monitor.cleaned_log();
                if !log.trim().is_empty() {
                    println!();
                    for line in log.lines() {
                        println!("  {}", self.dim.apply_to(line));
                    }
                }
            }
            MonitorState::Idle | MonitorState::Polling => {
                println!("  {} Monitoring stopped", self.dim.apply_to("-"));
            }
        }
    }
}

/// Linhas da tabela de resultados: uma por artefato, com tamanho em
/// megabytes e link absoluto, seguidas do link do arquivo completo.
pub fn results_table(results: &ResultSet, endpoints: &Endpoints, job_id: &JobId) -> Vec<String> {
    if results.is_empty() {
        return vec!["No files produced".to_string()];
    }

    let width = results
        .items()
        .iter()
        .map(|item| item.filename.len())
        .max()
        .unwrap_or(0);

    let mut lines: Vec<String> = results
        .items()
        .iter()
        .map(|item| {
            format!(
                "{:<width$}  {:>8} MB  {}",
                item.filename,
                format_megabytes(item.size_bytes),
                endpoints.artifact(item),
            )
        })
        .collect();
    lines.push(format!("All files: {}", endpoints.download_all(job_id)));
    lines
}
