//! Configuração do excel-runner carregada a partir de `excel-runner.toml`.
//!
//! A struct [`RunnerConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `EXCEL_RUNNER_API_BASE` tem precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RunnerError;

pub const CONFIG_FILE: &str = "excel-runner.toml";
pub const API_BASE_ENV: &str = "EXCEL_RUNNER_API_BASE";

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Endereço base do serviço; todos os endpoints ficam abaixo dele.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Pausa entre duas consultas de status.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout da requisição inteira, incluindo o upload das planilhas.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Locale padrão enviado em cada execução.
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub check_schema: bool,
}

// O serviço escuta na porta 8080 por padrão.
fn default_api_base() -> String {
    "http://localhost:8080".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2500
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_locale() -> String {
    "it".to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            poll_interval_ms: default_poll_interval_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            locale: default_locale(),
            check_schema: false,
        }
    }
}

impl RunnerConfig {
    /// Carrega `excel-runner.toml` do diretório atual, ou os defaults se o
    /// arquivo não existir.
    pub fn load() -> Result<Self, RunnerError> {
        let path = Path::new(CONFIG_FILE);
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_override())
    }

    /// Carrega um arquivo de configuração explícito; arquivo ausente é erro.
    pub fn load_from(path: &Path) -> Result<Self, RunnerError> {
        Ok(Self::from_file(path)?.with_env_override())
    }

    fn from_file(path: &Path) -> Result<Self, RunnerError> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str::<RunnerConfig>(&contents)?;
        if config.poll_interval_ms == 0 {
            return Err(RunnerError::Config(format!(
                "{}: poll_interval_ms must be greater than zero",
                path.display()
            )));
        }
        Ok(config)
    }

    fn with_env_override(mut self) -> Self {
        if let Ok(base) = std::env::var(API_BASE_ENV)
            && !base.is_empty()
        {
            self.api_base = base;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
