//! Interface de linha de comando do excel-runner baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, watch, examples)
//! e flags globais (--api-base, --config, --verbose).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::API_BASE_ENV;
use crate::inputs::Slot;

/// Excel Runner: envia as seis planilhas do horário, executa o job e
/// coleta os resultados.
#[derive(Debug, Parser)]
#[command(name = "excel-runner", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Endereço base do serviço. Tem precedência sobre o arquivo de configuração.
    #[arg(long, global = true, env = API_BASE_ENV)]
    pub api_base: Option<String>,

    /// Caminho para um arquivo de configuração TOML (padrão: ./excel-runner.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Envia as planilhas, inicia um job e acompanha até o fim.
    Run(RunArgs),

    /// Acompanha um job já iniciado.
    Watch {
        /// Identificador retornado quando o job foi iniciado.
        job_id: String,
    },

    /// Baixa a planilha de exemplo de cada entrada.
    Examples {
        /// Diretório onde salvar os arquivos.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long)]
    pub centrale: PathBuf,

    #[arg(long)]
    pub succursale: PathBuf,

    #[arg(long)]
    pub tabella_aule: PathBuf,

    #[arg(long)]
    pub tabella_classi: PathBuf,

    #[arg(long)]
    pub tabella_materie: PathBuf,

    #[arg(long)]
    pub tabella_sostegno: PathBuf,

    /// Cabeçalho impresso nos documentos gerados (obrigatório).
    #[arg(long)]
    pub header: String,

    /// Locale da execução; usa o configurado quando omitido.
    #[arg(long)]
    pub locale: Option<String>,

    /// Pede ao serviço que valide o esquema das planilhas.
    #[arg(long, default_value_t = false)]
    pub check_schema: bool,

    /// Salva all.zip neste diretório quando o job termina com sucesso.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// O caminho informado para cada slot, na ordem dos slots.
    pub fn inputs(&self) -> [(Slot, &PathBuf); 6] {
        [
            (Slot::Centrale, &self.centrale),
            (Slot::Succursale, &self.succursale),
            (Slot::TabellaAule, &self.tabella_aule),
            (Slot::TabellaClassi, &self.tabella_classi),
            (Slot::TabellaMaterie, &self.tabella_materie),
            (Slot::TabellaSostegno, &self.tabella_sostegno),
        ]
    }
}
