//! Interface de linha de comando do Guia.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Guia - rastreamento de posição e detecção de mudanças de endereço.
#[derive(Parser, Debug)]
#[command(name = "guia")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "guia.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inicializa configuração no diretório atual.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Reproduz um trajeto gravado (JSON) pelo pipeline completo.
    Replay {
        /// Arquivo do trajeto.
        file: PathBuf,

        /// Imprime o resumo em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Distância de haversine entre dois pontos, em metros.
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lon1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lon2: f64,
    },

    /// Mostra versão.
    Version,
}
