use clap::Parser;
use guia::cli::{Cli, Commands};
use guia::types::config::Config;
use guia::GuiaResult;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> GuiaResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default_config()
    };

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("guia={}", log_level)
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            guia::cli::commands::init(path).await?;
        }
        Commands::Replay { file, json } => {
            guia::cli::commands::replay(&file, json, &config).await?;
        }
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => {
            guia::cli::commands::distance(lat1, lon1, lat2, lon2);
        }
        Commands::Version => {
            guia::cli::commands::version();
        }
    }

    Ok(())
}
