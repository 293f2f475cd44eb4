mod banner;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use summio_config::{AppConfig, ConfigLoader};
use summio_db::{MigrationRunner, MigrationSet, open_connection};
use summio_gateway::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "summio", version, about = "Summarize PDFs with an LLM")]
struct Cli {
    /// Path to a config file (.yml, .yaml or .toml)
    #[arg(short, long, env = "SUMMIO_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations and start the HTTP server (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// List known migrations and when they were applied
    Migrations,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = ConfigLoader::new(cli.config.clone())
        .load()
        .context("failed to load configuration")?;

    init_tracing(&config, cli.json_logs);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => run_migrations(&config),
        Commands::Migrations => print_status(&config),
    }
}

fn init_tracing(config: &AppConfig, json: bool) {
    let default_level = if config.server.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    config
        .llm
        .require_api_key()
        .context("cannot start the server")?;

    banner::print_banner(&config);
    GatewayServer::new(config)
        .run()
        .await
        .context("gateway exited with an error")
}

fn run_migrations(config: &AppConfig) -> Result<()> {
    let conn = open_connection(&config.storage.db_path)?;
    let set = MigrationSet::embedded()?;
    let report = MigrationRunner::new(&conn, &set)
        .run()
        .context("migration failed")?;

    info!(
        "applied {} migration(s), {} already up to date",
        report.applied.len(),
        report.skipped.len()
    );
    for version in &report.applied {
        println!("applied {version}");
    }
    Ok(())
}

fn print_status(config: &AppConfig) -> Result<()> {
    let conn = open_connection(&config.storage.db_path)?;
    let set = MigrationSet::embedded()?;
    let status = MigrationRunner::new(&conn, &set).status()?;

    for entry in status {
        let applied = entry
            .applied_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "pending".to_string());
        println!("{:<6} {:<32} {applied}", entry.version, entry.name);
    }
    Ok(())
}
