use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rosterd::api;
use rosterd::config::EngineConfig;
use rosterd::engine::{Collaborators, ShiftEngine};
use rosterd::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "rosterd")]
#[command(version)]
#[command(about = "Shift coordination engine: assignment, attendance, no-show detection")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the rosterd API server
    Serve(ServeArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Minutes after shift start before a check-in counts as late
    #[arg(long, default_value = "15")]
    late_grace_mins: u64,

    /// Minutes after shift start before a no-show shift is marked missed
    #[arg(long, default_value = "60")]
    missed_after_mins: u64,

    /// Seconds between missed-shift sweeper passes
    #[arg(long, default_value = "3600")]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Serve(serve_args) => run_server(serve_args).await,
    }
}

async fn run_server(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::default()
        .with_late_grace_mins(args.late_grace_mins)
        .with_missed_after_mins(args.missed_after_mins)
        .with_sweep_interval_secs(args.sweep_interval_secs);

    let engine = Arc::new(ShiftEngine::new(config, Collaborators::default()));
    let token = install_shutdown_handler();
    let sweeper_handle = engine.spawn_sweeper(token.clone());

    tracing::info!(addr = %args.listen, "rosterd starting");
    api::serve(args.listen, engine, token.clone()).await?;

    token.cancel();
    let _ = sweeper_handle.await;
    tracing::info!("rosterd stopped");
    Ok(())
}
