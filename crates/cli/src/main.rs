use crate::{
    commands::Commands,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_runtime::execution::{executor, factory::PgConnectionProvider};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "dbmirror",
    version,
    about = "Full-refresh replication of a Postgres schema into another database"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match execute(cli.command, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(err) if err.is_cancelled() || shutdown.is_shutdown_requested() => {
            warn!("Stopped by shutdown request: {}", err);
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

/// Logs go to stderr; stdout carries only the JSON a command emits.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(command: Commands, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    match command {
        Commands::Replicate { config, report } => {
            let config = config.load()?;
            info!(
                "Replicating schema '{}' from {} to {}",
                config.settings.schema, config.source, config.destination
            );
            let provider = PgConnectionProvider::new(config);
            match executor::run(&provider, shutdown.cancel_token()).await {
                Ok(run_report) => output::emit_report(&run_report, report.as_deref()).await,
                Err(err) => {
                    output::emit_report(&err.report, report.as_deref()).await?;
                    Err(err.into())
                }
            }
        }
        Commands::TestConn { config } => {
            let provider = PgConnectionProvider::new(config.load()?);
            conn::ping_endpoints(&provider).await
        }
        Commands::Inspect { config, output } => {
            let provider = PgConnectionProvider::new(config.load()?);
            let inspection = output::inspect(&provider).await?;
            output::emit(&inspection, output.as_deref()).await
        }
    }
}
