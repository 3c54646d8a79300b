mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use openly_core::PollingCoordinator;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a cloud session
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "openly", &mut std::io::stdout());
            Ok(())
        }

        // Watch keeps the schedule running until interrupted
        Command::Watch(ref args) => {
            let setup = config::resolve_setup(&cli.global)?;
            commands::watch::handle(setup, args, &cli.global).await
        }

        // Everything else is one refresh, one command, shut down
        cmd => {
            let mut setup = config::resolve_setup(&cli.global)?;
            setup.config.poll_interval = Duration::ZERO;

            let coordinator = PollingCoordinator::connect(&setup.credentials, setup.config)
                .await
                .map_err(|e| CliError::from(e).with_profile(&setup.profile_name))?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &coordinator, &cli.global).await;
            coordinator.shutdown().await;
            result.map_err(|e| e.with_profile(&setup.profile_name))
        }
    }
}
