//! Tic-tac-toe MQTT client.
//!
//! Shows the mode menu, then plays one game.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tictactoe_mqtt::{
    ClientConfig, ClientErrorKind, LineInput, StdinInput, TerminalScreen, choose_mode, run_game,
};
use tracing::{error, info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = initialize_tracing(&cli.log_file) {
        eprintln!("Logging disabled: {:#}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::from(1)
        }
    }
}

/// Runs the menu and one game, mapping failures to the message shown on exit.
#[instrument(skip_all)]
async fn run(cli: Cli) -> Result<(), String> {
    let config = ClientConfig::load_or_default(&cli.config).map_err(|e| e.to_string())?;

    let mut input: Box<dyn LineInput> = Box::new(StdinInput);
    let mut screen = TerminalScreen;
    let mode = choose_mode(input.as_mut(), &mut screen).map_err(|e| {
        error!(error = %e, "Menu failed");
        "Invalid choice. Exiting.".to_string()
    })?;

    match run_game(&config, mode, input, Box::new(screen)).await {
        Ok(outcome) => {
            info!(outcome = ?outcome, "Game finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Game failed");
            match e.kind() {
                ClientErrorKind::ConnectionFailure(_) => {
                    Err("Failed to connect to MQTT broker.".to_string())
                }
                _ => Err(format!("Error: {}", e.kind())),
            }
        }
    }
}

/// Sends logs to `path` so they do not interleave with the board.
fn initialize_tracing(path: &std::path::Path) -> Result<()> {
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(())
}
