//! Command-line interface for tictactoe_mqtt.

use clap::Parser;

/// Terminal tic-tac-toe client for a remote MQTT board
#[derive(Parser, Debug)]
#[command(name = "tictactoe_mqtt")]
#[command(about = "Play tic-tac-toe against a remote board over MQTT", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Optional TOML config file; defaults apply when it does not exist
    #[arg(short, long, default_value = "tictactoe_mqtt.toml")]
    pub config: std::path::PathBuf,

    /// File receiving log output (the terminal is used by the board)
    #[arg(long, default_value = "tictactoe_mqtt.log")]
    pub log_file: std::path::PathBuf,
}
