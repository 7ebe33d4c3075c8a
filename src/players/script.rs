//! Decider that runs an external program which publishes the move itself.

use super::{Decision, DeciderError, MoveDecider};
use tictactoe_rules::{Board, Mark, Position};
use tokio::process::Command;
use tracing::{info, instrument};

/// Runs `<command> <mark>` when no cell is chosen, or `<command> <row> <col>`
/// when the caller picked one. A zero exit status means the program
/// published the move.
#[derive(Debug, Clone)]
pub struct ScriptDecider {
    command: String,
}

impl ScriptDecider {
    /// Creates a decider running `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Arguments passed to the program.
    pub fn arguments(mark: Mark, hint: Option<Position>) -> Vec<String> {
        match hint {
            Some(pos) => vec![pos.row().to_string(), pos.col().to_string()],
            None => vec![mark.to_string()],
        }
    }
}

#[async_trait::async_trait]
impl MoveDecider for ScriptDecider {
    #[instrument(skip(self, board), fields(command = %self.command, board = %board))]
    async fn decide_move(
        &mut self,
        board: &Board,
        mark: Mark,
        hint: Option<Position>,
    ) -> Result<Decision, DeciderError> {
        let args = Self::arguments(mark, hint);
        info!(?args, "Running move decider");

        let status = Command::new(&self.command)
            .args(&args)
            .status()
            .await
            .map_err(|e| DeciderError::new(format!("Failed to run {}: {}", self.command, e)))?;

        if !status.success() {
            return Err(DeciderError::new(format!(
                "Error running {} (returned {})",
                self.command, status
            )));
        }
        Ok(Decision::Delegated)
    }

    fn name(&self) -> &str {
        &self.command
    }
}
