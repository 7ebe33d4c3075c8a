//! Move sources: the local keyboard and automated move deciders.

mod human;
mod random;
mod script;

pub use human::{CellRejection, LineInput, ScriptedInput, StdinInput, parse_cell, prompt_for_move};
pub use random::{RandomDecider, pick_random_cell};
pub use script::ScriptDecider;

use derive_more::{Display, Error};
use tictactoe_rules::{Board, Mark, Move, Position};
use tracing::{error, instrument};

/// What a decider did with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The caller must publish this move.
    Publish(Move),
    /// The decider published the move itself.
    Delegated,
}

/// An automated player consulted when the coordinator cannot pick a move
/// on its own.
#[async_trait::async_trait]
pub trait MoveDecider: Send {
    /// Plays `mark` on `board`.
    ///
    /// `hint` is a cell the caller already chose; deciders that publish on
    /// their own are expected to play it.
    async fn decide_move(
        &mut self,
        board: &Board,
        mark: Mark,
        hint: Option<Position>,
    ) -> Result<Decision, DeciderError>;

    /// Returns the decider's display name.
    fn name(&self) -> &str;
}

/// Move decider failure.
#[derive(Debug, Clone, Display, Error)]
#[display("Decider error: {} at {}:{}", message, file, line)]
pub struct DeciderError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DeciderError {
    /// Creates a new decider error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        error!(error_message = %message, "Decider error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
