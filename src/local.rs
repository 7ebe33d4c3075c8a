//! Two humans at one keyboard. No messaging at all.

use crate::error::ClientError;
use crate::mode::GameMode;
use crate::players::{LineInput, prompt_for_move};
use crate::ui::{self, Screen};
use tictactoe_rules::{Board, GameOutcome, Move, apply_move, mover, outcome};
use tracing::{debug, info, instrument};

/// Plays a full local game, alternating X and O at the prompt.
#[instrument(skip_all)]
pub fn play_local(
    input: &mut dyn LineInput,
    screen: &mut dyn Screen,
) -> Result<GameOutcome, ClientError> {
    info!("Starting local game");
    let mut board = Board::new();
    screen.show_board(&board);

    loop {
        let result = outcome(&board);
        if result.is_terminal() {
            info!(outcome = ?result, "Local game over");
            screen.message(&ui::outcome_message(GameMode::HumanVsHuman, result));
            return Ok(result);
        }

        let mark = mover(&board)?;
        let position = prompt_for_move(input, screen, &board, mark)?;
        board = apply_move(&board, Move::new(mark, position))?;
        debug!(board = %board, "Local move applied");
        screen.show_board(&board);
    }
}
