//! Turn order derived from mark counts.

use super::win::winner;
use crate::{Board, BoardError, Mark, Move, MoveError};
use tracing::instrument;

/// Whose turn it is on `board`.
///
/// Equal counts mean X moves; one more X than O means O moves. Any other
/// difference is a board no legal game produces.
#[instrument]
pub fn mover(board: &Board) -> Result<Mark, BoardError> {
    let x = board.count(Mark::X);
    let o = board.count(Mark::O);
    if x == o {
        Ok(Mark::X)
    } else if x == o + 1 {
        Ok(Mark::O)
    } else {
        Err(BoardError::Parity { x, o })
    }
}

/// Applies a validated move, returning the new board.
#[instrument]
pub fn apply_move(board: &Board, mv: Move) -> Result<Board, MoveError> {
    board.apply(mv)
}

impl Board {
    /// Verifies the board could come from legal play.
    ///
    /// Checks turn parity and that at most one mark holds a line.
    #[instrument]
    pub fn check_consistency(&self) -> Result<(), BoardError> {
        mover(self)?;
        if winner(self, Mark::X) && winner(self, Mark::O) {
            return Err(BoardError::DoubleWin);
        }
        Ok(())
    }
}
