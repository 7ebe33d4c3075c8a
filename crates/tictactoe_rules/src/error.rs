//! Errors raised by board operations.

use derive_more::{Display, Error};

/// A move that cannot be applied to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// Row, column or index outside the 3x3 grid.
    #[display("Cell ({}, {}) is outside the board", row, col)]
    OutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
    /// Target cell already holds a mark.
    #[display("Cell {} is already occupied", index)]
    Occupied {
        /// Board index (0-8) of the occupied cell.
        index: usize,
    },
}

/// A board that could not have been reached by legal play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// Mark counts violate X-moves-first alternation.
    #[display("Mark counts out of turn order (X={}, O={})", x, o)]
    Parity {
        /// Number of X marks.
        x: usize,
        /// Number of O marks.
        o: usize,
    },
    /// Both marks hold a complete line.
    #[display("Both X and O hold a complete line")]
    DoubleWin,
}
