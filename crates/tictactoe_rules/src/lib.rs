//! Pure tic-tac-toe board logic.
//!
//! Nothing in this crate performs I/O. The board is a value: moves produce a
//! new board rather than mutating a shared one, which lets a networked client
//! keep its view untouched until the authoritative copy arrives.
//!
//! # Example
//!
//! ```
//! use tictactoe_rules::{Board, GameOutcome, Mark, Move, Position, outcome};
//!
//! let board = Board::new();
//! let next = board.apply(Move::new(Mark::X, Position::Center)).unwrap();
//! assert_eq!(outcome(&next), GameOutcome::InProgress);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod position;
pub mod rules;
mod types;

pub use error::{BoardError, MoveError};
pub use position::Position;
pub use rules::{apply_move, is_full, mover, outcome, winner};
pub use types::{Board, GameOutcome, Mark, Move, Square};
