//! Game rules for tic-tac-toe.
//!
//! Pure functions evaluating a board. Nothing here is stored: the outcome
//! and the mover are recomputed from the board every time they are needed.

pub mod draw;
pub mod outcome;
pub mod turn;
pub mod win;

pub use draw::is_full;
pub use outcome::outcome;
pub use turn::{apply_move, mover};
pub use win::winner;
