//! Core domain types for tic-tac-toe.

use crate::error::MoveError;
use crate::position::Position;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A player's symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum Mark {
    /// Player X (moves first).
    X,
    /// Player O (moves second).
    O,
}

impl Mark {
    /// Returns the opponent's mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Wire and display character for this mark.
    pub fn as_char(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A square on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    Empty,
    /// Square holding a mark.
    Occupied(Mark),
}

impl Square {
    /// Parses a single cell character.
    ///
    /// `' '` and `'.'` both mean empty; the remote device uses spaces while
    /// the terminal renders dots.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Square::Occupied(Mark::X)),
            'O' => Some(Square::Occupied(Mark::O)),
            ' ' | '.' => Some(Square::Empty),
            _ => None,
        }
    }

    /// Rendering character: `.` for empty, otherwise the mark.
    pub fn as_char(self) -> char {
        match self {
            Square::Empty => '.',
            Square::Occupied(mark) => mark.as_char(),
        }
    }
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Creates a board from its squares.
    pub fn from_squares(squares: [Square; 9]) -> Self {
        Self { squares }
    }

    /// Parses exactly nine cell characters (see [`Square::from_char`]).
    ///
    /// Returns `None` unless every cell decodes.
    #[instrument]
    pub fn from_cells(cells: &str) -> Option<Self> {
        let mut squares = [Square::Empty; 9];
        let mut chars = cells.chars();
        for slot in squares.iter_mut() {
            *slot = Square::from_char(chars.next()?)?;
        }
        if chars.next().is_some() {
            return None;
        }
        Some(Self { squares })
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Number of squares holding `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(mark))
            .count()
    }

    /// Positions that are still empty, in index order.
    pub fn empty_positions(&self) -> Vec<Position> {
        Position::ALL
            .iter()
            .copied()
            .filter(|pos| self.is_empty(*pos))
            .collect()
    }

    /// Returns a new board with `mv` applied.
    ///
    /// The receiver is never modified; a rejected move leaves it as it was.
    #[instrument]
    pub fn apply(&self, mv: Move) -> Result<Board, MoveError> {
        let pos = mv.position();
        if !self.is_empty(pos) {
            return Err(MoveError::Occupied {
                index: pos.to_index(),
            });
        }
        let mut next = *self;
        next.squares[pos.to_index()] = Square::Occupied(mv.mark());
        Ok(next)
    }

    /// Nine-character cell string, `.` for empty.
    pub fn cells(&self) -> String {
        self.squares.iter().map(|s| s.as_char()).collect()
    }

    /// Formats the board as three rows separated by dividers.
    ///
    /// ```text
    ///  X | . | O
    /// ---+---+---
    ///  . | X | .
    /// ---+---+---
    ///  . | . | O
    /// ```
    pub fn render(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            let cells: Vec<String> = (0..3)
                .map(|col| format!(" {} ", self.squares[row * 3 + col].as_char()))
                .collect();
            result.push_str(&cells.join("|"));
            if row < 2 {
                result.push_str("\n---+---+---\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cells())
    }
}

/// A mark placed on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    mark: Mark,
    position: Position,
}

impl Move {
    /// Creates a move for `mark` at `position`.
    pub fn new(mark: Mark, position: Position) -> Self {
        Self { mark, position }
    }

    /// Creates a move from row and column (each 0-2).
    pub fn at(mark: Mark, row: usize, col: usize) -> Result<Self, MoveError> {
        Ok(Self::new(mark, Position::from_row_col(row, col)?))
    }

    /// The mover's mark.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Target cell.
    pub fn position(&self) -> Position {
        self.position
    }
}

/// Result of evaluating a board. Always derived from the board itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Game is ongoing.
    InProgress,
    /// A mark completed a line.
    Won(Mark),
    /// Board is full with no line.
    Draw,
}

impl GameOutcome {
    /// Whether the game has ended.
    pub fn is_terminal(self) -> bool {
        self != GameOutcome::InProgress
    }
}
