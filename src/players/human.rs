//! Human player reading cells from a line-oriented console.

use crate::error::{ClientError, ClientErrorKind};
use crate::ui::{self, Screen};
use std::collections::VecDeque;
use std::io::BufRead;
use tictactoe_rules::{Board, Mark, Position};
use tracing::{debug, instrument};

/// Synchronous source of input lines.
pub trait LineInput: Send {
    /// Reads one line. `Ok(None)` at end of input.
    fn read_line(&mut self) -> std::io::Result<Option<String>>;
}

/// Reads lines from standard input.
#[derive(Debug, Default)]
pub struct StdinInput;

impl LineInput for StdinInput {
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Replays a fixed list of lines.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    /// Creates input that yields `lines` in order, then end of input.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineInput for ScriptedInput {
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Why a line does not name a playable cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRejection {
    /// Not an integer.
    NotANumber,
    /// Outside 0-8.
    OutOfRange,
    /// Cell already holds a mark.
    Occupied,
}

impl CellRejection {
    fn message(self) -> &'static str {
        match self {
            CellRejection::NotANumber => "Invalid input. Try again.",
            CellRejection::OutOfRange | CellRejection::Occupied => {
                "Cell occupied or out of range. Try again."
            }
        }
    }
}

/// Parses a line as a cell index (0-8) naming an empty cell of `board`.
#[instrument(skip(board))]
pub fn parse_cell(line: &str, board: &Board) -> Result<Position, CellRejection> {
    let index: i64 = line.trim().parse().map_err(|_| CellRejection::NotANumber)?;
    let pos = usize::try_from(index)
        .ok()
        .and_then(Position::from_index)
        .ok_or(CellRejection::OutOfRange)?;
    if !board.is_empty(pos) {
        return Err(CellRejection::Occupied);
    }
    Ok(pos)
}

/// Prompts `mark` until a valid empty cell is entered.
///
/// Invalid lines re-prompt without consuming the turn. End of input is an
/// error: no move can ever arrive.
#[instrument(skip(input, screen, board), fields(mark = %mark))]
pub fn prompt_for_move(
    input: &mut dyn LineInput,
    screen: &mut dyn Screen,
    board: &Board,
    mark: Mark,
) -> Result<Position, ClientError> {
    loop {
        screen.prompt(&ui::move_prompt(mark));
        let line = input
            .read_line()
            .map_err(|e| ClientError::new(ClientErrorKind::Input(e.to_string())))?
            .ok_or_else(|| ClientError::new(ClientErrorKind::Input("end of input".to_string())))?;
        match parse_cell(&line, board) {
            Ok(pos) => {
                debug!(position = pos.to_index(), "Accepted move");
                return Ok(pos);
            }
            Err(rejection) => {
                debug!(line = %line.trim(), ?rejection, "Rejected move input");
                screen.message(rejection.message());
            }
        }
    }
}
