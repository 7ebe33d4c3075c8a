//! Terminal presentation.
//!
//! Text is produced by pure functions of the board and outcome; a [`Screen`]
//! only decides where the text goes.

use crate::mode::GameMode;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use strum::IntoEnumIterator;
use tictactoe_rules::{Board, GameOutcome, Mark};
use tracing::warn;

/// Shown while the automated O player is consulted.
pub const THINKING: &str = "Computer (O) thinking...";

/// Prompt printed under the menu.
pub const MENU_PROMPT: &str = "Enter choice (1-3): ";

/// Board with its heading.
pub fn render_screen(board: &Board) -> String {
    format!("\nTic-Tac-Toe Board:\n\n{}\n", board.render())
}

/// Final line for a finished game.
pub fn outcome_message(mode: GameMode, outcome: GameOutcome) -> String {
    match (mode, outcome) {
        (_, GameOutcome::InProgress) => "Game in progress".to_string(),
        (_, GameOutcome::Draw) => "It's a draw!".to_string(),
        (GameMode::HumanVsBot, GameOutcome::Won(Mark::X)) => "You win!".to_string(),
        (GameMode::HumanVsBot, GameOutcome::Won(Mark::O)) => "Bot wins!".to_string(),
        (_, GameOutcome::Won(mark)) => format!("Player {} wins!", mark),
    }
}

/// Prompt for a cell.
pub fn move_prompt(mark: Mark) -> String {
    format!("Player {}, enter your move (0-8): ", mark)
}

/// Mode selection menu.
pub fn menu_text() -> String {
    let mut text = String::from("Select mode:\n");
    for mode in GameMode::iter() {
        text.push_str(&format!(" {}) {}\n", mode.number(), mode.name()));
    }
    text
}

/// Destination for rendered output.
pub trait Screen: Send {
    /// Replaces the displayed board.
    fn show_board(&mut self, board: &Board);

    /// Prints a line of text.
    fn message(&mut self, text: &str);

    /// Prints a prompt without a trailing newline.
    fn prompt(&mut self, text: &str);
}

/// Screen on the controlling terminal. Clears before each board.
#[derive(Debug, Default)]
pub struct TerminalScreen;

impl Screen for TerminalScreen {
    fn show_board(&mut self, board: &Board) {
        let mut stdout = std::io::stdout();
        if let Err(e) = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)) {
            warn!(error = %e, "Failed to clear terminal");
        }
        print!("{}", render_screen(board));
        println!();
    }

    fn message(&mut self, text: &str) {
        println!("{}", text);
    }

    fn prompt(&mut self, text: &str) {
        print!("{}", text);
        if let Err(e) = std::io::stdout().flush() {
            warn!(error = %e, "Failed to flush prompt");
        }
    }
}

/// One thing written to a [`RecordingScreen`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A board was shown.
    Board(Board),
    /// A message line.
    Message(String),
    /// A prompt.
    Prompt(String),
}

/// Screen that keeps everything shown, for inspection.
///
/// Clones share the same record.
#[derive(Debug, Default, Clone)]
pub struct RecordingScreen {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl RecordingScreen {
    /// Everything shown so far.
    pub fn frames(&self) -> Vec<Frame> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Boards shown so far.
    pub fn boards(&self) -> Vec<Board> {
        self.frames()
            .into_iter()
            .filter_map(|f| match f {
                Frame::Board(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// Message lines shown so far.
    pub fn messages(&self) -> Vec<String> {
        self.frames()
            .into_iter()
            .filter_map(|f| match f {
                Frame::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.frames()
            .into_iter()
            .filter_map(|f| match f {
                Frame::Prompt(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn push(&self, frame: Frame) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame);
    }
}

impl Screen for RecordingScreen {
    fn show_board(&mut self, board: &Board) {
        self.push(Frame::Board(*board));
    }

    fn message(&mut self, text: &str) {
        self.push(Frame::Message(text.to_string()));
    }

    fn prompt(&mut self, text: &str) {
        self.push(Frame::Prompt(text.to_string()));
    }
}
