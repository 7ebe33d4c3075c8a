//! Game mode selection.

use serde::{Deserialize, Serialize};
use tictactoe_rules::Mark;

/// Game mode - who authors each mark?
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
pub enum GameMode {
    /// Local human plays X, the remote bot plays O.
    #[default]
    HumanVsBot,
    /// Two humans share the keyboard; no messaging.
    HumanVsHuman,
    /// This process drives both X and O.
    BotVsBot,
}

impl GameMode {
    /// Returns display name.
    pub fn name(&self) -> &str {
        match self {
            GameMode::HumanVsBot => "Human (X) vs Computer (O)",
            GameMode::HumanVsHuman => "Human (X) vs Human   (O)",
            GameMode::BotVsBot => "Computer (X) vs Computer (O)",
        }
    }

    /// Menu number, also the value announced on the bus.
    pub fn number(self) -> u8 {
        match self {
            GameMode::HumanVsBot => 1,
            GameMode::HumanVsHuman => 2,
            GameMode::BotVsBot => 3,
        }
    }

    /// Mode for a menu number.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(GameMode::HumanVsBot),
            2 => Some(GameMode::HumanVsHuman),
            3 => Some(GameMode::BotVsBot),
            _ => None,
        }
    }

    /// Whether this mode exchanges messages with the remote device.
    pub fn is_networked(self) -> bool {
        self != GameMode::HumanVsHuman
    }

    /// Mark entered at the local keyboard during a networked game, if any.
    pub fn human_mark(self) -> Option<Mark> {
        match self {
            GameMode::HumanVsBot => Some(Mark::X),
            GameMode::HumanVsHuman | GameMode::BotVsBot => None,
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
