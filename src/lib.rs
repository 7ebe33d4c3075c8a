//! Terminal client for tic-tac-toe played against a remote board over MQTT.
//!
//! A remote device owns the authoritative board and publishes it on
//! `game/board`. This client renders it, asks the local player or a bot for
//! moves when the board calls for one, and publishes move intents on
//! `game/move_X` / `game/move_O`.
//!
//! # Architecture
//!
//! - **Codec**: JSON payloads for snapshots, moves and the mode announcement
//! - **Transport**: publish/subscribe seam, MQTT or in-memory
//! - **Coordinator**: turn state machine driven by authoritative snapshots
//! - **Players**: keyboard input and automated move deciders
//! - **UI**: board rendering and prompts
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_mqtt::{
//!     ClientConfig, GameMode, RecordingScreen, ScriptedInput, run_game,
//! };
//!
//! # async fn example() -> Result<(), tictactoe_mqtt::ClientError> {
//! let config = ClientConfig::default();
//! let _outcome = run_game(
//!     &config,
//!     GameMode::HumanVsHuman,
//!     Box::new(ScriptedInput::new(["0", "3", "1", "4", "2"])),
//!     Box::new(RecordingScreen::default()),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod codec;
mod config;
mod coordinator;
mod error;
mod local;
mod menu;
mod mode;
mod players;
mod session;
mod transport;
mod ui;

// Crate-level exports - Wire format
pub use codec::{
    CodecError, ModeAnnouncement, MoveIntent, TOPIC_BOARD, TOPIC_MODE, TOPIC_MOVE_O,
    TOPIC_MOVE_X, decode_mode, decode_move_intent, decode_snapshot, encode_mode, encode_move,
    move_topic,
};

// Crate-level exports - Configuration
pub use config::{ClientConfig, DeciderKind, Timing};

// Crate-level exports - Turn coordination
pub use coordinator::{SnapshotSlot, SnapshotWatcher, Step, TurnCoordinator, TurnState, decide_turn};

// Crate-level exports - Errors
pub use error::{ClientError, ClientErrorKind};

// Crate-level exports - Game flow
pub use local::play_local;
pub use menu::{choose_mode, parse_menu_choice};
pub use mode::GameMode;
pub use session::{Session, build_decider, run_game};

// Crate-level exports - Players
pub use players::{
    CellRejection, Decision, DeciderError, LineInput, MoveDecider, RandomDecider, ScriptDecider,
    ScriptedInput, StdinInput, parse_cell, pick_random_cell, prompt_for_move,
};

// Crate-level exports - Transport
pub use transport::{
    Inbound, MemoryBus, MemoryTransport, MqttSettings, MqttTransport, Outbound, Publish, Receive,
    Transport, TransportError,
};

// Crate-level exports - Presentation
pub use ui::{
    Frame, MENU_PROMPT, RecordingScreen, Screen, THINKING, TerminalScreen, menu_text,
    move_prompt, outcome_message, render_screen,
};

// Crate-level exports - Game types
pub use tictactoe_rules::{
    Board, BoardError, GameOutcome, Mark, Move, MoveError, Position, Square, apply_move, is_full,
    mover, outcome, winner,
};
