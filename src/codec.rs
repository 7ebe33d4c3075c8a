//! Wire format for the game topics.
//!
//! Every payload is a small JSON object. Inbound snapshots are decoded all
//! or nothing: either all nine cells parse into a consistent board, or the
//! message is rejected with an error saying whether the field was absent or
//! present but unusable.

use crate::mode::GameMode;
use crate::transport::Outbound;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tictactoe_rules::{Board, Mark, Move, MoveError};
use tracing::{debug, instrument};

/// Authoritative board updates from the remote device.
pub const TOPIC_BOARD: &str = "game/board";
/// Mode announcement, published once per session.
pub const TOPIC_MODE: &str = "game/mode";
/// Moves authored for X.
pub const TOPIC_MOVE_X: &str = "game/move_X";
/// Moves authored for O.
pub const TOPIC_MOVE_O: &str = "game/move_O";

const BOARD_FIELD: &str = "board";

/// Topic carrying moves for `mark`.
pub fn move_topic(mark: Mark) -> &'static str {
    match mark {
        Mark::X => TOPIC_MOVE_X,
        Mark::O => TOPIC_MOVE_O,
    }
}

/// Payload encoding or decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CodecError {
    /// Payload is not JSON at all.
    #[display("Payload is not JSON: {}", reason)]
    NotJson {
        /// Parser message.
        reason: String,
    },
    /// Payload is JSON but not an object.
    #[display("Payload is not a JSON object")]
    NotAnObject,
    /// Expected field is absent.
    #[display("Field '{}' is missing", field)]
    MissingField {
        /// Field name.
        field: &'static str,
    },
    /// Field is present but unusable.
    #[display("Field '{}' is malformed: {}", field, reason)]
    MalformedField {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// Outbound value could not be serialized.
    #[display("Failed to encode payload: {}", reason)]
    Encode {
        /// Serializer message.
        reason: String,
    },
}

/// Move request published for the remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    /// Mover's mark.
    pub player: Mark,
    /// Row 0-2.
    pub row: u8,
    /// Column 0-2.
    pub col: u8,
}

impl MoveIntent {
    /// Converts back into a validated move.
    pub fn to_move(self) -> Result<Move, MoveError> {
        Move::at(self.player, self.row as usize, self.col as usize)
    }
}

impl From<Move> for MoveIntent {
    fn from(mv: Move) -> Self {
        let pos = mv.position();
        Self {
            player: mv.mark(),
            row: pos.row() as u8,
            col: pos.col() as u8,
        }
    }
}

/// Selected mode announced to the remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeAnnouncement {
    /// Mode number 1-3.
    pub mode: u8,
}

fn parse_object(payload: &[u8]) -> Result<serde_json::Map<String, serde_json::Value>, CodecError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|e| CodecError::NotJson {
            reason: e.to_string(),
        })?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotAnObject),
    }
}

/// Decodes a board snapshot, reading only the `board` field.
#[instrument(skip(payload), fields(len = payload.len()))]
pub fn decode_snapshot(payload: &[u8]) -> Result<Board, CodecError> {
    let object = parse_object(payload)?;
    let field = object.get(BOARD_FIELD).ok_or(CodecError::MissingField {
        field: BOARD_FIELD,
    })?;
    let malformed = |reason: String| CodecError::MalformedField {
        field: BOARD_FIELD,
        reason,
    };

    let cells = field
        .as_str()
        .ok_or_else(|| malformed(format!("expected a string, found {}", field)))?;
    let len = cells.chars().count();
    if len != 9 {
        return Err(malformed(format!("expected 9 cells, found {}", len)));
    }
    let board = Board::from_cells(cells)
        .ok_or_else(|| malformed(format!("unexpected cell character in {:?}", cells)))?;
    board
        .check_consistency()
        .map_err(|e| malformed(e.to_string()))?;

    debug!(board = %board, "Decoded board snapshot");
    Ok(board)
}

/// Decodes a mode announcement.
#[instrument(skip(payload))]
pub fn decode_mode(payload: &[u8]) -> Result<GameMode, CodecError> {
    let object = parse_object(payload)?;
    let field = object
        .get("mode")
        .ok_or(CodecError::MissingField { field: "mode" })?;
    field
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .and_then(GameMode::from_number)
        .ok_or_else(|| CodecError::MalformedField {
            field: "mode",
            reason: format!("expected 1, 2 or 3, found {}", field),
        })
}

/// Decodes a move intent.
#[instrument(skip(payload))]
pub fn decode_move_intent(payload: &[u8]) -> Result<MoveIntent, CodecError> {
    let object = parse_object(payload)?;
    for field in ["player", "row", "col"] {
        if !object.contains_key(field) {
            return Err(CodecError::MissingField { field });
        }
    }
    let intent: MoveIntent = serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| CodecError::MalformedField {
            field: "player/row/col",
            reason: e.to_string(),
        })?;
    intent.to_move().map_err(|e| CodecError::MalformedField {
        field: "row/col",
        reason: e.to_string(),
    })?;
    Ok(intent)
}

/// Encodes a move on the topic owned by the mover's mark.
#[instrument]
pub fn encode_move(mv: Move) -> Result<Outbound, CodecError> {
    let intent = MoveIntent::from(mv);
    let payload = serde_json::to_vec(&intent).map_err(|e| CodecError::Encode {
        reason: e.to_string(),
    })?;
    Ok(Outbound::new(move_topic(mv.mark()).to_string(), payload))
}

/// Encodes the mode announcement for `game/mode`.
#[instrument]
pub fn encode_mode(mode: GameMode) -> Result<Outbound, CodecError> {
    let payload = serde_json::to_vec(&ModeAnnouncement { mode: mode.number() }).map_err(|e| {
        CodecError::Encode {
            reason: e.to_string(),
        }
    })?;
    Ok(Outbound::new(TOPIC_MODE.to_string(), payload))
}
