//! Client error types.

use crate::codec::CodecError;
use crate::players::DeciderError;
use crate::transport::TransportError;
use derive_more::Display;
use tictactoe_rules::{BoardError, MoveError};
use tracing::instrument;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ClientErrorKind {
    /// Inbound message missing or mangling an expected field.
    #[display("Malformed payload: {}", _0)]
    MalformedPayload(CodecError),
    /// Move targets an occupied or out-of-range cell.
    #[display("Illegal move: {}", _0)]
    IllegalMove(MoveError),
    /// Board that legal play cannot reach.
    #[display("Inconsistent board: {}", _0)]
    InconsistentBoard(BoardError),
    /// Broker did not confirm a publish in time.
    #[display("Publish timed out: {}", _0)]
    PublishTimeout(String),
    /// Broker connection could not be established.
    #[display("Connection failure: {}", _0)]
    ConnectionFailure(String),
    /// Startup menu answer outside 1-3.
    #[display("Invalid menu choice: {:?}", _0)]
    InvalidMenuChoice(String),
    /// External move decider failed.
    #[display("Move decider failed: {}", _0)]
    Decider(String),
    /// Local console input failed or ended.
    #[display("Input error: {}", _0)]
    Input(String),
    /// Configuration could not be loaded.
    #[display("Config error: {}", _0)]
    Config(String),
    /// Any other transport failure.
    #[display("Transport error: {}", _0)]
    Transport(String),
}

/// Client error with location tracking.
#[derive(Debug, Clone, Display, derive_more::Error)]
#[display("{} at {}:{}", kind, file, line)]
pub struct ClientError {
    /// Error kind.
    pub kind: ClientErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ClientError {
    /// Creates a new client error with caller location tracking.
    #[track_caller]
    #[instrument(skip(kind))]
    pub fn new(kind: ClientErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> &ClientErrorKind {
        &self.kind
    }
}

impl From<CodecError> for ClientError {
    #[track_caller]
    fn from(err: CodecError) -> Self {
        Self::new(ClientErrorKind::MalformedPayload(err))
    }
}

impl From<MoveError> for ClientError {
    #[track_caller]
    fn from(err: MoveError) -> Self {
        Self::new(ClientErrorKind::IllegalMove(err))
    }
}

impl From<BoardError> for ClientError {
    #[track_caller]
    fn from(err: BoardError) -> Self {
        Self::new(ClientErrorKind::InconsistentBoard(err))
    }
}

impl From<TransportError> for ClientError {
    #[track_caller]
    fn from(err: TransportError) -> Self {
        let kind = match &err {
            TransportError::PublishTimeout { .. } => ClientErrorKind::PublishTimeout(err.to_string()),
            TransportError::ConnectionFailure { .. } => {
                ClientErrorKind::ConnectionFailure(err.to_string())
            }
            _ => ClientErrorKind::Transport(err.to_string()),
        };
        Self::new(kind)
    }
}

impl From<DeciderError> for ClientError {
    #[track_caller]
    fn from(err: DeciderError) -> Self {
        Self::new(ClientErrorKind::Decider(err.to_string()))
    }
}
