//! Shared fixtures: a fake board device and coordinator builders.

#![allow(dead_code)]

use std::time::Duration;
use tictactoe_mqtt::{
    Board, DeciderError, Decision, GameMode, Inbound, Mark, MemoryBus, MemoryTransport,
    MoveDecider, Position, RandomDecider, RecordingScreen, ScriptedInput, TOPIC_BOARD, TOPIC_MODE,
    Timing, TurnCoordinator, decode_move_intent,
};

/// Fast timings so tests finish quickly.
pub fn fast_timing() -> Timing {
    Timing {
        receive_timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
        settle_delay: Duration::from_millis(5),
    }
}

/// Board payload the way the device sends it: spaces for empty cells.
pub fn snapshot_payload(board: &Board) -> Vec<u8> {
    format!(r#"{{"board":"{}"}}"#, board.cells().replace('.', " ")).into_bytes()
}

/// Parses a board literal.
pub fn board(cells: &str) -> Board {
    Board::from_cells(cells).unwrap()
}

/// Makes the bus behave like the board-owning device: the mode announcement
/// starts a fresh game, and every legal move is applied and echoed back.
pub fn attach_device(bus: &MemoryBus) {
    attach_noisy_device(bus, Vec::new());
}

/// Like [`attach_device`], but every echoed board is followed by `noise`.
pub fn attach_noisy_device(bus: &MemoryBus, noise: Vec<Inbound>) {
    let mut current = Board::new();
    bus.respond_with(move |outbound| {
        if outbound.topic() == TOPIC_MODE {
            current = Board::new();
            return vec![Inbound::new(TOPIC_BOARD.to_string(), snapshot_payload(&current))];
        }
        let Ok(intent) = decode_move_intent(outbound.payload()) else {
            return Vec::new();
        };
        let Ok(mv) = intent.to_move() else {
            return Vec::new();
        };
        if let Ok(next) = current.apply(mv) {
            current = next;
        }
        let mut replies = vec![Inbound::new(TOPIC_BOARD.to_string(), snapshot_payload(&current))];
        replies.extend(noise.iter().cloned());
        replies
    });
}

/// Decider that always fails.
pub struct FailingDecider;

#[async_trait::async_trait]
impl MoveDecider for FailingDecider {
    async fn decide_move(
        &mut self,
        _board: &Board,
        _mark: Mark,
        _hint: Option<Position>,
    ) -> Result<Decision, DeciderError> {
        Err(DeciderError::new("bot script exploded".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Decider that claims to have published, like the bot script.
pub struct DelegatingDecider;

#[async_trait::async_trait]
impl MoveDecider for DelegatingDecider {
    async fn decide_move(
        &mut self,
        _board: &Board,
        _mark: Mark,
        _hint: Option<Position>,
    ) -> Result<Decision, DeciderError> {
        Ok(Decision::Delegated)
    }

    fn name(&self) -> &str {
        "delegating"
    }
}

/// Coordinator over a fresh memory transport.
pub fn coordinator(
    mode: GameMode,
    decider: Box<dyn MoveDecider>,
    lines: &[&str],
) -> (TurnCoordinator, MemoryTransport, MemoryBus, RecordingScreen) {
    let (transport, bus) = MemoryTransport::new();
    let screen = RecordingScreen::default();
    let coordinator = TurnCoordinator::new(
        mode,
        decider,
        Box::new(ScriptedInput::new(lines.iter().copied())),
        Box::new(screen.clone()),
        fast_timing(),
    )
    .with_seed(11);
    (coordinator, transport, bus, screen)
}

/// Random decider with a fixed seed.
pub fn random_decider() -> Box<dyn MoveDecider> {
    Box::new(RandomDecider::seeded("test bot", 5))
}
