//! Turn coordination against the remote board owner.
//!
//! The remote device is the only source of committed board state. The
//! coordinator's view changes only when a decoded snapshot arrives; a move
//! it publishes is not trusted until the device echoes it back. In the
//! meantime the coordinator sits in [`TurnState::AwaitingRemoteUpdate`].

mod bot;
mod slot;

pub use slot::{SnapshotSlot, SnapshotWatcher};

use crate::codec::{self, TOPIC_BOARD};
use crate::config::Timing;
use crate::error::{ClientError, ClientErrorKind};
use crate::mode::GameMode;
use crate::players::{
    Decision, LineInput, MoveDecider, pick_random_cell, prompt_for_move,
};
use crate::transport::{Inbound, Publish, Transport, TransportError};
use crate::ui::{self, Screen};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::{Handle, RuntimeFlavor};
use tictactoe_rules::{Board, BoardError, GameOutcome, Mark, Move, Position, mover, outcome};
use tracing::{debug, info, instrument, trace, warn};

/// Where the coordinator stands in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for the device to publish the next board.
    AwaitingRemoteUpdate,
    /// The local keyboard must supply a move for this mark.
    LocalTurn(Mark),
    /// The remote opponent plays this mark; the move decider is consulted.
    RemoteTurn(Mark),
    /// This process plays this mark on its own.
    AutomatedTurn(Mark),
    /// Game over. Absorbing.
    Terminal(GameOutcome),
}

/// Decides whose turn `board` calls for under `mode`.
///
/// A finished board is terminal regardless of mode. Otherwise the mover is
/// derived from mark counts and mapped to how that mark is authored.
#[instrument(fields(board = %board))]
pub fn decide_turn(mode: GameMode, board: &Board) -> Result<TurnState, BoardError> {
    let result = outcome(board);
    if result.is_terminal() {
        return Ok(TurnState::Terminal(result));
    }
    let mark = mover(board)?;
    let state = match mode {
        GameMode::HumanVsBot if mode.human_mark() == Some(mark) => TurnState::LocalTurn(mark),
        GameMode::HumanVsBot => TurnState::RemoteTurn(mark),
        GameMode::BotVsBot => TurnState::AutomatedTurn(mark),
        GameMode::HumanVsHuman => TurnState::LocalTurn(mark),
    };
    Ok(state)
}

/// Runs console I/O that blocks the thread.
///
/// On a multi-thread runtime the worker hands its other tasks (the MQTT
/// event loop among them) to another thread first, so keep-alives keep
/// flowing while the player thinks.
fn blocking_console<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

/// What handling one message or snapshot amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing changed: wrong topic, malformed payload, or a board already acted on.
    Ignored,
    /// The board was taken in; a move may or may not have gone out.
    Advanced(TurnState),
    /// The game is over.
    Finished(GameOutcome),
}

/// Drives one networked game.
pub struct TurnCoordinator {
    mode: GameMode,
    view: Option<Board>,
    state: TurnState,
    last_acted: Option<Board>,
    decider: Box<dyn MoveDecider>,
    input: Box<dyn LineInput>,
    screen: Box<dyn Screen>,
    rng: StdRng,
    timing: Timing,
}

impl TurnCoordinator {
    /// Creates a coordinator that has not seen any board yet.
    pub fn new(
        mode: GameMode,
        decider: Box<dyn MoveDecider>,
        input: Box<dyn LineInput>,
        screen: Box<dyn Screen>,
        timing: Timing,
    ) -> Self {
        Self {
            mode,
            view: None,
            state: TurnState::AwaitingRemoteUpdate,
            last_acted: None,
            decider,
            input,
            screen,
            rng: StdRng::from_entropy(),
            timing,
        }
    }

    /// Replaces the random source with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Session mode.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Last authoritative board, if any has arrived.
    pub fn board(&self) -> Option<Board> {
        self.view
    }

    /// Current turn state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Plays until the board reaches a terminal outcome.
    #[instrument(skip_all, fields(mode = ?self.mode))]
    pub async fn run<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<GameOutcome, ClientError> {
        info!("Starting turn coordination");
        match self.mode {
            GameMode::BotVsBot => self.run_bot_vs_bot(transport).await,
            GameMode::HumanVsBot => self.run_sequential(transport).await,
            GameMode::HumanVsHuman => Err(ClientError::new(ClientErrorKind::Transport(
                "local games do not use the message bus".to_string(),
            ))),
        }
    }

    /// Alternates bounded receives with acting on each snapshot.
    async fn run_sequential<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<GameOutcome, ClientError> {
        loop {
            let (publisher, receiver) = transport.split();
            let message = match receiver.receive_next(self.timing.receive_timeout).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    trace!("Receive timed out, waiting again");
                    continue;
                }
                Err(TransportError::Closed) => return Err(TransportError::Closed.into()),
                Err(e) => {
                    warn!(error = %e, "Receive failed, waiting again");
                    continue;
                }
            };
            if let Step::Finished(result) = self.handle_inbound(publisher, message).await? {
                return Ok(result);
            }
        }
    }

    /// Handles one delivered message.
    ///
    /// Only `game/board` is read. A payload that does not decode is dropped
    /// and leaves both the board view and the turn state as they were.
    #[instrument(skip(self, publisher, message), fields(topic = %message.topic()))]
    pub async fn handle_inbound(
        &mut self,
        publisher: &dyn Publish,
        message: Inbound,
    ) -> Result<Step, ClientError> {
        if message.topic() != TOPIC_BOARD {
            debug!("Ignoring message on unexpected topic");
            return Ok(Step::Ignored);
        }
        match codec::decode_snapshot(message.payload()) {
            Ok(board) => self.on_snapshot(publisher, board).await,
            Err(e) => {
                warn!(
                    error = %e,
                    payload = %String::from_utf8_lossy(message.payload()),
                    "Dropping malformed board snapshot"
                );
                Ok(Step::Ignored)
            }
        }
    }

    /// Takes in an authoritative board and acts on it if it is our move.
    ///
    /// A board identical to the last one acted on is a redelivery and is
    /// ignored, so at-least-once delivery never produces a second move.
    #[instrument(skip(self, publisher), fields(board = %board))]
    pub async fn on_snapshot(
        &mut self,
        publisher: &dyn Publish,
        board: Board,
    ) -> Result<Step, ClientError> {
        if self.last_acted == Some(board) {
            debug!("Board already acted on, ignoring redelivery");
            return Ok(Step::Ignored);
        }
        let turn = match decide_turn(self.mode, &board) {
            Ok(turn) => turn,
            Err(e) => {
                warn!(error = %e, "Dropping board unreachable by legal play");
                return Ok(Step::Ignored);
            }
        };

        if self.view != Some(board) {
            self.view = Some(board);
            self.screen.show_board(&board);
        }
        self.state = turn;
        debug!(state = ?turn, "Turn decided");

        let acted = match turn {
            TurnState::Terminal(result) => {
                info!(outcome = ?result, "Game over");
                self.screen.message(&ui::outcome_message(self.mode, result));
                return Ok(Step::Finished(result));
            }
            TurnState::LocalTurn(mark) => {
                let (input, screen) = (self.input.as_mut(), self.screen.as_mut());
                let position =
                    blocking_console(|| prompt_for_move(input, screen, &board, mark))?;
                self.publish_move(publisher, Move::new(mark, position)).await
            }
            TurnState::RemoteTurn(mark) => {
                self.screen.message(ui::THINKING);
                self.consult_decider(publisher, &board, mark, None).await
            }
            TurnState::AutomatedTurn(mark) => self.automated_move(publisher, &board, mark).await,
            TurnState::AwaitingRemoteUpdate => false,
        };

        if acted {
            self.last_acted = Some(board);
            self.state = TurnState::AwaitingRemoteUpdate;
        }
        Ok(Step::Advanced(self.state))
    }

    /// Random cell for `mark`. X is published directly; O goes through the
    /// decider with the chosen cell.
    async fn automated_move(&mut self, publisher: &dyn Publish, board: &Board, mark: Mark) -> bool {
        let Some(position) = pick_random_cell(board, &mut self.rng) else {
            warn!("No empty cell left for automated move");
            return false;
        };
        debug!(mark = %mark, position = position.to_index(), "Automated move chosen");
        match mark {
            Mark::X => self.publish_move(publisher, Move::new(mark, position)).await,
            Mark::O => {
                self.consult_decider(publisher, board, mark, Some(position))
                    .await
            }
        }
    }

    /// Asks the decider to play. Failure is reported and the turn is left
    /// open for the next cycle.
    async fn consult_decider(
        &mut self,
        publisher: &dyn Publish,
        board: &Board,
        mark: Mark,
        hint: Option<Position>,
    ) -> bool {
        match self.decider.decide_move(board, mark, hint).await {
            Ok(Decision::Publish(mv)) => self.publish_move(publisher, mv).await,
            Ok(Decision::Delegated) => {
                debug!(decider = %self.decider.name(), "Decider published its own move");
                true
            }
            Err(e) => {
                warn!(error = %e, decider = %self.decider.name(), "Move decider failed");
                self.screen
                    .message(&format!("Error running {}: {}", self.decider.name(), e.message));
                false
            }
        }
    }

    /// Encodes and publishes `mv`. Failures are logged, not retried.
    async fn publish_move(&mut self, publisher: &dyn Publish, mv: Move) -> bool {
        let outbound = match codec::encode_move(mv) {
            Ok(outbound) => outbound,
            Err(e) => {
                warn!(error = %e, "Failed to encode move");
                return false;
            }
        };
        let topic = outbound.topic().clone();
        match publisher.publish(&topic, outbound.payload().clone()).await {
            Ok(()) => {
                info!(topic = %topic, mark = %mv.mark(), position = mv.position().to_index(), "Move published");
                true
            }
            Err(e) => {
                warn!(error = %e, topic = %topic, "Move publish failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(cells: &str) -> Board {
        Board::from_cells(cells).unwrap()
    }

    #[test]
    fn test_empty_board_is_x_local_turn() {
        assert_eq!(
            decide_turn(GameMode::HumanVsBot, &Board::new()),
            Ok(TurnState::LocalTurn(Mark::X))
        );
    }

    #[test]
    fn test_o_is_remote_in_human_vs_bot() {
        assert_eq!(
            decide_turn(GameMode::HumanVsBot, &board("....X....")),
            Ok(TurnState::RemoteTurn(Mark::O))
        );
    }

    #[test]
    fn test_both_marks_automated_in_bot_vs_bot() {
        assert_eq!(
            decide_turn(GameMode::BotVsBot, &Board::new()),
            Ok(TurnState::AutomatedTurn(Mark::X))
        );
        assert_eq!(
            decide_turn(GameMode::BotVsBot, &board("X........")),
            Ok(TurnState::AutomatedTurn(Mark::O))
        );
    }

    #[test]
    fn test_terminal_wins_over_parity() {
        assert_eq!(
            decide_turn(GameMode::HumanVsBot, &board("XXXOO....")),
            Ok(TurnState::Terminal(GameOutcome::Won(Mark::X)))
        );
        assert_eq!(
            decide_turn(GameMode::BotVsBot, &board("XOXXOOOXX")),
            Ok(TurnState::Terminal(GameOutcome::Draw))
        );
    }

    #[test]
    fn test_decision_is_stable_for_unchanged_board() {
        let b = board("X...O....");
        assert_eq!(
            decide_turn(GameMode::HumanVsBot, &b),
            decide_turn(GameMode::HumanVsBot, &b)
        );
    }

    #[test]
    fn test_never_solicits_mark_that_is_ahead() {
        for cells in ["X........", "X...O...X", "XO..X..O."] {
            let b = board(cells);
            let (TurnState::LocalTurn(mark) | TurnState::RemoteTurn(mark)) =
                decide_turn(GameMode::HumanVsBot, &b).unwrap()
            else {
                panic!("expected a turn for {}", cells);
            };
            assert!(b.count(mark) <= b.count(mark.opponent()));
        }
    }
}
