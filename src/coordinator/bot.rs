//! Bot-vs-bot play.
//!
//! Two futures run side by side on the two halves of the transport: a
//! listener that decodes every board update into a [`SnapshotSlot`], and the
//! bot loop that reads the slot on a fixed interval and moves whenever the
//! latest board calls for one. The bot may act on a slightly stale board;
//! the device rejects anything that no longer fits.

use super::{SnapshotSlot, SnapshotWatcher, Step, TurnCoordinator};
use crate::codec::{self, TOPIC_BOARD};
use crate::error::ClientError;
use crate::transport::{Publish, Receive, Transport, TransportError};
use std::time::Duration;
use tictactoe_rules::{Board, GameOutcome};
use tracing::{debug, instrument, trace, warn};

impl TurnCoordinator {
    /// Runs the listener and bot loop until the game ends.
    #[instrument(skip_all)]
    pub(super) async fn run_bot_vs_bot<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<GameOutcome, ClientError> {
        let slot = SnapshotSlot::new(self.view.unwrap_or_default());
        let mut watcher = slot.watch();
        let receive_timeout = self.timing.receive_timeout;
        let (publisher, receiver) = transport.split();

        tokio::select! {
            error = listen(receiver, &slot, receive_timeout) => Err(error),
            result = self.bot_loop(publisher, &mut watcher) => result,
        }
    }

    async fn bot_loop(
        &mut self,
        publisher: &dyn Publish,
        watcher: &mut SnapshotWatcher,
    ) -> Result<GameOutcome, ClientError> {
        loop {
            let board = watcher.latest();
            match self.on_snapshot(publisher, board).await? {
                Step::Finished(result) => return Ok(result),
                Step::Advanced(super::TurnState::AwaitingRemoteUpdate) => {
                    trace!("Move sent, letting the device settle");
                    tokio::time::sleep(self.timing.settle_delay).await;
                }
                Step::Advanced(_) | Step::Ignored => {
                    watcher.changed_within(self.timing.poll_interval).await;
                }
            }
        }
    }
}

/// Drains the receiver into `slot` until the transport closes.
#[instrument(skip_all)]
async fn listen(receiver: &mut dyn Receive, slot: &SnapshotSlot, timeout: Duration) -> ClientError {
    loop {
        match receiver.receive_next(timeout).await {
            Ok(None) => trace!("No board update yet"),
            Ok(Some(message)) if message.topic() == TOPIC_BOARD => {
                match codec::decode_snapshot(message.payload()) {
                    Ok(board) => store(slot, board),
                    Err(e) => warn!(error = %e, "Dropping malformed board snapshot"),
                }
            }
            Ok(Some(message)) => debug!(topic = %message.topic(), "Ignoring message"),
            Err(TransportError::Closed) => return TransportError::Closed.into(),
            Err(e) => warn!(error = %e, "Receive failed, waiting again"),
        }
    }
}

fn store(slot: &SnapshotSlot, board: Board) {
    debug!(board = %board, "Latest board updated");
    slot.replace(board);
}
