//! Latest-board cell shared between the listener and the bot loop.

use std::time::Duration;
use tictactoe_rules::Board;
use tokio::sync::watch;

/// Holds the most recent decoded board.
///
/// Single writer (the listener), any number of readers. The board is
/// replaced whole, so a reader never sees half of one update.
#[derive(Debug)]
pub struct SnapshotSlot {
    tx: watch::Sender<Board>,
}

impl SnapshotSlot {
    /// Creates a slot holding `initial`.
    pub fn new(initial: Board) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replaces the held board.
    pub fn replace(&self, board: Board) {
        self.tx.send_replace(board);
    }

    /// Creates a reader.
    pub fn watch(&self) -> SnapshotWatcher {
        SnapshotWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reader side of a [`SnapshotSlot`].
#[derive(Debug, Clone)]
pub struct SnapshotWatcher {
    rx: watch::Receiver<Board>,
}

impl SnapshotWatcher {
    /// Copy of the held board, marking it seen.
    pub fn latest(&mut self) -> Board {
        *self.rx.borrow_and_update()
    }

    /// Waits up to `timeout` for a board not yet seen. Returns whether one
    /// arrived.
    pub async fn changed_within(&mut self, timeout: Duration) -> bool {
        matches!(tokio::time::timeout(timeout, self.rx.changed()).await, Ok(Ok(())))
    }
}
