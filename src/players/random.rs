//! Random player: uniform choice among empty cells.

use super::{Decision, DeciderError, MoveDecider};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tictactoe_rules::{Board, Mark, Move, Position};
use tracing::{debug, instrument};

/// Draws uniformly from the empty cells of `board`. `None` when full.
#[instrument(skip(board, rng), fields(board = %board))]
pub fn pick_random_cell<R: rand::Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Position> {
    board.empty_positions().choose(rng).copied()
}

/// In-process decider that plays random empty cells.
pub struct RandomDecider {
    name: String,
    rng: StdRng,
}

impl RandomDecider {
    /// Creates a random decider seeded from the OS.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible random decider.
    pub fn seeded(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

#[async_trait::async_trait]
impl MoveDecider for RandomDecider {
    async fn decide_move(
        &mut self,
        board: &Board,
        mark: Mark,
        hint: Option<Position>,
    ) -> Result<Decision, DeciderError> {
        let position = match hint.filter(|pos| board.is_empty(*pos)) {
            Some(pos) => pos,
            None => pick_random_cell(board, &mut self.rng)
                .ok_or_else(|| DeciderError::new("No empty cell to play".to_string()))?,
        };
        debug!(decider = %self.name, position = position.to_index(), "Random decider chose cell");
        Ok(Decision::Publish(Move::new(mark, position)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
