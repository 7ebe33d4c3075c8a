//! Game outcome evaluation.

use super::draw::is_full;
use super::win::winner;
use crate::{Board, GameOutcome, Mark};
use tracing::instrument;

/// Evaluates the board: X win, then O win, then full board, else in progress.
///
/// X is checked before O and the first match is reported. A board where both
/// marks hold a line cannot arise from legal play; callers that receive
/// boards from outside reject it with [`Board::check_consistency`] first.
#[instrument]
pub fn outcome(board: &Board) -> GameOutcome {
    if winner(board, Mark::X) {
        GameOutcome::Won(Mark::X)
    } else if winner(board, Mark::O) {
        GameOutcome::Won(Mark::O)
    } else if is_full(board) {
        GameOutcome::Draw
    } else {
        GameOutcome::InProgress
    }
}
