use crate::board::Cell;
use crate::detector::find_best_move_hint;
use crate::engine::{EngineState, Game, Phase, RoundSummary, SwapOutcome};
use rand::Rng;

/// Why `play_greedy` stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The round ended: goal reached or time up.
    Finished,
    /// The board had no move left to suggest.
    NoMove,
    /// `max_moves` swaps were played.
    MoveCap,
}

/// Outcome of a greedy playout.
#[derive(Clone, Debug)]
pub struct PlayoutReport {
    /// Swaps played, in order.
    pub moves: Vec<(Cell, Cell)>,
    /// Cascade iterations over the whole playout.
    pub clear_phases: usize,
    /// Highest combo reached by any single cascade.
    pub best_combo: u32,
    /// Safety shuffles the engine performed on its own.
    pub settle_shuffles: usize,
    pub stop: StopReason,
    pub summary: RoundSummary,
}

/// Plays the best hinted swap until the round finishes, no move is left or `max_moves`
/// swaps have been made.
///
/// A pending resolution (such as the initial stabilization of `Game::new`) is settled
/// first. Hints are looked up directly, so the hint tool's cooldown is not consumed.
///
/// # Examples
/// ```
/// use match3_engine::autoplay::{play_greedy, StopReason};
/// use match3_engine::difficulty::Difficulty;
/// use match3_engine::engine::Game;
///
/// let mut game = Game::seeded(Difficulty::Easy.config(), 3);
/// let report = play_greedy(&mut game, 5);
/// assert!(report.moves.len() <= 5);
/// assert_eq!(report.summary.score, game.score());
/// if report.stop == StopReason::MoveCap {
///     assert_eq!(report.moves.len(), 5);
/// }
/// ```
pub fn play_greedy<R: Rng>(game: &mut Game<R>, max_moves: usize) -> PlayoutReport {
    let mut report = PlayoutReport {
        moves: Vec::new(),
        clear_phases: 0,
        best_combo: 0,
        settle_shuffles: 0,
        stop: StopReason::MoveCap,
        summary: game.summary(),
    };
    record_phases(&mut report, game.resolve());

    report.stop = loop {
        if game.state() == EngineState::Finished {
            break StopReason::Finished;
        }
        if report.moves.len() >= max_moves {
            break StopReason::MoveCap;
        }

        let hint = find_best_move_hint(game.board());
        if !hint.found {
            break StopReason::NoMove;
        }
        match game.try_swap(hint.from, hint.to) {
            SwapOutcome::Accepted { .. } => {}
            // A hinted swap always matches; anything else means the board has no usable move.
            SwapOutcome::Rejected | SwapOutcome::Reverted => break StopReason::NoMove,
        }
        report.moves.push((hint.from, hint.to));
        record_phases(&mut report, game.resolve());
    };

    report.summary = game.summary();
    report
}

fn record_phases(report: &mut PlayoutReport, phases: Vec<Phase>) {
    for phase in phases {
        match phase {
            Phase::Cleared(clear) => {
                report.clear_phases += 1;
                report.best_combo = report.best_combo.max(clear.combo);
            }
            Phase::Shuffled { .. } => report.settle_shuffles += 1,
            Phase::Settled(_) => {}
        }
    }
}
