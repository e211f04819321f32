//! The round state machine.
//!
//! `Game` owns the board, the difficulty parameters and the RNG, and moves between three
//! states:
//! - `Idle`: waiting for a swap or a tool.
//! - `Resolving`: a cascade is in progress; every input is rejected until it settles.
//! - `Finished`: the goal was reached or time ran out.
//!
//! A cascade is advanced one phase at a time with `Game::step`, so a front end can animate
//! each `Phase` before asking for the next one. `Game::resolve` runs to the settled state in
//! one call.
use crate::board::{Board, Cell, Piece};
use crate::cascade::{
    apply_obstacle_damage, clear_and_refill, expand_triggered_specials, materialize_plan,
    plan_special_creation, trigger_special_swap,
};
use crate::detector::{
    find_best_move_hint, find_match_groups, has_any_possible_move, is_adjacent, shuffle_board,
    MatchGroup, MoveHint,
};
use crate::difficulty::{add_work_progress, score_groups, DifficultyConfig, RoundRules};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::time::Duration;

pub use crate::cascade::ClearDelta;

/// Safety shuffles allowed in one resolution before the board is left as it is.
pub const MAX_SETTLE_SHUFFLES: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineState {
    Idle,
    Resolving,
    Finished,
}

/// Result of `Game::try_swap`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Not allowed right now: wrong state, off-board or non-adjacent cells, or a locked cell.
    Rejected,
    /// The swap produced no match and involved no special piece, so it was undone.
    Reverted,
    /// The swap stands and a cascade is pending. `blast` holds what the swapped special
    /// pieces cleared, if any were involved.
    Accepted { blast: Option<ClearDelta> },
}

/// One cascade iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClearPhase {
    /// 1 for the first iteration of a cascade, 2 for the next, and so on.
    pub combo: u32,
    pub groups: Vec<MatchGroup>,
    /// Special pieces materialized at the end of the iteration.
    pub created: Vec<(Cell, Piece)>,
    pub score_gained: u32,
    pub rounds_completed: u32,
    pub delta: ClearDelta,
}

/// State of the round once a cascade has settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettleReport {
    pub score: u32,
    pub completed_rounds: u32,
    pub obstacles_remaining: usize,
    pub obstacles_cleared: usize,
    /// `false` only if every safety shuffle failed to produce a playable board.
    pub has_move: bool,
    pub goal_reached: bool,
    pub time_up: bool,
    /// `Idle` or `Finished`.
    pub state: EngineState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Cleared(ClearPhase),
    /// The settled board had no move and was shuffled; `safe` is the shuffle's verdict.
    Shuffled { safe: bool },
    Settled(SettleReport),
}

/// End-of-round figures handed to whatever pays out the reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    pub score: u32,
    pub completed_rounds: u32,
    pub obstacles_cleared: usize,
    pub target_obstacle_clear: usize,
    pub goal_reached: bool,
    pub base_fee: u32,
    pub score_bonus_fee: u32,
    pub earned_fee: u32,
}

/// A single match-3 round.
///
/// # Examples
/// ```
/// use match3_engine::difficulty::Difficulty;
/// use match3_engine::engine::{EngineState, Game, Phase};
/// use match3_engine::detector::find_match_groups;
///
/// let mut game = Game::seeded(Difficulty::Easy.config(), 42);
/// assert_eq!(game.state(), EngineState::Resolving);
///
/// let phases = game.resolve();
/// assert!(matches!(phases.last(), Some(Phase::Settled(_))));
/// assert_eq!(game.state(), EngineState::Idle);
/// assert!(find_match_groups(game.board()).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct Game<R: Rng = SmallRng> {
    board: Board,
    config: DifficultyConfig,
    rules: RoundRules,
    rng: R,
    state: EngineState,
    score: u32,
    combo: u32,
    work_progress: u32,
    completed_rounds: u32,
    initial_obstacles: usize,
    time_remaining: Duration,
    hint_cooldown: Duration,
    remaining_shuffles: u32,
    preferred_cell: Option<Cell>,
    settle_shuffles: usize,
}

impl Game<SmallRng> {
    /// Starts a round with a `SmallRng` seeded from `seed`.
    pub fn seeded(config: DifficultyConfig, seed: u64) -> Self {
        Game::new(config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// Starts a round on a freshly generated board with the configured obstacles.
    ///
    /// The game begins in `Resolving` so that the first `resolve` clears any match the
    /// generator let through and guarantees a move exists.
    pub fn new(config: DifficultyConfig, rng: R) -> Self {
        Game::with_rules(config, RoundRules::default(), rng)
    }

    /// Like `Game::new`, with explicit round rules.
    pub fn with_rules(config: DifficultyConfig, rules: RoundRules, mut rng: R) -> Self {
        let mut board = Board::generate(config.active_type_count, &mut rng);
        let layer = config.max_obstacle_layer;
        board.place_obstacles(config.obstacle_count, config.chain_count, layer, layer, &mut rng);

        let mut game = Game::from_parts(board, config, rules, rng);
        game.state = EngineState::Resolving;
        game
    }

    /// Starts a round on a caller-supplied board, `Idle` and with default round rules.
    ///
    /// Obstacles already on the board count as the initial obstacles.
    pub fn with_board(board: Board, config: DifficultyConfig, rng: R) -> Self {
        Game::from_parts(board, config, RoundRules::default(), rng)
    }

    fn from_parts(board: Board, config: DifficultyConfig, rules: RoundRules, rng: R) -> Self {
        Game {
            initial_obstacles: board.count_obstacle_cells(),
            time_remaining: config.duration(),
            remaining_shuffles: config.shuffle_tool_charges,
            board,
            config,
            rules,
            rng,
            state: EngineState::Idle,
            score: 0,
            combo: 0,
            work_progress: 0,
            completed_rounds: 0,
            hint_cooldown: Duration::ZERO,
            preferred_cell: None,
            settle_shuffles: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    pub fn rules(&self) -> &RoundRules {
        &self.rules
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Current cascade iteration count; 0 whenever no cascade is running.
    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn completed_rounds(&self) -> u32 {
        self.completed_rounds
    }

    /// Progress towards the next completed round.
    pub fn work_progress(&self) -> u32 {
        self.work_progress
    }

    pub fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    pub fn remaining_shuffles(&self) -> u32 {
        self.remaining_shuffles
    }

    pub fn hint_cooldown_remaining(&self) -> Duration {
        self.hint_cooldown
    }

    pub fn obstacles_remaining(&self) -> usize {
        self.board.count_obstacle_cells()
    }

    pub fn obstacles_cleared(&self) -> usize {
        self.initial_obstacles
            .saturating_sub(self.board.count_obstacle_cells())
    }

    pub fn is_goal_reached(&self) -> bool {
        self.config.goal.is_reached(
            self.score,
            self.config.target_score,
            self.obstacles_cleared(),
            self.config.target_obstacle_clear(),
        )
    }

    /// Attempts to swap two adjacent cells.
    ///
    /// An accepted swap leaves the game `Resolving`; drive it with `step` or `resolve`.
    pub fn try_swap(&mut self, a: Cell, b: Cell) -> SwapOutcome {
        if self.state != EngineState::Idle
            || !a.in_bounds()
            || !b.in_bounds()
            || !is_adjacent(a, b)
            || self.board.is_locked(a)
            || self.board.is_locked(b)
        {
            return SwapOutcome::Rejected;
        }

        self.board.swap_pieces(a, b);
        let is_special = |cell| self.board.get(cell).is_some_and(|p| p.is_special());
        let special_swap = is_special(a) || is_special(b);
        if !special_swap && find_match_groups(&self.board).is_empty() {
            self.board.swap_pieces(a, b);
            self.combo = 0;
            return SwapOutcome::Reverted;
        }

        self.begin_resolution(Some(b));
        let blast =
            special_swap.then(|| trigger_special_swap(&mut self.board, a, b, &mut self.rng));
        SwapOutcome::Accepted { blast }
    }

    /// Advances the pending cascade by one phase.
    ///
    /// # Returns
    /// `None` if nothing is resolving.
    pub fn step(&mut self) -> Option<Phase> {
        if self.state != EngineState::Resolving {
            return None;
        }

        let groups = find_match_groups(&self.board);
        if !groups.is_empty() {
            return Some(Phase::Cleared(self.clear_pass(groups)));
        }

        self.combo = 0;
        let has_move = has_any_possible_move(&self.board);
        if !has_move && self.settle_shuffles < MAX_SETTLE_SHUFFLES {
            self.settle_shuffles += 1;
            let safe = shuffle_board(&mut self.board, &mut self.rng);
            return Some(Phase::Shuffled { safe });
        }

        Some(Phase::Settled(self.settle(has_move)))
    }

    /// Runs `step` until the cascade settles and returns every phase in order.
    pub fn resolve(&mut self) -> Vec<Phase> {
        let mut phases = Vec::new();
        while let Some(phase) = self.step() {
            phases.push(phase);
        }
        phases
    }

    /// Advances the round clock and the hint cooldown by `dt`.
    ///
    /// Running out of time ends the round immediately when `Idle`, or at the next settle
    /// when a cascade is in progress.
    pub fn tick(&mut self, dt: Duration) {
        if self.state == EngineState::Finished {
            return;
        }
        self.time_remaining = self.time_remaining.saturating_sub(dt);
        self.hint_cooldown = self.hint_cooldown.saturating_sub(dt);
        if self.time_remaining.is_zero() && self.state == EngineState::Idle {
            self.state = EngineState::Finished;
        }
    }

    /// Spends a shuffle charge to rearrange the board, then leaves the game `Resolving`.
    ///
    /// Returns `false` without doing anything unless the game is `Idle` with a charge left.
    pub fn use_shuffle_tool(&mut self) -> bool {
        if self.state != EngineState::Idle || self.remaining_shuffles == 0 {
            return false;
        }
        self.remaining_shuffles -= 1;
        shuffle_board(&mut self.board, &mut self.rng);
        self.begin_resolution(None);
        true
    }

    /// Looks up the best swap and restarts the hint cooldown.
    ///
    /// Returns `None` unless the game is `Idle` and the cooldown has expired. The returned
    /// hint may have `found == false` if the board has no move.
    pub fn use_hint_tool(&mut self) -> Option<MoveHint> {
        if self.state != EngineState::Idle || !self.hint_cooldown.is_zero() {
            return None;
        }
        self.hint_cooldown = self.rules.hint_cooldown();
        Some(find_best_move_hint(&self.board))
    }

    pub fn summary(&self) -> RoundSummary {
        let base_fee = self.completed_rounds * self.rules.base_fee_per_round;
        let score_bonus_fee = (self.score as f64 * self.rules.fee_multiplier).floor() as u32;
        RoundSummary {
            score: self.score,
            completed_rounds: self.completed_rounds,
            obstacles_cleared: self.obstacles_cleared(),
            target_obstacle_clear: self.config.target_obstacle_clear(),
            goal_reached: self.is_goal_reached(),
            base_fee,
            score_bonus_fee,
            earned_fee: base_fee + score_bonus_fee,
        }
    }

    fn begin_resolution(&mut self, preferred_cell: Option<Cell>) {
        self.state = EngineState::Resolving;
        self.preferred_cell = preferred_cell;
        self.settle_shuffles = 0;
        self.combo = 0;
    }

    fn clear_pass(&mut self, groups: Vec<MatchGroup>) -> ClearPhase {
        self.combo += 1;

        let mut clear: BTreeSet<Cell> = groups
            .iter()
            .flat_map(|g| g.cells.iter().copied())
            .collect();
        // Only the first iteration after a swap prefers the swap target.
        let plan = plan_special_creation(&groups, self.preferred_cell.take());
        for cell in plan.keys() {
            clear.remove(cell);
        }

        expand_triggered_specials(&self.board, &mut clear);
        let hits = apply_obstacle_damage(&mut self.board, &mut clear);

        let score_gained = score_groups(&groups, self.combo, self.config.score_multiplier);
        self.score += score_gained;
        let rounds_completed = add_work_progress(
            &mut self.work_progress,
            score_gained,
            self.rules.progress_per_round,
        );
        self.completed_rounds += rounds_completed;

        let delta = clear_and_refill(&mut self.board, clear, hits, &mut self.rng);
        let created = materialize_plan(&mut self.board, &plan, &mut self.rng);

        ClearPhase {
            combo: self.combo,
            groups,
            created,
            score_gained,
            rounds_completed,
            delta,
        }
    }

    fn settle(&mut self, has_move: bool) -> SettleReport {
        self.preferred_cell = None;
        self.settle_shuffles = 0;

        let goal_reached = self.is_goal_reached();
        let time_up = self.time_remaining.is_zero();
        self.state = if goal_reached || time_up {
            EngineState::Finished
        } else {
            EngineState::Idle
        };

        SettleReport {
            score: self.score,
            completed_rounds: self.completed_rounds,
            obstacles_remaining: self.obstacles_remaining(),
            obstacles_cleared: self.obstacles_cleared(),
            has_move,
            goal_reached,
            time_up,
            state: self.state,
        }
    }
}
