//! Property tests over generated seeds.
//!
//! Invariants covered:
//! - A freshly initialized board holds no match.
//! - A shuffle that reports success leaves no match and at least one move.
//! - Gravity leaves no empty cell below a piece and moves nothing but pieces.
//! - Obstacle layers only ever go down during play.
//! - Every settled board is full and match-free.
use match3_engine::autoplay::play_greedy;
use match3_engine::board::{Board, Cell, HEIGHT, WIDTH};
use match3_engine::detector::{
    find_best_move_hint, find_match_groups, has_any_possible_move, shuffle_board,
};
use match3_engine::difficulty::Difficulty;
use match3_engine::engine::{EngineState, Game, Phase, SwapOutcome};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn layers(board: &Board) -> Vec<(u8, u8)> {
    Cell::all().map(|c| (board.ice(c), board.chain(c))).collect()
}

fn difficulty_from(index: usize) -> Difficulty {
    Difficulty::ALL[index % Difficulty::ALL.len()]
}

proptest! {
    #[test]
    fn init_produces_no_match(seed in any::<u64>(), type_count in 5u8..=6) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let board = Board::generate(type_count, &mut rng);
        prop_assert!(board.is_full());
        prop_assert!(find_match_groups(&board).is_empty());
    }

    #[test]
    fn successful_shuffle_is_safe(seed in any::<u64>(), type_count in 4u8..=6) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = Board::generate(type_count, &mut rng);
        let before = board.clone();
        if shuffle_board(&mut board, &mut rng) {
            prop_assert!(find_match_groups(&board).is_empty());
            prop_assert!(has_any_possible_move(&board));
        }
        prop_assert!(board.is_full());
        prop_assert_eq!(layers(&board), layers(&before));
    }

    #[test]
    fn gravity_compacts_columns(seed in any::<u64>(), holes in prop::collection::vec((0..WIDTH, 0..HEIGHT), 0..40)) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = Board::generate(6, &mut rng);
        for &(x, y) in &holes {
            board.remove_piece(Cell::new(x, y));
        }
        let pieces_before = WIDTH * HEIGHT - board.empty_count();
        let falls = board.apply_gravity();

        prop_assert_eq!(WIDTH * HEIGHT - board.empty_count(), pieces_before);
        for fall in &falls {
            prop_assert_eq!(fall.from.x, fall.to.x);
            prop_assert!(fall.to.y < fall.from.y);
        }
        for x in 0..WIDTH {
            let mut seen_empty = false;
            for y in 0..HEIGHT {
                let occupied = board.get(Cell::new(x, y)).is_some();
                prop_assert!(!(seen_empty && occupied), "gap below ({}, {})", x, y);
                seen_empty |= !occupied;
            }
        }

        let refilled = board.refill(&mut rng);
        prop_assert_eq!(refilled.len(), WIDTH * HEIGHT - pieces_before);
        prop_assert!(board.is_full());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn play_keeps_obstacles_monotonic_and_settles_full(
        seed in any::<u64>(),
        difficulty in 0usize..3,
        moves in 1usize..25,
    ) {
        let config = difficulty_from(difficulty).config();
        let max_layer = config.max_obstacle_layer;
        let mut game = Game::seeded(config, seed);
        prop_assert!(layers(game.board()).iter().all(|&(i, c)| i <= max_layer && c <= max_layer));

        for _ in 0..moves {
            let before = layers(game.board());
            let phases = game.resolve();
            let after = layers(game.board());
            for (b, a) in before.iter().zip(after.iter()) {
                prop_assert!(a.0 <= b.0 && a.1 <= b.1);
            }
            if let Some(Phase::Settled(report)) = phases.last() {
                prop_assert_eq!(report.state, game.state());
                prop_assert_eq!(report.obstacles_remaining, game.board().count_obstacle_cells());
            }

            prop_assert!(game.board().is_full());
            prop_assert!(find_match_groups(game.board()).is_empty());
            prop_assert_eq!(game.combo(), 0);
            if game.state() != EngineState::Idle {
                break;
            }

            let hint = find_best_move_hint(game.board());
            if !hint.found {
                break;
            }
            let score = game.score();
            let outcome = game.try_swap(hint.from, hint.to);
            prop_assert!(matches!(outcome, SwapOutcome::Accepted { .. }), "expected SwapOutcome::Accepted");
            prop_assert_eq!(game.state(), EngineState::Resolving);
            prop_assert_eq!(game.score(), score);
        }
    }

    #[test]
    fn greedy_summary_matches_game(seed in any::<u64>(), difficulty in 0usize..3) {
        let mut game = Game::seeded(difficulty_from(difficulty).config(), seed);
        let report = play_greedy(&mut game, 15);
        prop_assert_eq!(report.summary, game.summary());
        prop_assert!(report.moves.len() <= 15);
        prop_assert_eq!(
            report.summary.earned_fee,
            report.summary.base_fee + report.summary.score_bonus_fee
        );
        prop_assert!(game.board().is_full());
    }
}
