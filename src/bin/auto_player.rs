use clap::Parser;
use match3_engine::detector::find_best_move_hint;
use match3_engine::difficulty::{load_settings, Difficulty, RoundRules};
use match3_engine::engine::{EngineState, Game, Phase, SwapOutcome};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play one round with the greedy hint strategy", long_about = None)]
struct Args {
    #[clap(short, long, value_enum, default_value = "medium")]
    difficulty: Difficulty,

    #[clap(short, long, default_value_t = 514514)]
    seed: u64,

    /// Stop after this many swaps
    #[clap(short, long, default_value_t = 50)]
    max_moves: usize,

    /// JSON settings file overriding the difficulty preset
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Print every phase of every cascade
    #[clap(short, long)]
    verbose: bool,
}

fn print_phase(phase: &Phase) {
    match phase {
        Phase::Cleared(clear) => {
            println!(
                "  combo {}: {} group(s), cleared {}, chain hits {}, ice hits {}, falls {}, refilled {}, +{}",
                clear.combo,
                clear.groups.len(),
                clear.delta.cleared.len(),
                clear.delta.chain_hits.len(),
                clear.delta.ice_hits.len(),
                clear.delta.falls.len(),
                clear.delta.refilled.len(),
                clear.score_gained
            );
            for (cell, piece) in &clear.created {
                println!("    created {:?} at {}", piece.special, cell);
            }
            if clear.rounds_completed > 0 {
                println!("    completed {} round(s)", clear.rounds_completed);
            }
        }
        Phase::Shuffled { safe } => println!("  shuffled (safe: {})", safe),
        Phase::Settled(report) => println!(
            "  settled: score {}, obstacles left {}, state {:?}",
            report.score, report.obstacles_remaining, report.state
        ),
    }
}

fn main() {
    let args = Args::parse();

    let (config, rules) = match &args.config {
        Some(path) => match load_settings(path) {
            Ok(settings) => (settings.difficulty, settings.rules),
            Err(e) => {
                eprintln!("Failed to load settings from {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => (args.difficulty.config(), RoundRules::default()),
    };

    let mut game = Game::with_rules(config, rules, SmallRng::seed_from_u64(args.seed));
    let initial = game.resolve();
    println!("Seed {}, initial board:\n{}", args.seed, game.board());
    if args.verbose {
        initial.iter().for_each(print_phase);
    }

    let mut moves = 0;
    while game.state() == EngineState::Idle && moves < args.max_moves {
        let hint = find_best_move_hint(game.board());
        if !hint.found {
            println!("No move left.");
            break;
        }

        moves += 1;
        println!("Move {}: swap {} and {}", moves, hint.from, hint.to);
        if let SwapOutcome::Accepted { blast: Some(blast) } = game.try_swap(hint.from, hint.to) {
            if args.verbose {
                println!("  blast cleared {}", blast.cleared.len());
            }
        }
        let phases = game.resolve();
        if args.verbose {
            phases.iter().for_each(print_phase);
            println!("{}", game.board());
        }
    }

    let summary = game.summary();
    println!("\nFinal board state:\n{}", game.board());
    println!("Moves: {}", moves);
    println!("Score: {}", summary.score);
    println!(
        "Obstacles cleared: {}/{}",
        summary.obstacles_cleared, summary.target_obstacle_clear
    );
    println!("Goal reached: {}", summary.goal_reached);
    println!("Completed rounds: {}", summary.completed_rounds);
    println!(
        "Fee: {} base + {} score bonus = {}",
        summary.base_fee, summary.score_bonus_fee, summary.earned_fee
    );
}
