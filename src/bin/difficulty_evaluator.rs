use clap::Parser;
use match3_engine::autoplay::{play_greedy, StopReason};
use match3_engine::difficulty::Difficulty;
use match3_engine::engine::Game;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Compare difficulties with greedy playouts", long_about = None)]
struct Args {
    /// Rounds played per difficulty
    #[clap(short, long, default_value_t = 20)]
    rounds: u64,

    #[clap(short, long, default_value_t = 0)]
    start_seed: u64,

    /// Swap cap per round
    #[clap(short, long, default_value_t = 40)]
    max_moves: usize,
}

#[derive(Default)]
struct Totals {
    score: u64,
    moves: usize,
    goals: usize,
    fee: u64,
    obstacles_cleared: usize,
    best_combo: u32,
    stuck: usize,
}

fn main() {
    let args = Args::parse();
    println!(
        "Evaluating {} rounds per difficulty (seeds {}..{}, at most {} moves each)...",
        args.rounds,
        args.start_seed,
        args.start_seed + args.rounds,
        args.max_moves
    );

    let mut averages: Vec<(Difficulty, f64)> = Vec::new();
    for difficulty in Difficulty::ALL {
        let mut totals = Totals::default();
        println!("\n{}", difficulty.name());

        for seed in args.start_seed..args.start_seed + args.rounds {
            let mut game = Game::seeded(difficulty.config(), seed);
            let report = play_greedy(&mut game, args.max_moves);
            let summary = report.summary;
            println!(
                "  Seed: {:<6} Score: {:<6} Moves: {:<4} Goal: {:<5} Obstacles: {}/{}",
                seed,
                summary.score,
                report.moves.len(),
                summary.goal_reached,
                summary.obstacles_cleared,
                summary.target_obstacle_clear
            );

            totals.score += summary.score as u64;
            totals.moves += report.moves.len();
            totals.fee += summary.earned_fee as u64;
            totals.obstacles_cleared += summary.obstacles_cleared;
            totals.best_combo = totals.best_combo.max(report.best_combo);
            if summary.goal_reached {
                totals.goals += 1;
            }
            if report.stop == StopReason::NoMove {
                totals.stuck += 1;
            }
        }

        let n = args.rounds.max(1) as f64;
        let avg_score = totals.score as f64 / n;
        println!("  Average score: {:.2}", avg_score);
        println!("  Average moves: {:.2}", totals.moves as f64 / n);
        println!(
            "  Average obstacles cleared: {:.2}",
            totals.obstacles_cleared as f64 / n
        );
        println!("  Average fee: {:.2}", totals.fee as f64 / n);
        println!("  Goal rate: {}/{}", totals.goals, args.rounds);
        println!("  Best combo: {}", totals.best_combo);
        if totals.stuck > 0 {
            eprintln!("  Warning: {} round(s) ran out of moves", totals.stuck);
        }
        averages.push((difficulty, avg_score));
    }

    println!("\n--- Average Scores ---");
    for (difficulty, avg_score) in averages {
        println!("{:<8}: {:.2}", difficulty.name(), avg_score);
    }
}
