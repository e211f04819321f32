use clap::Parser;
use match3_engine::board::Cell;
use match3_engine::difficulty::Difficulty;
use match3_engine::engine::{EngineState, Game, Phase, SwapOutcome};
use std::io::{self, Write};
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play a match-3 round in the terminal", long_about = None)]
struct Args {
    #[clap(short, long, value_enum, default_value = "easy")]
    difficulty: Difficulty,

    /// Seed for board generation and refills (random if omitted)
    #[clap(short, long)]
    seed: Option<u64>,
}

fn print_phases(phases: &[Phase]) {
    for phase in phases {
        match phase {
            Phase::Cleared(clear) => {
                println!(
                    "Combo x{}: {} group(s), {} cleared, +{}",
                    clear.combo,
                    clear.groups.len(),
                    clear.delta.cleared.len(),
                    clear.score_gained
                );
                for (cell, piece) in &clear.created {
                    println!("  Created {:?} at {}", piece.special, cell);
                }
            }
            Phase::Shuffled { .. } => println!("No moves left, board shuffled."),
            Phase::Settled(_) => {}
        }
    }
}

fn parse_swap(parts: &[&str]) -> Option<(Cell, Cell)> {
    let nums: Vec<usize> = parts.iter().map(|p| p.parse().ok()).collect::<Option<_>>()?;
    match nums.as_slice() {
        [x1, y1, x2, y2] => Some((Cell::new(*x1, *y1), Cell::new(*x2, *y2))),
        _ => None,
    }
}

fn main() {
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut game = Game::seeded(args.difficulty.config(), seed);
    game.resolve();

    println!("Welcome to Match-3! ({}, seed {})", args.difficulty.name(), seed);
    let mut highlight: Vec<Cell> = Vec::new();
    let mut last_tick = Instant::now();

    loop {
        game.tick(last_tick.elapsed());
        last_tick = Instant::now();

        println!("---------------------");
        println!(
            "Score: {}, Rounds: {}, Obstacles: {}/{}, Time: {}s, Shuffles: {}",
            game.score(),
            game.completed_rounds(),
            game.obstacles_cleared(),
            game.config().target_obstacle_clear(),
            game.time_remaining().as_secs(),
            game.remaining_shuffles()
        );
        println!("{}", game.board().to_string_with_highlight(&highlight));
        highlight.clear();

        if game.state() == EngineState::Finished {
            let summary = game.summary();
            println!();
            println!("---------------------");
            println!(
                "ROUND OVER! {}",
                if summary.goal_reached { "Goal reached!" } else { "Time's up." }
            );
            println!("Score: {}", summary.score);
            println!(
                "Obstacles cleared: {}/{}",
                summary.obstacles_cleared, summary.target_obstacle_clear
            );
            println!("Completed rounds: {}", summary.completed_rounds);
            println!(
                "Fee: {} base + {} score bonus = {}",
                summary.base_fee, summary.score_bonus_fee, summary.earned_fee
            );
            println!("---------------------");
            break;
        }

        print!("Enter a swap (x1 y1 x2 y2), 's' to shuffle, 'h' for a hint, 'q' to quit: ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => {
                println!("Error reading input. Please try again.");
                continue;
            }
        }

        let trimmed_input = input.trim();
        match trimmed_input {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "s" => {
                if game.use_shuffle_tool() {
                    print_phases(&game.resolve());
                    println!("Board shuffled.");
                } else {
                    println!("No shuffle charges left.");
                }
                continue;
            }
            "h" => {
                match game.use_hint_tool() {
                    Some(hint) if hint.found => {
                        println!("Try swapping {} and {}.", hint.from, hint.to);
                        highlight = vec![hint.from, hint.to];
                    }
                    Some(_) => println!("No move available."),
                    None => println!(
                        "Hint is cooling down ({}s left).",
                        game.hint_cooldown_remaining().as_secs() + 1
                    ),
                }
                continue;
            }
            _ => {}
        }

        let parts: Vec<&str> = trimmed_input.split_whitespace().collect();
        let Some((a, b)) = parse_swap(&parts) else {
            println!("Invalid input format. Use 'x1 y1 x2 y2', 's', 'h' or 'q'.");
            continue;
        };

        match game.try_swap(a, b) {
            SwapOutcome::Rejected => {
                println!("Invalid swap: cells must be adjacent, on the board and not chained.")
            }
            SwapOutcome::Reverted => println!("No match, swap undone."),
            SwapOutcome::Accepted { blast } => {
                if let Some(blast) = blast {
                    println!("Special blast cleared {} cell(s)!", blast.cleared.len());
                }
                print_phases(&game.resolve());
            }
        }
    }
}
