//! # Match-3 Engine Library
//!
//! This library provides the resolution engine of an 8x8 match-3 puzzle: board model,
//! match detection, cascade resolution with special pieces and obstacles, hint search,
//! board shuffling and scoring.
//!
//! It is used by three binaries:
//! - `human_player`: Interactive play on the command line.
//! - `auto_player`: Plays one seeded round with the greedy hint strategy and prints every
//!   phase of every cascade.
//! - `difficulty_evaluator`: Averages greedy rounds over many seeds for each difficulty.
//!
//! ## Modules
//! - `board`: Cells, pieces, special kinds and the `Board` with its obstacle layers,
//!   gravity and refill.
//! - `detector`: Match groups, move search, shuffling and hints.
//! - `cascade`: The individual steps of a cascade iteration.
//! - `engine`: The `Game` state machine driving swaps, cascades, tools and the round clock.
//! - `difficulty`: Difficulty presets, round rules, scoring and settings files.
//! - `autoplay`: A greedy player built on the hint search.
//! - `error`: Error types for parsing and configuration.
//! - `utils`: Text board parsing and printing.

pub mod autoplay;
pub mod board;
pub mod cascade;
pub mod detector;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod utils;
