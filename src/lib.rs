//! # Tile Puzzles Library
//!
//! Pure rule engines for two casual tile games, plus the session, stats and
//! autoplay layers the command-line binaries are built on.
//!
//! It is used by three binaries:
//! - `match3_player`: an interactive swap-and-match game on a refilling grid.
//! - `stack_player`: an interactive layered "pick three of a kind" game.
//! - `autoplay_evaluator`: plays many seeded games with the `autoplay`
//!   strategies and reports win rates.
//!
//! ## Modules
//! - `match3`: the grid (`Board`), the refill `Bag`, match detection, cascades
//!   and swap validation.
//! - `stack`: seeded layout generation, selectability, taking tiles and
//!   resolving the buffer.
//! - `session`: per-game counters, move limits and win/loss status on top of
//!   the two engines.
//! - `stats`: aggregate play statistics in a key-value store.
//! - `autoplay`: simple automatic strategies for both games.
//! - `rng`: the portable seeded generator used for stack layouts.
//! - `logger`: a stderr backend for the `log` facade.
//! - `utils`: parsing grid boards from text rows.

pub mod autoplay;
pub mod logger;
pub mod match3;
pub mod rng;
pub mod session;
pub mod stack;
pub mod stats;
pub mod utils;
