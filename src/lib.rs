//! A game tree search engine for playing the board game 'Connect 4'
//!
//! The engine runs an iterative-deepening minimax search with alpha-beta
//! pruning, a Zobrist-keyed transposition table and a heuristic evaluation
//! of the frontier, and picks a strong move within a time or depth budget.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_search::{notation, solver::{SearchConfig, Solver}};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // player one ('r') has three in a row on the bottom and is to move
//! let (board, player) = notation::parse("7/7/7/7/yyy4/rrr4 r")?;
//!
//! let mut solver = Solver::new(
//!     board.cols(),
//!     board.rows(),
//!     SearchConfig::default().with_depth_limit(4).with_seed(7),
//! );
//! let mut root = solver.root(board, player)?;
//! let thought = solver.think(&mut root)?;
//!
//! assert_eq!(thought.best_move.map(|m| m.column), Some(3));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod board;

pub mod zobrist;

pub mod transposition_table;

pub mod position;

pub mod evaluation;

pub mod solver;

pub mod notation;

pub mod game;

pub mod arena;


pub use board::{move_order, Board, Cell, Move, Player};
pub use evaluation::{Score, Weights};
pub use game::{Game, GameState};
pub use position::Position;
pub use solver::{SearchConfig, Solver, Thought};

/// The default width of the game board in tiles
pub const WIDTH: usize = 7;

/// The default height of the game board in tiles
pub const HEIGHT: usize = 6;

/// The number of aligned tiles needed to win
pub const CONNECT: usize = 4;

// a winning line has to fit on the default board in every direction
const_assert!(WIDTH >= CONNECT && HEIGHT >= CONNECT);
