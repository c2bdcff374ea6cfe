//! An agent to play Connect 4 positions

use anyhow::{bail, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, info};

use std::time::{Duration, Instant};

use crate::board::{Board, Move, Player};
use crate::evaluation::{
    evaluate, is_proven, terminal_score, to_points, Score, Weights, INFINITY, WIN_SCORE,
};
use crate::position::Position;
use crate::transposition_table::{Probe, TranspositionTable};
use crate::zobrist::ZobristKeys;

/// Wall clock time a search may start new depth iterations in
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(600);

/// Spread of the tie break between equally scored moves, in list positions
const TIE_BREAK_SD: f64 = 1.5;

/// Settings for a `Solver`
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// No new depth iteration is started once this much time has passed
    pub time_budget: Duration,
    /// Deepest iteration to run, the number of empty cells if `None`
    pub depth_limit: Option<usize>,
    pub weights: Weights,
    /// Seed of the random source, drawn from the OS if `None`
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            depth_limit: None,
            weights: Weights::default(),
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = Some(depth_limit);
        self
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// The result of a search
#[derive(Clone, Debug)]
pub struct Thought {
    /// The move picked among the candidates
    pub best_move: Option<Move>,
    /// All first moves sharing the best score, in move order
    pub candidates: Vec<Move>,
    /// The score of the candidates, from the point of view of the player to move
    pub score: Score,
    /// The deepest completed iteration
    pub depth: usize,
    /// Nodes searched in the deepest completed iteration (for diagnostics only)
    pub node_count: usize,
    pub elapsed: Duration,
}

impl Thought {
    /// Number of moves until the game ends with best play, if the score is proven
    pub fn plies_to_end(&self) -> Option<usize> {
        if !is_proven(self.score) {
            return None;
        }
        // proven scores are `WIN_SCORE * (d + 1)` with `d` the depth left at the end
        let remaining = (self.score.abs() / WIN_SCORE) as usize - 1;
        Some(self.depth - remaining)
    }
}

/// An agent to choose moves in Connect 4 positions
///
/// # Notes
/// This agent runs an iterative deepening minimax search with alpha-beta pruning.
/// Positions are hashed with Zobrist keys and bounds on their scores are kept in a
/// transposition table for the length of one depth iteration. Positions at the
/// search frontier are scored by [`evaluate`].
///
/// # Position Scoring
/// Scores are given from the point of view of the player to move at the root.
/// A won game scores `WIN_SCORE * (d + 1)` where `d` is the search depth left
/// when the win was found, so quicker wins score higher and quicker losses lower.
/// A drawn game scores 0.
pub struct Solver {
    config: SearchConfig,
    keys: ZobristKeys,
    transposition_table: TranspositionTable,
    rng: ChaCha8Rng,

    /// The number of nodes searched by the last depth iteration (for diagnostics only)
    pub node_count: usize,
}

impl Solver {
    /// Creates a new `Solver` for boards of the given dimensions
    pub fn new(cols: usize, rows: usize, config: SearchConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let keys = ZobristKeys::new(cols, rows, &mut rng);
        Self {
            config,
            keys,
            transposition_table: TranspositionTable::new(),
            rng,
            node_count: 0,
        }
    }

    pub fn keys(&self) -> &ZobristKeys {
        &self.keys
    }

    /// Creates a search root hashed with this solver's keys
    ///
    /// Fails if the board doesn't have the dimensions the solver was made for.
    pub fn root(&self, board: Board, current: Player) -> Result<Position> {
        Position::root(board, current, &self.keys)
    }

    /// Searches a board with `current` to move
    pub fn think_board(&mut self, board: &Board, current: Player) -> Result<Thought> {
        let mut root = self.root(board.clone(), current)?;
        self.think(&mut root)
    }

    /// Chooses a move for the root position with iterative deepening
    pub fn think(&mut self, root: &mut Position) -> Result<Thought> {
        self._think(root, false)
    }

    /// Chooses a move for the root position with iterative deepening, logging every depth at `info` level
    pub fn think_verbose(&mut self, root: &mut Position) -> Result<Thought> {
        self._think(root, true)
    }

    fn _think(&mut self, root: &mut Position, verbose: bool) -> Result<Thought> {
        let start = Instant::now();
        let board = root.board();

        if board.cols() != self.keys.cols() || board.rows() != self.keys.rows() {
            bail!(
                "Invalid position, board is {}x{} but the solver plays on {}x{}",
                board.cols(),
                board.rows(),
                self.keys.cols(),
                self.keys.rows()
            );
        }
        if root.is_won() || board.winner().is_some() || board.is_full() {
            bail!("No legal placement, game is over");
        }

        let max_depth = match self.config.depth_limit {
            Some(limit) => limit.max(1).min(board.empty_cells()),
            None => board.empty_cells(),
        };
        let mut search = Search {
            keys: &self.keys,
            transposition_table: &mut self.transposition_table,
            weights: self.config.weights,
            me: root.current,
            node_count: 0,
        };
        // the first ply is kept for the whole call so its scores can be reported
        let mut children: Vec<Position> = root.children(search.keys).collect();

        let mut depth = 1;
        let mut thought = loop {
            search.transposition_table.clear();
            search.node_count = 0;

            let (score, candidates) = search.top_level_search(&mut children, depth);
            let elapsed = start.elapsed();

            if verbose {
                info!(
                    depth,
                    max_depth,
                    score = to_points(score),
                    candidates = candidates.len(),
                    nodes = search.node_count,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Search depth complete"
                );
            } else {
                debug!(
                    depth,
                    max_depth,
                    score = to_points(score),
                    candidates = candidates.len(),
                    nodes = search.node_count,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Search depth complete"
                );
            }

            // a depth is always finished, the budget is only checked between depths
            if elapsed >= self.config.time_budget || depth >= max_depth || is_proven(score) {
                break Thought {
                    best_move: None,
                    candidates,
                    score,
                    depth,
                    node_count: search.node_count,
                    elapsed,
                };
            }
            depth += 1;
        };
        self.node_count = thought.node_count;

        root.score = Some(thought.score);
        thought.best_move = pick_candidate(&thought.candidates, &mut self.rng)?;
        thought.elapsed = start.elapsed();
        Ok(thought)
    }
}

/// State of one depth iteration
struct Search<'a> {
    keys: &'a ZobristKeys,
    transposition_table: &'a mut TranspositionTable,
    weights: Weights,
    // the player to move at the root, all scores are from their point of view
    me: Player,
    node_count: usize,
}

impl Search<'_> {
    /// Scores every first move, returning the best score and all moves that reach it
    fn top_level_search(&mut self, children: &mut [Position], depth: usize) -> (Score, Vec<Move>) {
        self.node_count += 1;

        let mut best = -INFINITY;
        let mut candidates = Vec::new();
        for child in children.iter_mut() {
            // searching one unit below the best score makes ties exact scores instead of bounds
            let score = self.minimax(child, depth - 1, best - 1, INFINITY, false);
            child.score = Some(score);

            if let Some(played) = child.last_move {
                if score > best {
                    best = score;
                    candidates.clear();
                    candidates.push(played);
                } else if score == best {
                    candidates.push(played);
                }
            }
        }
        (best, candidates)
    }

    /// Performs game tree search below the first ply
    ///
    /// Returns the score of the position (see [Position Scoring])
    ///
    /// [Position Scoring]: struct.Solver.html#position-scoring
    fn minimax(&mut self, node: &Position, depth: usize, alpha: Score, beta: Score, maximizing: bool) -> Score {
        self.node_count += 1;

        let (alpha, beta) = match self.transposition_table.probe(node.hash, alpha, beta) {
            Probe::Cutoff(score) => return score,
            Probe::Window(alpha, beta) => (alpha, beta),
        };

        // terminal and frontier scores are not stored in the table
        if node.is_won() {
            return terminal_score(node.previous, self.me, depth);
        }
        if node.is_draw() {
            return 0;
        }
        if depth == 0 {
            return evaluate(node.board(), self.me, &self.weights);
        }

        let keys = self.keys;
        let record = if maximizing {
            let mut best = -INFINITY;
            let mut running_alpha = alpha;
            for child in node.children(keys) {
                let score = self.minimax(&child, depth - 1, running_alpha, beta, false);
                best = best.max(score);
                running_alpha = running_alpha.max(score);
                // the opponent will avoid this branch
                if beta < running_alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = INFINITY;
            let mut running_beta = beta;
            for child in node.children(keys) {
                let score = self.minimax(&child, depth - 1, alpha, running_beta, true);
                best = best.min(score);
                running_beta = running_beta.min(score);
                if running_beta < alpha {
                    break;
                }
            }
            best
        };

        self.transposition_table.store(node.hash, record, alpha, beta);
        record
    }
}

/// Picks one of the equally scored moves, preferring the middle of the list
///
/// The index is drawn from a normal distribution centered on the middle
/// candidate, then rounded and clamped to the list.
pub fn pick_candidate<R: Rng + ?Sized>(candidates: &[Move], rng: &mut R) -> Result<Option<Move>> {
    if candidates.is_empty() {
        return Ok(None);
    }
    let last = (candidates.len() - 1) as f64;
    let index = Normal::new(last / 2.0, TIE_BREAK_SD)?.sample(rng).round();
    Ok(Some(candidates[index.max(0.0).min(last) as usize]))
}
