use rustc_hash::FxHashMap;

use crate::evaluation::Score;

/// Bounds on the minimax value of a position, as far as they are known
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct Bounds {
    pub lower: Option<Score>,
    pub upper: Option<Score>,
}

/// Outcome of looking a position up before searching it
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Probe {
    /// A stored bound already falls outside the window, no search needed
    Cutoff(Score),
    /// The window to search with, narrowed by any stored bounds
    Window(Score, Score),
}

/// Map from position hash to the bounds found by earlier searches
///
/// Hash collisions are not detected, two positions sharing a hash share bounds.
#[derive(Clone, Default)]
pub struct TranspositionTable {
    entries: FxHashMap<u64, Bounds>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: u64) -> Option<Bounds> {
        self.entries.get(&key).copied()
    }

    /// Checks the stored bounds of `key` against the window `[alpha, beta]`
    pub fn probe(&self, key: u64, mut alpha: Score, mut beta: Score) -> Probe {
        let bounds = match self.entries.get(&key) {
            Some(bounds) => bounds,
            None => return Probe::Window(alpha, beta),
        };
        if let Some(lower) = bounds.lower {
            // fail high
            if lower >= beta {
                return Probe::Cutoff(lower);
            }
            alpha = alpha.max(lower);
        }
        if let Some(upper) = bounds.upper {
            // fail low
            if upper <= alpha {
                return Probe::Cutoff(upper);
            }
            beta = beta.min(upper);
        }
        Probe::Window(alpha, beta)
    }

    /// Records the result of fully searching `key` with the window `[alpha, beta]`
    ///
    /// A result at or below `alpha` only bounds the value from above, one at or
    /// above `beta` only from below. Anything in between is the exact value.
    pub fn store(&mut self, key: u64, record: Score, alpha: Score, beta: Score) {
        let bounds = self.entries.entry(key).or_default();
        if record <= alpha {
            bounds.upper = Some(record);
        } else if record >= beta {
            bounds.lower = Some(record);
        } else {
            bounds.lower = Some(record);
            bounds.upper = Some(record);
        }
    }
}
