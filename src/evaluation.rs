//! Scoring of terminal and frontier positions

use anyhow::{anyhow, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use std::io::{Read, Write};

use crate::board::{Board, Player, DIRECTIONS};
use crate::CONNECT;

/// A position score in fixed point, 1 unit = 10^-7
pub type Score = i64;

/// Number of score units per whole point
pub const SCORE_SCALE: Score = 10_000_000;

/// The score of a win found with no search depth remaining
pub const WIN_SCORE: Score = 10_000 * SCORE_SCALE;

/// Larger than any reachable score
pub const INFINITY: Score = Score::MAX / 2;

/// Standard deviation of the noise added by [`Weights::mutate`]
const MUTATION_SD: f64 = 0.2;

/// Scaling applied to lines of four held by a single player
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Weights {
    /// Reward for lines only the evaluated player has tiles in
    pub own: f64,
    /// Penalty for lines only the opponent has tiles in
    pub opponent: f64,
}

impl Default for Weights {
    fn default() -> Self {
        // threats against us are valued slightly above our own chances
        Self {
            own: 1.0,
            opponent: 1.1,
        }
    }
}

impl Weights {
    pub fn new(own: f64, opponent: f64) -> Self {
        Self { own, opponent }
    }

    /// Adds gaussian noise to every weight
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let noise = Normal::new(0.0, MUTATION_SD)?;
        self.own += noise.sample(rng);
        self.opponent += noise.sample(rng);
        Ok(())
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_f64::<BigEndian>(self.own)?;
        writer.write_f64::<BigEndian>(self.opponent)?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let own = reader.read_f64::<BigEndian>()?;
        let opponent = reader.read_f64::<BigEndian>()?;
        if !own.is_finite() || !opponent.is_finite() {
            return Err(anyhow!("invalid weights: {}, {}", own, opponent));
        }
        Ok(Self { own, opponent })
    }
}

/// Scores a finished game won by `winner` for `me`
///
/// Wins found with more search depth remaining are closer to the root and score higher
pub fn terminal_score(winner: Player, me: Player, depth_remaining: usize) -> Score {
    let score = WIN_SCORE * (depth_remaining as Score + 1);
    if winner == me {
        score
    } else {
        -score
    }
}

/// Whether a score comes from a forced win or loss rather than the heuristic
pub fn is_proven(score: Score) -> bool {
    score != 0 && score % WIN_SCORE == 0
}

/// Converts a score to points for display
pub fn to_points(score: Score) -> f64 {
    score as f64 / SCORE_SCALE as f64
}

/// Heuristic score of a non-terminal position from the point of view of `me`
///
/// Every window of four cells in a line is visited once. A window holding `n`
/// tiles of a single player scores `n^2`, scaled by the weight of that player.
/// Windows shared by both players, or empty ones, are worth nothing. The
/// result is rounded to the score resolution so equal positions compare equal.
pub fn evaluate(board: &Board, me: Player, weights: &Weights) -> Score {
    let (own, opponent) = (Some(me), Some(me.other()));
    let reach = CONNECT as isize - 1;
    let mut own_sum: i64 = 0;
    let mut opponent_sum: i64 = 0;

    for &(dc, dr) in DIRECTIONS.iter() {
        for column in 0..board.cols() as isize {
            for row in 0..board.rows() as isize {
                let (end_column, end_row) = (column + reach * dc, row + reach * dr);
                if end_column < 0
                    || end_column >= board.cols() as isize
                    || end_row < 0
                    || end_row >= board.rows() as isize
                {
                    continue;
                }

                let (mut mine, mut theirs) = (0i64, 0i64);
                for i in 0..CONNECT as isize {
                    let cell = board.cell((column + i * dc) as usize, (row + i * dr) as usize);
                    let holder = cell.and_then(|cell| cell.player());
                    if holder == own {
                        mine += 1;
                    } else if holder == opponent {
                        theirs += 1;
                    }
                }

                match (mine, theirs) {
                    (0, 0) => {}
                    (n, 0) => own_sum += n * n,
                    (0, n) => opponent_sum += n * n,
                    _ => {}
                }
            }
        }
    }

    let points = weights.own * own_sum as f64 - weights.opponent * opponent_sum as f64;
    (points * SCORE_SCALE as f64).round() as Score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::board_from_moves;
    use crate::{HEIGHT, WIDTH};

    #[test]
    fn empty_board_is_even() -> Result<()> {
        let board = Board::new(WIDTH, HEIGHT)?;
        assert_eq!(evaluate(&board, Player::One, &Weights::default()), 0);
        assert_eq!(evaluate(&board, Player::Two, &Weights::default()), 0);
        Ok(())
    }

    #[test]
    fn single_tile_counts_its_windows() -> Result<()> {
        // a tile in the bottom corner sits in one horizontal, one vertical and one diagonal window
        let board = board_from_moves(WIDTH, HEIGHT, Player::One, "1")?;
        let weights = Weights::default();
        assert_eq!(evaluate(&board, Player::One, &weights), 3 * SCORE_SCALE);
        // the same windows seen by the opponent are penalised with their weight
        assert_eq!(evaluate(&board, Player::Two, &weights), -33 * SCORE_SCALE / 10);
        Ok(())
    }

    #[test]
    fn shared_windows_are_neutral() -> Result<()> {
        let board = board_from_moves(4, 1, Player::One, "12")?;
        let weights = Weights::new(1.0, 1.0);
        assert_eq!(evaluate(&board, Player::One, &weights), 0);
        Ok(())
    }

    #[test]
    fn terminal_scores_prefer_faster_results() {
        let me = Player::One;
        for depth in 0..10 {
            let sooner = terminal_score(me, me, depth + 1);
            let later = terminal_score(me, me, depth);
            assert!(sooner > later && later > 0);

            let sooner_loss = terminal_score(me.other(), me, depth + 1);
            let later_loss = terminal_score(me.other(), me, depth);
            assert!(sooner_loss < later_loss && later_loss < 0);

            assert!(is_proven(later) && is_proven(later_loss));
        }
        assert!(!is_proven(0));
        assert!(!is_proven(3 * SCORE_SCALE));
    }

    #[test]
    fn weights_survive_a_file_round_trip() -> Result<()> {
        let weights = Weights::new(0.75, 1.3);
        let mut bytes = Vec::new();
        weights.write_to(&mut bytes)?;
        assert_eq!(bytes.len(), 16);
        assert_eq!(Weights::read_from(&bytes[..])?, weights);
        assert!(Weights::read_from(&bytes[..8]).is_err());
        Ok(())
    }

    #[test]
    fn mutation_moves_weights() -> Result<()> {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        let mut weights = Weights::default();
        weights.mutate(&mut rng)?;
        assert_ne!(weights, Weights::default());
        assert!((weights.own - 1.0).abs() < 2.0);
        Ok(())
    }
}
