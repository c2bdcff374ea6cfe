//! Zobrist hashing of board positions

use anyhow::{bail, Result};
use rand::Rng;

use crate::board::{Board, Move, Player};

/// Random keys for every (cell, player) pair of a board of fixed dimensions
///
/// The hash of a position is the XOR of the keys of its occupied cells, so
/// placing a tile updates the hash in constant time.
#[derive(Clone, Debug)]
pub struct ZobristKeys {
    cols: usize,
    rows: usize,
    // one key per player for each cell, indexed like the board cells
    keys: Vec<[u64; 2]>,
}

impl ZobristKeys {
    pub fn new<R: Rng + ?Sized>(cols: usize, rows: usize, rng: &mut R) -> Self {
        let keys = (0..cols * rows).map(|_| [rng.gen(), rng.gen()]).collect();
        Self { cols, rows, keys }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The key of `player`'s tile on the given cell
    pub fn key(&self, column: usize, row: usize, player: Player) -> u64 {
        self.keys[column + self.cols * row][player.index()]
    }

    /// Hashes a whole board from scratch
    pub fn hash_board(&self, board: &Board) -> Result<u64> {
        if board.cols() != self.cols || board.rows() != self.rows {
            bail!(
                "Invalid position, board is {}x{} but the keys cover {}x{}",
                board.cols(),
                board.rows(),
                self.cols,
                self.rows
            );
        }
        let mut hash = 0;
        for column in 0..board.cols() {
            for row in 0..board.rows() {
                if let Some(player) = board.cell(column, row).and_then(|cell| cell.player()) {
                    hash = self.add_hash(hash, Move::new(column, row), player);
                }
            }
        }
        Ok(hash)
    }

    /// Toggles `player`'s tile on the cell of `placed` in `hash`
    pub fn add_hash(&self, hash: u64, placed: Move, player: Player) -> u64 {
        hash ^ self.key(placed.column, placed.row, player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HEIGHT, WIDTH};
    use anyhow::Result;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn incremental_hash_matches_full_hash() -> Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let keys = ZobristKeys::new(WIDTH, HEIGHT, &mut rng);
        let board = crate::board::board_from_moves(WIDTH, HEIGHT, Player::One, "4455123672")?;

        let mut tiles = Vec::new();
        for column in 0..WIDTH {
            for row in 0..HEIGHT {
                if let Some(player) = board.cell(column, row).and_then(|c| c.player()) {
                    tiles.push((Move::new(column, row), player));
                }
            }
        }
        assert_eq!(tiles.len(), 10);

        // XOR is order independent
        for _ in 0..8 {
            tiles.shuffle(&mut rng);
            let hash = tiles
                .iter()
                .fold(0, |hash, &(placed, player)| keys.add_hash(hash, placed, player));
            assert_eq!(hash, keys.hash_board(&board)?);
        }
        Ok(())
    }

    #[test]
    fn adding_twice_undoes_a_tile() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let keys = ZobristKeys::new(WIDTH, HEIGHT, &mut rng);
        let placed = Move::new(3, 0);
        let hash = keys.add_hash(0x1234, placed, Player::Two);
        assert_ne!(hash, 0x1234);
        assert_eq!(keys.add_hash(hash, placed, Player::Two), 0x1234);
        assert_ne!(
            keys.key(3, 0, Player::One),
            keys.key(3, 0, Player::Two)
        );
    }

    #[test]
    fn seeded_keys_are_reproducible() {
        let a = ZobristKeys::new(WIDTH, HEIGHT, &mut ChaCha8Rng::seed_from_u64(5));
        let b = ZobristKeys::new(WIDTH, HEIGHT, &mut ChaCha8Rng::seed_from_u64(5));
        let c = ZobristKeys::new(WIDTH, HEIGHT, &mut ChaCha8Rng::seed_from_u64(6));
        assert_eq!(a.key(6, 5, Player::One), b.key(6, 5, Player::One));
        assert_ne!(a.key(6, 5, Player::One), c.key(6, 5, Player::One));
    }

    #[test]
    fn boards_of_other_sizes_are_not_hashed() -> Result<()> {
        let keys = ZobristKeys::new(WIDTH, HEIGHT, &mut ChaCha8Rng::seed_from_u64(8));
        assert!(keys.hash_board(&Board::new(WIDTH + 1, HEIGHT + 1)?).is_err());
        assert!(keys.hash_board(&Board::new(WIDTH, HEIGHT - 1)?).is_err());
        assert_eq!(keys.hash_board(&Board::new(WIDTH, HEIGHT)?)?, 0);
        Ok(())
    }
}
