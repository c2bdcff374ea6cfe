//! Nodes of the game tree

use anyhow::Result;

use crate::board::{Board, LegalMoves, Move, Player};
use crate::evaluation::Score;
use crate::zobrist::ZobristKeys;

/// A position in the game tree: a board snapshot plus the players around the move that produced it
///
/// Every position owns its board, children are fresh copies with one more tile.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    /// The player to move next
    pub current: Player,
    /// The player that made `last_move`
    pub previous: Player,
    /// The move that produced this position, `None` for the root
    pub last_move: Option<Move>,
    /// Zobrist hash of the board
    pub hash: u64,
    /// The last score backed up for this position, if it was searched
    pub score: Option<Score>,
}

impl Position {
    pub fn new(board: Board, current: Player, last_move: Option<Move>, hash: u64) -> Self {
        Self {
            board,
            current,
            previous: current.other(),
            last_move,
            hash,
            score: None,
        }
    }

    /// Creates a search root, hashing the board with `keys`
    ///
    /// Fails if the keys were made for boards of other dimensions.
    pub fn root(board: Board, current: Player, keys: &ZobristKeys) -> Result<Self> {
        let hash = keys.hash_board(&board)?;
        Ok(Self::new(board, current, None, hash))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Whether `last_move` completed a line, always false for the root
    pub fn is_won(&self) -> bool {
        match self.last_move {
            Some(last_move) => self.board.is_winning_move(last_move),
            None => false,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.board.is_draw()
    }

    /// The position after the current player plays `next`
    pub fn child(&self, next: Move, keys: &ZobristKeys) -> Self {
        Self {
            board: self.board.with_move(next, self.current),
            current: self.previous,
            previous: self.current,
            last_move: Some(next),
            hash: keys.add_hash(self.hash, next, self.current),
            score: None,
        }
    }

    /// Lazily builds the child positions in move order
    pub fn children<'a>(&'a self, keys: &'a ZobristKeys) -> Children<'a> {
        Children {
            parent: self,
            keys,
            moves: self.board.legal_moves(),
        }
    }
}

pub struct Children<'a> {
    parent: &'a Position,
    keys: &'a ZobristKeys,
    moves: LegalMoves<'a>,
}

impl Iterator for Children<'_> {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.moves.next()?;
        Some(self.parent.child(next, self.keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::board_from_moves;
    use crate::{HEIGHT, WIDTH};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn children_follow_move_order_and_keep_hashes_coherent() -> Result<()> {
        let keys = ZobristKeys::new(WIDTH, HEIGHT, &mut ChaCha8Rng::seed_from_u64(2));
        let board = board_from_moves(WIDTH, HEIGHT, Player::One, "44")?;
        let root = Position::root(board, Player::One, &keys)?;

        let children: Vec<Position> = root.children(&keys).collect();
        let columns: Vec<usize> = children.iter().map(|c| c.last_move.unwrap().column).collect();
        assert_eq!(columns, vec![3, 4, 2, 5, 1, 6, 0]);

        for child in children.iter() {
            assert_eq!(child.hash, keys.hash_board(child.board())?);
            assert_eq!(child.current, Player::Two);
            assert_eq!(child.previous, Player::One);
            assert_eq!(child.board().num_moves(), 3);
        }
        // the parent is untouched by its children
        assert_eq!(root.board().num_moves(), 2);
        assert!(!root.is_won());
        Ok(())
    }

    #[test]
    fn transposed_move_orders_hash_alike() -> Result<()> {
        let keys = ZobristKeys::new(WIDTH, HEIGHT, &mut ChaCha8Rng::seed_from_u64(4));
        let root = Position::root(crate::board::Board::new(WIDTH, HEIGHT)?, Player::One, &keys)?;

        let play = |columns: &[usize]| {
            columns.iter().fold(root.clone(), |position, &column| {
                let next = Move::new(column, position.board().drop_row(column).unwrap());
                position.child(next, &keys)
            })
        };
        let a = play(&[0, 1, 2, 3]);
        let b = play(&[2, 3, 0, 1]);
        let c = play(&[1, 0, 2, 3]);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.board(), b.board());
        assert_ne!(a.hash, c.hash);
        Ok(())
    }
}
