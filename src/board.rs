use anyhow::{anyhow, bail, Result};

use std::fmt;

use crate::CONNECT;

/// One of the two sides of a game
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The numeric identity of the player, the two players are additive inverses
    pub fn value(self) -> i8 {
        match self {
            Player::One => 1,
            Player::Two => -1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Selector into per-player tables such as the Zobrist keys
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    /// The character used for this player in position notation
    pub fn code(self) -> char {
        match self {
            Player::One => 'r',
            Player::Two => 'y',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'r' => Some(Player::One),
            'y' => Some(Player::Two),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::One => "Red",
            Player::Two => "Yellow",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Cell {
    PlayerOne,
    PlayerTwo,
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            _ => false,
        }
    }

    pub fn player(self) -> Option<Player> {
        match self {
            Cell::PlayerOne => Some(Player::One),
            Cell::PlayerTwo => Some(Player::Two),
            Cell::Empty => None,
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::One => Cell::PlayerOne,
            Player::Two => Cell::PlayerTwo,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

/// The cell that was filled by a move
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Move {
    pub column: usize,
    pub row: usize,
}

impl Move {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

/// The column searched at position `i` of the move order for a board `cols` wide
fn ordered_column(cols: usize, i: usize) -> usize {
    let center = (cols - 1) / 2;
    if i % 2 == 1 {
        center + (i + 1) / 2
    } else {
        center - i / 2
    }
}

/// Returns the columns ordered from the middle outwards, as
/// the middle columns take part in more lines of four
pub fn move_order(cols: usize) -> Vec<usize> {
    (0..cols).map(|i| ordered_column(cols, i)).collect()
}

// line directions as (column step, row step): horizontal, vertical, diagonal up, diagonal down
pub(crate) const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// A rectangular grid of cells filled from the bottom up
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Board {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>, // cells are stored left-to-right, bottom-to-top
    heights: Vec<usize>,
}

impl Board {
    pub fn new(cols: usize, rows: usize) -> Result<Self> {
        if cols == 0 || rows == 0 {
            bail!("Invalid position, board dimensions {}x{} are empty", cols, rows);
        }
        Ok(Self {
            cols,
            rows,
            cells: vec![Cell::Empty; cols * rows],
            heights: vec![0; cols],
        })
    }

    /// Builds a board from columns of cells, each listed from the bottom row up
    ///
    /// Fails if the columns do not form a rectangle or a tile floats above an empty cell
    pub fn from_columns(columns: &[Vec<Cell>]) -> Result<Self> {
        let rows = columns.first().map(|column| column.len()).unwrap_or(0);
        let mut board = Self::new(columns.len(), rows)?;

        for (column, cells) in columns.iter().enumerate() {
            if cells.len() != rows {
                bail!(
                    "Invalid position, column {} has {} cells but the board is {} high",
                    column + 1,
                    cells.len(),
                    rows
                );
            }
            for (row, &cell) in cells.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                if board.heights[column] != row {
                    bail!(
                        "Invalid position, tile in column {} row {} is floating",
                        column + 1,
                        row + 1
                    );
                }
                let index = board.index(column, row);
                board.cells[index] = cell;
                board.heights[column] += 1;
            }
        }
        Ok(board)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn index(&self, column: usize, row: usize) -> usize {
        column + self.cols * row
    }

    /// The cell at the given coordinates, or `None` if they are off the board
    pub fn cell(&self, column: usize, row: usize) -> Option<Cell> {
        if column < self.cols && row < self.rows {
            Some(self.cells[self.index(column, row)])
        } else {
            None
        }
    }

    fn cell_at(&self, column: isize, row: isize) -> Option<Cell> {
        if column < 0 || row < 0 {
            return None;
        }
        self.cell(column as usize, row as usize)
    }

    pub fn num_moves(&self) -> usize {
        self.heights.iter().sum()
    }

    pub fn empty_cells(&self) -> usize {
        self.cols * self.rows - self.num_moves()
    }

    /// The row a tile dropped into `column` would land on, `None` if there is no legal placement
    pub fn drop_row(&self, column: usize) -> Option<usize> {
        match self.heights.get(column) {
            Some(&height) if height < self.rows => Some(height),
            _ => None,
        }
    }

    /// Drops a tile for `player` into `column`, returning the filled cell
    pub fn play(&mut self, column: usize, player: Player) -> Option<Move> {
        let row = self.drop_row(column)?;
        let index = self.index(column, row);
        self.cells[index] = player.into();
        self.heights[column] += 1;
        Some(Move::new(column, row))
    }

    /// A copy of this board with `player`'s tile placed on a legal move
    pub fn with_move(&self, played: Move, player: Player) -> Self {
        debug_assert_eq!(self.drop_row(played.column), Some(played.row));
        let mut next = self.clone();
        let index = next.index(played.column, played.row);
        next.cells[index] = player.into();
        next.heights[played.column] = played.row + 1;
        next
    }

    /// A full top row means a full board, as tiles stack from the bottom
    pub fn is_full(&self) -> bool {
        let top = self.rows - 1;
        (0..self.cols).all(|column| !self.cells[self.index(column, top)].is_empty())
    }

    pub fn is_draw(&self) -> bool {
        self.is_full()
    }

    /// Checks whether the tile placed by `last_move` completed a line of four
    pub fn is_winning_move(&self, last_move: Move) -> bool {
        self.winning_line(last_move).is_some()
    }

    /// Collects the cells of the line of four completed by `last_move`, if any
    pub fn winning_line(&self, last_move: Move) -> Option<Vec<Move>> {
        let player = self.cell(last_move.column, last_move.row)?.player()?;
        let cell = Cell::from(player);
        let (column, row) = (last_move.column as isize, last_move.row as isize);

        for &(dc, dr) in DIRECTIONS.iter() {
            let mut line = vec![last_move];
            // scan both ways from the placed tile, stopping once a full line is found
            for &sign in [1isize, -1].iter() {
                for i in 1..CONNECT as isize {
                    if line.len() >= CONNECT {
                        break;
                    }
                    let (c, r) = (column + sign * dc * i, row + sign * dr * i);
                    if self.cell_at(c, r) != Some(cell) {
                        break;
                    }
                    line.push(Move::new(c as usize, r as usize));
                }
            }
            if line.len() >= CONNECT {
                return Some(line);
            }
        }
        None
    }

    /// Scans the whole board for a completed line, for positions without a known last move
    pub fn winner(&self) -> Option<Player> {
        for column in 0..self.cols {
            for row in 0..self.heights[column] {
                let placed = Move::new(column, row);
                if self.is_winning_move(placed) {
                    return self.cells[self.index(column, row)].player();
                }
            }
        }
        None
    }

    /// The lowest free cell of every non-full column, in move order
    pub fn legal_moves(&self) -> LegalMoves<'_> {
        LegalMoves {
            board: self,
            next: 0,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in (0..self.rows).rev() {
            for column in 0..self.cols {
                let symbol = match self.cells[self.index(column, row)].player() {
                    Some(player) => player.code(),
                    None => '.',
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over the legal moves of a board in move order
pub struct LegalMoves<'a> {
    board: &'a Board,
    next: usize,
}

impl Iterator for LegalMoves<'_> {
    type Item = Move;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.board.cols {
            let column = ordered_column(self.board.cols, self.next);
            self.next += 1;
            if let Some(row) = self.board.drop_row(column) {
                return Some(Move::new(column, row));
            }
        }
        None
    }
}

/// Parses a string of one-indexed column digits into a board, alternating players from `first`
pub fn board_from_moves<S: AsRef<str>>(cols: usize, rows: usize, first: Player, moves: S) -> Result<Board> {
    let mut board = Board::new(cols, rows)?;
    let mut player = first;

    for column_char in moves.as_ref().chars() {
        match column_char.to_digit(10).map(|c| c as usize) {
            Some(column) if column >= 1 && column <= cols => {
                let played = board
                    .play(column - 1, player)
                    .ok_or_else(|| anyhow!("Invalid move, column {} full", column))?;
                // abort if the position is won at any point
                if board.is_winning_move(played) {
                    bail!("Invalid position, game is over");
                }
                player = player.other();
            }
            _ => bail!("could not parse '{}' as a valid move", column_char),
        }
    }
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HEIGHT, WIDTH};

    #[test]
    fn players_are_opposites() {
        for &player in [Player::One, Player::Two].iter() {
            assert_eq!(player.value() + player.other().value(), 0);
            assert_ne!(player.index(), player.other().index());
            assert_eq!(Player::from_code(player.code()), Some(player));
        }
    }

    #[test]
    fn move_order_is_center_out() {
        assert_eq!(move_order(7), vec![3, 4, 2, 5, 1, 6, 0]);
        assert_eq!(move_order(6), vec![2, 3, 1, 4, 0, 5]);
        assert_eq!(move_order(1), vec![0]);
    }

    #[test]
    fn move_order_is_a_permutation() {
        for cols in 1..=12 {
            let mut order = move_order(cols);
            assert_eq!(order[0], (cols - 1) / 2);
            order.sort_unstable();
            assert_eq!(order, (0..cols).collect::<Vec<_>>());
        }
    }

    #[test]
    fn full_column_has_no_legal_placement() -> Result<()> {
        let board = board_from_moves(WIDTH, HEIGHT, Player::One, "444444")?;
        assert_eq!(board.drop_row(3), None);
        assert_eq!(board.drop_row(WIDTH), None);
        assert!(board.legal_moves().all(|m| m.column != 3));
        assert_eq!(board.legal_moves().count(), WIDTH - 1);
        Ok(())
    }

    #[test]
    fn legal_moves_land_on_lowest_row() -> Result<()> {
        let board = board_from_moves(WIDTH, HEIGHT, Player::One, "4453")?;
        let moves: Vec<Move> = board.legal_moves().collect();
        assert_eq!(moves[0], Move::new(3, 2));
        assert_eq!(moves[1], Move::new(4, 1));
        assert_eq!(moves[2], Move::new(2, 1));
        assert_eq!(moves[3], Move::new(5, 0));
        Ok(())
    }

    #[test]
    fn winning_line_in_every_direction() -> Result<()> {
        // horizontal
        let mut board = board_from_moves(WIDTH, HEIGHT, Player::One, "112233")?;
        let played = board.play(3, Player::One).unwrap();
        let mut line = board.winning_line(played).unwrap();
        line.sort_by_key(|m| m.column);
        assert_eq!(line, (0..4).map(|c| Move::new(c, 0)).collect::<Vec<_>>());

        // vertical
        let mut board = board_from_moves(WIDTH, HEIGHT, Player::One, "121212")?;
        let played = board.play(0, Player::One).unwrap();
        assert!(board.is_winning_move(played));

        // diagonal up
        let mut board = board_from_moves(WIDTH, HEIGHT, Player::One, "1223433454")?;
        let played = board.play(3, Player::One).unwrap();
        assert_eq!(played, Move::new(3, 3));
        assert!(board.is_winning_move(played));

        // diagonal down
        let mut board = board_from_moves(WIDTH, HEIGHT, Player::One, "7665455434")?;
        let played = board.play(3, Player::One).unwrap();
        assert!(board.is_winning_move(played));

        // the other player's tile does not complete the line
        let mut board = board_from_moves(WIDTH, HEIGHT, Player::One, "1223433454")?;
        let played = board.play(3, Player::Two).unwrap();
        assert!(!board.is_winning_move(played));
        Ok(())
    }

    #[test]
    fn diagonal_win_through_the_middle() -> Result<()> {
        let columns = vec![
            vec![Cell::PlayerOne, Cell::Empty, Cell::Empty, Cell::Empty],
            vec![Cell::PlayerTwo, Cell::PlayerOne, Cell::Empty, Cell::Empty],
            vec![Cell::PlayerTwo, Cell::PlayerTwo, Cell::Empty, Cell::Empty],
            vec![Cell::PlayerTwo, Cell::PlayerTwo, Cell::PlayerOne, Cell::PlayerOne],
        ];
        let mut board = Board::from_columns(&columns)?;
        let played = board.play(2, Player::One).unwrap();
        assert_eq!(played, Move::new(2, 2));
        let line = board.winning_line(played).unwrap();
        assert_eq!(line.len(), CONNECT);
        assert!(line.contains(&Move::new(0, 0)));
        assert!(line.contains(&Move::new(3, 3)));
        Ok(())
    }

    #[test]
    fn floating_tiles_are_rejected() {
        let columns = vec![
            vec![Cell::Empty, Cell::PlayerOne, Cell::Empty, Cell::Empty],
            vec![Cell::Empty; 4],
            vec![Cell::Empty; 4],
            vec![Cell::Empty; 4],
        ];
        assert!(Board::from_columns(&columns).is_err());
        let ragged = vec![vec![Cell::Empty; 4], vec![Cell::Empty; 3]];
        assert!(Board::from_columns(&ragged).is_err());
        assert!(Board::new(0, 6).is_err());
    }

    #[test]
    fn full_top_row_is_a_draw() -> Result<()> {
        let board = board_from_moves(3, 2, Player::One, "123321")?;
        assert!(board.is_full());
        assert!(board.is_draw());
        assert_eq!(board.legal_moves().count(), 0);
        assert!(!board_from_moves(3, 2, Player::One, "12332")?.is_draw());
        Ok(())
    }
}
