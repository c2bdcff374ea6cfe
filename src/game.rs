use anyhow::{anyhow, bail, Result};
use crossterm::{
    cursor::MoveTo,
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use crate::board::{Board, Cell, Move, Player};
use crate::notation;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GameState {
    Playing,
    PlayerOneWin,
    PlayerTwoWin,
    Draw,
}

impl GameState {
    fn win(player: Player) -> Self {
        match player {
            Player::One => GameState::PlayerOneWin,
            Player::Two => GameState::PlayerTwoWin,
        }
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            GameState::PlayerOneWin => Some(Player::One),
            GameState::PlayerTwoWin => Some(Player::Two),
            _ => None,
        }
    }

    pub fn is_over(self) -> bool {
        self != GameState::Playing
    }
}

/// A game in progress, tracking turns and the result
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    current: Player,
    last_move: Option<Move>,
    pub state: GameState,
    // cells of the completed line once the game is won
    line: Vec<Move>,
    /// The one-indexed columns played so far
    pub game: Vec<usize>,
}

impl Game {
    pub fn new(cols: usize, rows: usize, first: Player) -> Result<Self> {
        Ok(Self::from_board(Board::new(cols, rows)?, first))
    }

    /// Resumes a game from a position in text notation
    pub fn from_notation(position: &str) -> Result<Self> {
        let (board, current) = notation::parse(position)?;
        Ok(Self::from_board(board, current))
    }

    fn from_board(board: Board, current: Player) -> Self {
        let mut line = Vec::new();
        let mut state = if board.is_draw() {
            GameState::Draw
        } else {
            GameState::Playing
        };
        'scan: for column in 0..board.cols() {
            for row in 0..board.rows() {
                if let Some(found) = board.winning_line(Move::new(column, row)) {
                    if let Some(player) = board.cell(column, row).and_then(|cell| cell.player()) {
                        state = GameState::win(player);
                    }
                    line = found;
                    break 'scan;
                }
            }
        }
        Self {
            board,
            current,
            last_move: None,
            state,
            line,
            game: Vec::new(),
        }
    }

    pub fn to_notation(&self) -> String {
        notation::format(&self.board, self.current)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The player to move next
    pub fn current(&self) -> Player {
        self.current
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// The cells of the completed line, empty unless the game is won
    pub fn winning_line(&self) -> &[Move] {
        &self.line
    }

    pub fn play_checked(&mut self, column_one_indexed: usize) -> Result<GameState> {
        if self.state.is_over() {
            bail!("Invalid move, the game is already over");
        }
        let cols = self.board.cols();
        if column_one_indexed < 1 || column_one_indexed > cols {
            return Err(anyhow!(
                "Invalid move, column {} out of range. Columns must be between 1 and {}",
                column_one_indexed,
                cols
            ));
        }
        let played = self
            .board
            .play(column_one_indexed - 1, self.current)
            .ok_or_else(|| anyhow!("Invalid move, column {} full", column_one_indexed))?;

        if let Some(line) = self.board.winning_line(played) {
            self.state = GameState::win(self.current);
            self.line = line;
        } else if self.board.is_draw() {
            self.state = GameState::Draw;
        }
        self.last_move = Some(played);
        self.current = self.current.other();
        self.game.push(column_one_indexed);

        Ok(self.state)
    }

    /// Draws the board to the terminal, highlighting a winning line
    pub fn display(&self) -> Result<()> {
        let mut stdout = stdout();
        let (cols, rows) = (self.board.cols(), self.board.rows());

        let header: String = (1..=cols).map(|x| (x % 10).to_string()).collect();
        stdout.queue(PrintStyledContent(style(header + "\n")))?;
        for _ in 0..rows {
            stdout.queue(PrintStyledContent(style("\n")))?;
        }
        stdout.flush()?;

        let (origin_x, origin_y) = crossterm::cursor::position()?;

        for row in 0..rows {
            for column in 0..cols {
                let (pos_x, pos_y) = (origin_x.saturating_add(column as u16), screen_row(origin_y, row));
                let cell = self.board.cell(column, row).unwrap_or_default();
                let background = if self.line.contains(&Move::new(column, row)) {
                    Color::DarkGreen
                } else {
                    Color::DarkBlue
                };

                stdout.queue(MoveTo(pos_x, pos_y))?.queue(PrintStyledContent(
                    style("O")
                        .attribute(Attribute::Bold)
                        .on(background)
                        .with(match cell {
                            Cell::PlayerOne => Color::Red,
                            Cell::PlayerTwo => Color::Yellow,
                            Cell::Empty => background,
                        }),
                ))?;
            }
        }
        stdout
            .queue(MoveTo(origin_x, origin_y))?
            .queue(PrintStyledContent(style("\n")))?;
        stdout.flush()?;
        Ok(())
    }
}

// terminal line of a board row drawn above `origin_y`, pinned to the top line on short terminals
fn screen_row(origin_y: u16, row: usize) -> u16 {
    let above = u16::try_from(row + 1).unwrap_or(u16::MAX);
    origin_y.saturating_sub(above)
}
