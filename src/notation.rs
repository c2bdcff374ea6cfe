//! Text notation for positions, similar to Forsyth-Edwards notation in chess
//!
//! A position such as `7/7/7/2y4/2ry3/1ryry2 r` lists the rows from the top
//! down, separated by `/`. Within a row a number is a run of empty cells and
//! `r` or `y` is a tile of player one or two. The character after the space
//! is the player to move.

use anyhow::{anyhow, bail, Result};

use crate::board::{Board, Cell, Player};

/// Widest and tallest board a position may describe
pub const MAX_DIMENSION: usize = 64;

/// Parses a position into its board and the player to move
pub fn parse(notation: &str) -> Result<(Board, Player)> {
    let mut fields = notation.split_whitespace();
    let rows_field = fields
        .next()
        .ok_or_else(|| anyhow!("invalid position notation: '{}'", notation))?;
    let player_field = fields
        .next()
        .ok_or_else(|| anyhow!("invalid position notation, missing player to move: '{}'", notation))?;
    if fields.next().is_some() {
        bail!("invalid position notation, trailing fields: '{}'", notation);
    }

    let mut player_chars = player_field.chars();
    let player = match (player_chars.next().and_then(Player::from_code), player_chars.next()) {
        (Some(player), None) => player,
        _ => bail!("could not parse '{}' as a player", player_field),
    };

    // rows come top to bottom
    let mut rows = Vec::new();
    for row_field in rows_field.split('/') {
        if rows.len() == MAX_DIMENSION {
            bail!("Invalid position, more than {} rows", MAX_DIMENSION);
        }
        rows.push(parse_row(row_field)?);
    }
    let cols = rows[0].len();
    if let Some(row) = rows.iter().position(|row| row.len() != cols) {
        bail!(
            "Invalid position, row {} is {} wide but the first row is {} wide",
            row + 1,
            rows[row].len(),
            cols
        );
    }

    let columns: Vec<Vec<Cell>> = (0..cols)
        .map(|column| rows.iter().rev().map(|row| row[column]).collect())
        .collect();
    Ok((Board::from_columns(&columns)?, player))
}

fn parse_row(field: &str) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    let mut run = 0usize;
    for c in field.chars() {
        if let Some(digit) = c.to_digit(10) {
            run = run
                .checked_mul(10)
                .and_then(|run| run.checked_add(digit as usize))
                .filter(|&run| cells.len() + run <= MAX_DIMENSION)
                .ok_or_else(|| anyhow!("Invalid position, row '{}' is too wide", field))?;
            continue;
        }
        cells.extend(std::iter::repeat(Cell::Empty).take(run));
        run = 0;
        match Player::from_code(c) {
            Some(player) => cells.push(player.into()),
            None => bail!("could not parse '{}' as a cell", c),
        }
        if cells.len() > MAX_DIMENSION {
            bail!("Invalid position, row '{}' is too wide", field);
        }
    }
    cells.extend(std::iter::repeat(Cell::Empty).take(run));
    Ok(cells)
}

/// Writes a board and the player to move as notation
pub fn format(board: &Board, player: Player) -> String {
    let mut notation = String::new();
    for row in (0..board.rows()).rev() {
        let mut run = 0;
        for column in 0..board.cols() {
            match board.cell(column, row).and_then(|cell| cell.player()) {
                Some(tile) => {
                    if run > 0 {
                        notation.push_str(&run.to_string());
                        run = 0;
                    }
                    notation.push(tile.code());
                }
                None => run += 1,
            }
        }
        if run > 0 {
            notation.push_str(&run.to_string());
        }
        if row > 0 {
            notation.push('/');
        }
    }
    notation.push(' ');
    notation.push(player.code());
    notation
}
