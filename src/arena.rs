//! Matches between solvers, and a champion/challenger loop to tune evaluation weights

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::board::Player;
use crate::evaluation::Weights;
use crate::game::{Game, GameState};
use crate::solver::{SearchConfig, Solver};

/// Tally of a match, from the point of view of the first configuration
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct MatchResult {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl MatchResult {
    pub fn games(&self) -> usize {
        self.wins + self.losses + self.draws
    }

    fn add(mut self, state: GameState, side: Player) -> Self {
        match state.winner() {
            Some(winner) if winner == side => self.wins += 1,
            Some(_) => self.losses += 1,
            None => self.draws += 1,
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
            draws: self.draws + other.draws,
        }
    }
}

/// Plays one game on an empty board, `one` moving first
pub fn play_game(one: &mut Solver, two: &mut Solver, cols: usize, rows: usize) -> Result<Game> {
    let mut game = Game::new(cols, rows, Player::One)?;
    while game.state == GameState::Playing {
        let solver = match game.current() {
            Player::One => &mut *one,
            Player::Two => &mut *two,
        };
        let thought = solver.think_board(game.board(), game.current())?;
        let next = thought
            .best_move
            .ok_or_else(|| anyhow!("Solver found no move in a game in progress"))?;
        game.play_checked(next.column + 1)?;
    }
    Ok(game)
}

/// Plays `games` games between two configurations in parallel, alternating who moves first
///
/// Every game gets its own pair of solvers seeded from `seed` and the game number,
/// so a match is reproducible whatever the thread count.
pub fn run_match(
    a: &SearchConfig,
    b: &SearchConfig,
    games: usize,
    cols: usize,
    rows: usize,
    seed: u64,
    show_progress: bool,
) -> Result<MatchResult> {
    let progress = if show_progress {
        let progress = ProgressBar::new(games as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("Playing games: {bar:40.cyan/blue} {pos}/{len} ~{eta} remaining")
                .progress_chars("█▓▒░  "),
        );
        progress
    } else {
        ProgressBar::hidden()
    };

    let results = (0..games)
        .into_par_iter()
        .map(|i| {
            let game_seed = seed.wrapping_add(2 * i as u64);
            let mut solver_a = Solver::new(cols, rows, a.clone().with_seed(game_seed));
            let mut solver_b = Solver::new(cols, rows, b.clone().with_seed(game_seed.wrapping_add(1)));

            let (game, side) = if i % 2 == 0 {
                (play_game(&mut solver_a, &mut solver_b, cols, rows)?, Player::One)
            } else {
                (play_game(&mut solver_b, &mut solver_a, cols, rows)?, Player::Two)
            };
            debug!(game = i, state = ?game.state, moves = game.game.len(), "Game finished");
            progress.inc(1);
            Ok(MatchResult::default().add(game.state, side))
        })
        .collect::<Result<Vec<MatchResult>>>()?;

    progress.finish();
    Ok(results
        .into_iter()
        .fold(MatchResult::default(), MatchResult::merge))
}

/// Tunes evaluation weights by repeatedly matching a mutated challenger against the champion
///
/// A challenger that wins more games than it loses becomes the new champion.
pub fn train(
    base: &SearchConfig,
    generations: usize,
    games: usize,
    cols: usize,
    rows: usize,
    seed: u64,
) -> Result<Weights> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut champion = base.weights;

    for generation in 0..generations {
        let mut challenger = champion;
        challenger.mutate(&mut rng)?;

        let result = run_match(
            &base.clone().with_weights(challenger),
            &base.clone().with_weights(champion),
            games,
            cols,
            rows,
            rng.gen(),
            false,
        )?;
        let promoted = result.wins > result.losses;
        info!(
            generation,
            wins = result.wins,
            losses = result.losses,
            draws = result.draws,
            own = challenger.own,
            opponent = challenger.opponent,
            promoted,
            "Challenger played"
        );
        if promoted {
            champion = challenger;
        }
    }
    Ok(champion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn quick() -> SearchConfig {
        SearchConfig::default()
            .with_time_budget(Duration::from_secs(3600))
            .with_depth_limit(2)
    }

    #[test]
    fn games_are_played_to_the_end() -> Result<()> {
        let mut one = Solver::new(7, 6, quick().with_seed(1));
        let mut two = Solver::new(7, 6, quick().with_seed(2));
        let game = play_game(&mut one, &mut two, 7, 6)?;
        assert!(game.state.is_over());
        assert_eq!(game.board().num_moves(), game.game.len());
        if game.state == GameState::Draw {
            assert!(game.board().is_full());
        } else {
            assert_eq!(game.winning_line().len(), 4);
        }
        Ok(())
    }

    #[test]
    fn matches_count_every_game_and_repeat() -> Result<()> {
        let result = run_match(&quick(), &quick(), 4, 5, 4, 11, false)?;
        assert_eq!(result.games(), 4);
        assert_eq!(run_match(&quick(), &quick(), 4, 5, 4, 11, false)?, result);
        Ok(())
    }

    #[test]
    fn deeper_search_wins_the_match() -> Result<()> {
        let strong = quick().with_depth_limit(4);
        let weak = quick().with_depth_limit(1);
        let result = run_match(&strong, &weak, 4, 7, 6, 3, false)?;
        assert!(result.wins > result.losses, "{:?}", result);
        Ok(())
    }

    #[test]
    fn training_is_reproducible() -> Result<()> {
        let base = quick().with_depth_limit(1);
        let first = train(&base, 2, 2, 5, 4, 9)?;
        assert_eq!(train(&base, 2, 2, 5, 4, 9)?, first);
        Ok(())
    }
}
