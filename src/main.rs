use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use std::fs::File;
use std::io::{stdin, stdout, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use connect4_search::arena::{run_match, train};
use connect4_search::solver::DEFAULT_TIME_BUDGET;
use connect4_search::*;

#[derive(Parser)]
#[command(name = "connect4")]
#[command(about = "Play Connect 4 against a game tree search")]
struct Cli {
    /// Time in milliseconds the AI may start new search depths in
    #[arg(long, global = true)]
    time_ms: Option<u64>,
    /// Deepest search the AI will run
    #[arg(long, global = true)]
    depth: Option<usize>,
    /// Evaluation weights file written by `train`
    #[arg(long, global = true)]
    weights: Option<PathBuf>,
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an interactive game (the default)
    Play {
        /// Starting position, e.g. "7/7/7/2y4/2ry3/1ryry2 r"
        #[arg(long)]
        position: Option<String>,
        /// Log every search depth
        #[arg(long)]
        verbose: bool,
    },
    /// Play the default weights against the loaded ones
    Match {
        #[arg(long, default_value = "20")]
        games: usize,
        #[arg(long, default_value = "7")]
        cols: usize,
        #[arg(long, default_value = "6")]
        rows: usize,
    },
    /// Tune evaluation weights by self-play
    Train {
        #[arg(long, default_value = "200")]
        generations: usize,
        #[arg(long, default_value = "2")]
        games: usize,
        #[arg(long, default_value = "7")]
        cols: usize,
        #[arg(long, default_value = "6")]
        rows: usize,
        #[arg(long, default_value = "weights.bin")]
        out: PathBuf,
    },
}

impl Cli {
    fn config(&self) -> Result<SearchConfig> {
        let time_budget = self
            .time_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIME_BUDGET);
        let mut config = SearchConfig::default().with_time_budget(time_budget);
        if let Some(depth) = self.depth {
            config = config.with_depth_limit(depth);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(path) = &self.weights {
            config = config.with_weights(load_weights(path)?);
        }
        Ok(config)
    }
}

fn load_weights(path: &Path) -> Result<Weights> {
    let file = File::open(path)
        .map_err(|err| anyhow!("Error reading weights file {}: {}", path.display(), err))?;
    Weights::read_from(BufReader::new(file))
}

fn save_weights(path: &Path, weights: &Weights) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    weights.write_to(&mut file)?;
    file.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cli.config()?;

    match cli.command {
        None => play(config, None, false),
        Some(Commands::Play { position, verbose }) => play(config, position, verbose),
        Some(Commands::Match { games, cols, rows }) => {
            let seed = cli.seed.unwrap_or_else(rand::random);
            let defaults = config.clone().with_weights(Weights::default());
            let result = run_match(&config, &defaults, games, cols, rows, seed, true)?;
            println!(
                "Loaded weights against defaults: {} wins, {} losses, {} draws",
                result.wins, result.losses, result.draws
            );
            Ok(())
        }
        Some(Commands::Train { generations, games, cols, rows, out }) => {
            let seed = cli.seed.unwrap_or_else(rand::random);
            let weights = train(&config, generations, games, cols, rows, seed)?;
            save_weights(&out, &weights)?;
            println!(
                "Champion weights {:.3} / {:.3} written to {}",
                weights.own,
                weights.opponent,
                out.display()
            );
            Ok(())
        }
    }
}

fn ask_ai_controlled(player: usize) -> Result<bool> {
    let stdin = stdin();
    loop {
        let mut buffer = String::new();
        print!("Is player {} AI controlled? y/n: ", player);
        stdout().flush()?;
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some('y') => return Ok(true),
            Some('n') => return Ok(false),
            _ => println!("Unknown answer given"),
        }
    }
}

fn play(config: SearchConfig, position: Option<String>, verbose: bool) -> Result<()> {
    let mut game = match position {
        Some(position) => Game::from_notation(&position)?,
        None => Game::new(WIDTH, HEIGHT, Player::One)?,
    };
    let (cols, rows) = (game.board().cols(), game.board().rows());
    let stdin = stdin();

    println!("Welcome to Connect 4\n");

    let ai_players = (ask_ai_controlled(1)?, ask_ai_controlled(2)?);
    // each AI keeps its own solver so its random source carries over between moves
    let mut solvers = (
        Solver::new(cols, rows, config.clone()),
        Solver::new(
            cols,
            rows,
            config.clone().with_seed(config.seed.map_or_else(rand::random, |s| s.wrapping_add(1))),
        ),
    );

    // game loop
    loop {
        game.display()?;

        match game.state {
            GameState::Playing => {
                let player = game.current();
                let next_move = if (player == Player::One && ai_players.0) || (player == Player::Two && ai_players.1) {
                    // AI player
                    println!("AI is thinking...");
                    stdout().flush()?;

                    // slow down play if both players are AI
                    if ai_players == (true, true) {
                        std::thread::sleep(Duration::new(1, 0));
                    }

                    let solver = match player {
                        Player::One => &mut solvers.0,
                        Player::Two => &mut solvers.1,
                    };
                    let mut root = solver.root(game.board().clone(), player)?;
                    let thought = if verbose {
                        solver.think_verbose(&mut root)?
                    } else {
                        solver.think(&mut root)?
                    };

                    match thought.plies_to_end() {
                        Some(plies) => {
                            let winner = if thought.score > 0 { player } else { player.other() };
                            let move_string = if plies == 1 { "move" } else { "moves" };
                            println!("{} can force a win in at most {} {}.", winner.name(), plies, move_string);
                        }
                        None => println!(
                            "Searched {} moves ahead, score {:.2}",
                            thought.depth,
                            evaluation::to_points(thought.score)
                        ),
                    }

                    let best_move = thought
                        .best_move
                        .ok_or_else(|| anyhow!("No legal placement, game is over"))?;
                    println!("Best move: {}", best_move.column + 1);
                    best_move.column + 1
                } else {
                    // human player
                    print!("{} move input > ", player.name());
                    stdout().flush()?;
                    let mut input_str = String::new();
                    stdin.read_line(&mut input_str)?;

                    match input_str.trim().parse::<usize>() {
                        Err(_) => {
                            println!("Invalid number: {}", input_str.trim());
                            continue;
                        }
                        Ok(column) => column,
                    }
                };

                if let Err(err) = game.play_checked(next_move) {
                    println!("{}", err);
                    // try the move again
                    continue;
                }
            }

            // end states
            GameState::PlayerOneWin => {
                println!("Player 1 wins!");
                break;
            }
            GameState::PlayerTwoWin => {
                println!("Player 2 wins!");
                break;
            }
            GameState::Draw => {
                println!("Draw!");
                break;
            }
        }
    }
    println!("Final position: {}", game.to_notation());
    Ok(())
}
