use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tile_puzzles::logger;
use tile_puzzles::match3::{GridConfig, Position, SwapRejection};
use tile_puzzles::session::{GameStatus, Match3Rules, Match3Session};
use tile_puzzles::stats::{self, JsonFileStore};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Swap adjacent tiles to line up three or more", long_about = None)]
struct Args {
    #[clap(long, default_value_t = 6)]
    rows: usize,

    #[clap(long, default_value_t = 6)]
    cols: usize,

    /// Bag size as a multiple of the board size
    #[clap(long, default_value_t = tile_puzzles::match3::DEFAULT_BAG_MULTIPLIER)]
    bag_multiplier: usize,

    /// Seed for the bag shuffle; random if omitted
    #[clap(short, long)]
    seed: Option<u64>,

    /// JSON file to keep play statistics in
    #[clap(long)]
    stats: Option<PathBuf>,

    /// Raise log verbosity (repeatable)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_swap(input: &str) -> Option<(Position, Position)> {
    let nums: Vec<usize> = input
        .split_whitespace()
        .map(|p| p.parse::<usize>())
        .collect::<Result<_, _>>()
        .ok()?;
    match nums.as_slice() {
        [r1, c1, r2, c2] => Some((Position::new(*r1, *c1), Position::new(*r2, *c2))),
        _ => None,
    }
}

fn record_game(path: &Path, session: &Match3Session<char>) -> Result<()> {
    let mut store = JsonFileStore::new(path);
    let totals = stats::record_match3(
        &mut store,
        session.score(),
        session.cleared_tiles(),
        stats::now_timestamp(),
    )
    .with_context(|| format!("failed to save stats to {}", path.display()))?;
    println!(
        "Best score: {}, total cleared: {}, games played: {}",
        totals.best_score, totals.total_cleared, totals.attempts
    );
    println!("Stats saved to {}", store.path().display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(logger::level_from_verbosity(args.verbose)).context("failed to install logger")?;

    let mut config = GridConfig::new(args.rows, args.cols, GridConfig::default().tile_set);
    config.bag_multiplier = args.bag_multiplier;
    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let rules = Match3Rules::default();
    let mut session = Match3Session::new(config, rules, &mut rng);
    let mut recorded = false;

    if let Some(path) = &args.stats {
        let store = JsonFileStore::new(path);
        let totals = stats::load_match3_stats(&store);
        println!("Best score so far: {} ({} games)", totals.best_score, totals.attempts);
    }
    println!("Welcome to Match-3!");

    loop {
        println!("---------------------");
        println!(
            "Moves: {}/{}, Invalid: {}/{}, Score: {}, Bag: {}",
            session.moves(),
            rules.max_moves,
            session.invalid_moves(),
            rules.max_invalid_moves,
            session.score(),
            session.state().bag.len()
        );
        println!("{}", session.state().board.to_string_with_highlight(None));

        if session.status() != GameStatus::Playing && !recorded {
            println!();
            println!("---------------------");
            match session.status() {
                GameStatus::Won => println!("🎉 BOARD CLEARED! 🎉"),
                _ => println!("GAME OVER"),
            }
            println!("Final Score: {}", session.score());
            println!("Tiles Cleared: {}", session.cleared_tiles());
            println!("---------------------");
            if let Some(path) = &args.stats {
                record_game(path, &session)?;
            }
            recorded = true;
        }

        print!("Enter a swap (r1 c1 r2 c2), 'n' for a new game, 'q' to quit: ");
        io::stdout().flush().context("failed to flush stdout")?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input).context("failed to read input")? == 0 {
            break;
        }
        let trimmed_input = input.trim();

        match trimmed_input {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "n" => {
                session.restart(&mut rng);
                recorded = false;
                println!("New game started.");
                continue;
            }
            _ => {}
        }

        let Some((a, b)) = parse_swap(trimmed_input) else {
            println!("Invalid input format. Use 'r1 c1 r2 c2', 'n', or 'q'.");
            continue;
        };
        match session.swap(a, b) {
            Ok(report) if report.valid => {
                println!("Cleared {} tiles for {} points.", report.cleared, report.points);
            }
            Ok(report) => match report.rejection {
                Some(SwapRejection::OutOfBounds) => println!("{} or {} is off the board.", a, b),
                Some(SwapRejection::NotAdjacent) => println!("{} and {} are not neighbours.", a, b),
                _ => println!("That swap makes no match."),
            },
            Err(e) => println!("{}", e),
        }
    }
    Ok(())
}
