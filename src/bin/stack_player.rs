use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tile_puzzles::logger;
use tile_puzzles::session::{GameStatus, StackRules, StackSession};
use tile_puzzles::stack::{StackConfig, StackTile, TileId};
use tile_puzzles::stats::{self, JsonFileStore};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Pick tiles off the stacks; three alike clear", long_about = None)]
struct Args {
    /// Layout seed; random if omitted
    #[clap(short, long)]
    seed: Option<u32>,

    /// Buffer capacity before the game is lost
    #[clap(long, default_value_t = tile_puzzles::stack::DEFAULT_SLOT_LIMIT)]
    slot_limit: usize,

    /// JSON file to keep play statistics in
    #[clap(long)]
    stats: Option<PathBuf>,

    /// Raise log verbosity (repeatable)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn render_buffer(buffer: &[StackTile<char>], slot_limit: usize) -> String {
    let mut slots: Vec<String> = buffer.iter().map(|t| t.kind.to_string()).collect();
    while slots.len() < slot_limit {
        slots.push("_".to_string());
    }
    format!("[{}]", slots.join(" "))
}

/// Accepts either a position in the selectable list or a full tile id.
fn parse_choice(input: &str, selectable: &[&StackTile<char>]) -> Option<TileId> {
    if let Ok(i) = input.parse::<usize>() {
        return selectable.get(i).map(|t| t.id);
    }
    input.parse::<TileId>().ok()
}

fn record_game(path: &Path, session: &StackSession<char>) -> Result<()> {
    let mut store = JsonFileStore::new(path);
    let totals = stats::record_stack(
        &mut store,
        session.moves(),
        session.cleared_triples(),
        stats::now_timestamp(),
    )
    .with_context(|| format!("failed to save stats to {}", path.display()))?;
    match totals.best_moves {
        Some(best) => println!("Best: {} moves, games played: {}", best, totals.attempts),
        None => println!("Games played: {}", totals.attempts),
    }
    println!("Stats saved to {}", store.path().display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(logger::level_from_verbosity(args.verbose)).context("failed to install logger")?;

    let rules = StackRules {
        slot_limit: args.slot_limit,
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut session = StackSession::new(StackConfig::default(), rules, seed);
    let mut recorded = false;
    println!("Welcome to the stack game!");

    loop {
        println!("---------------------");
        println!(
            "Seed: {}, Moves: {}, Triples: {}, Tiles left: {}",
            session.seed(),
            session.moves(),
            session.cleared_triples(),
            session.layout().tile_count()
        );
        println!("Buffer: {}", render_buffer(session.buffer(), rules.slot_limit));

        if session.status() != GameStatus::Playing {
            if !recorded {
                println!();
                println!("---------------------");
                match session.status() {
                    GameStatus::Won => println!("🎉 ALL CLEAR! 🎉"),
                    _ => println!("GAME OVER"),
                }
                println!("Total Moves: {}", session.moves());
                println!("---------------------");
                if let Some(path) = &args.stats {
                    record_game(path, &session)?;
                }
                recorded = true;
            }
        } else {
            println!("Selectable:");
            for (i, tile) in session.selectable().iter().enumerate() {
                println!("  {:>3}: {} {}", i, tile.kind, tile.id);
            }
        }

        print!("Pick a tile (index or id), 'r' to replay this seed, 'n' for a new seed, 'q' to quit: ");
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
            "r" => {
                session.restart_same();
                recorded = false;
                continue;
            }
            "n" => {
                session.restart_with(rand::random());
                recorded = false;
                continue;
            }
            _ => {}
        }

        let choice = parse_choice(trimmed_input, &session.selectable());
        let Some(id) = choice else {
            println!("Unknown choice. Enter a listed index or a tile id like c0-r1-l2-17.");
            continue;
        };
        match session.select(id) {
            Ok(report) if report.cleared_triples > 0 => {
                println!("Took {}; cleared {} triple(s).", report.tile.kind, report.cleared_triples);
            }
            Ok(report) => println!("Took {}.", report.tile.kind),
            Err(e) => println!("{}", e),
        }
    }
    Ok(())
}
