use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tile_puzzles::autoplay::{self, PlayResult, SwapStrategy, TileStrategy};
use tile_puzzles::logger;
use tile_puzzles::match3::GridConfig;
use tile_puzzles::session::{GameStatus, Match3Rules, Match3Session, StackRules, StackSession};
use tile_puzzles::stack::StackConfig;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Plays seeded games with the built-in strategies", long_about = None)]
struct Args {
    /// Number of seeded games per strategy
    #[clap(short, long, default_value_t = 20)]
    games: u32,

    /// First seed; games use consecutive seeds from here
    #[clap(long, default_value_t = 0)]
    start_seed: u32,

    /// Raise log verbosity (repeatable)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Default)]
struct Tally {
    wins: u32,
    moves: u64,
    points: u64,
    games: u32,
}

impl Tally {
    fn add(&mut self, result: PlayResult) {
        if result.status == GameStatus::Won {
            self.wins += 1;
        }
        self.moves += u64::from(result.moves);
        self.points += u64::from(result.points);
        self.games += 1;
    }

    fn report(&self, name: &str, points_label: &str) {
        if self.games == 0 {
            println!("Strategy {}: No games recorded.", name);
            return;
        }
        let n = f64::from(self.games);
        println!(
            "Strategy {:<10}: Win Rate = {:>5.1}%, Average Moves = {:.2}, Average {} = {:.2}",
            name,
            100.0 * f64::from(self.wins) / n,
            self.moves as f64 / n,
            points_label,
            self.points as f64 / n
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(logger::level_from_verbosity(args.verbose)).context("failed to install logger")?;

    let swap_strategies: Vec<(&str, SwapStrategy<char>)> = vec![
        ("FIRST", autoplay::find_scoring_swap as SwapStrategy<char>),
        ("GREEDY", autoplay::find_greediest_swap as SwapStrategy<char>),
    ];
    let tile_strategies: Vec<(&str, TileStrategy<char>)> = vec![
        ("FIRST", autoplay::choose_first_selectable as TileStrategy<char>),
        ("PAIRING", autoplay::choose_pairing_tile as TileStrategy<char>),
    ];

    let mut swap_tallies: Vec<Tally> = swap_strategies.iter().map(|_| Tally::default()).collect();
    let mut tile_tallies: Vec<Tally> = tile_strategies.iter().map(|_| Tally::default()).collect();

    println!("Starting autoplay evaluation for {} seeds...", args.games);

    for game_idx in 0..args.games {
        let seed = args.start_seed.wrapping_add(game_idx);
        println!("\nSeed {}", seed);

        for ((name, strategy), tally) in swap_strategies.iter().zip(swap_tallies.iter_mut()) {
            let mut rng = SmallRng::seed_from_u64(u64::from(seed));
            let mut session =
                Match3Session::new(GridConfig::default(), Match3Rules::default(), &mut rng);
            let result = autoplay::play_match3(&mut session, *strategy);
            println!(
                "  Match-3 {:<10}: {:?}, Score: {:<6}, Moves: {}",
                name, result.status, result.points, result.moves
            );
            tally.add(result);
        }

        for ((name, strategy), tally) in tile_strategies.iter().zip(tile_tallies.iter_mut()) {
            let mut session = StackSession::new(StackConfig::default(), StackRules::default(), seed);
            let result = autoplay::play_stack(&mut session, *strategy);
            println!(
                "  Stack   {:<10}: {:?}, Triples: {:<4}, Moves: {}",
                name, result.status, result.points, result.moves
            );
            tally.add(result);
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("Number of seeds evaluated: {}", args.games);
    println!("\n--- Match-3 ---");
    for ((name, _), tally) in swap_strategies.iter().zip(&swap_tallies) {
        tally.report(name, "Score");
    }
    println!("\n--- Stack ---");
    for ((name, _), tally) in tile_strategies.iter().zip(&tile_tallies) {
        tally.report(name, "Triples");
    }
    Ok(())
}
