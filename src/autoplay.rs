//! Simple automatic players for both games.
//!
//! These strategies drive the sessions end to end. They are used by the
//! `autoplay_evaluator` binary to compare win rates over many seeds, and by
//! tests that need realistic game traces.
use crate::match3::{self, Bag, Board, Position};
use crate::session::{GameStatus, Match3Session, StackSession};
use crate::stack::{self, Layout, StackTile, TileId};
use std::collections::HashMap;
use std::hash::Hash;

/// Picks the next swap for a grid game, or `None` if it sees nothing to do.
pub type SwapStrategy<T> = fn(&Board<T>, &Bag<T>) -> Option<(Position, Position)>;

/// Picks the next tile to take in a stack game.
pub type TileStrategy<T> = fn(&Layout<T>, &[StackTile<T>]) -> Option<TileId>;

/// Every in-bounds right and down neighbour pair, row-major.
fn adjacent_pairs<T>(board: &Board<T>) -> Vec<(Position, Position)> {
    let mut pairs = Vec::new();
    for (here, _) in board.iter() {
        let right = Position::new(here.row, here.col + 1);
        let down = Position::new(here.row + 1, here.col);
        for next in [right, down] {
            if board.contains(next) {
                pairs.push((here, next));
            }
        }
    }
    pairs
}

/// Returns the first swap, scanning row-major, that clears anything.
pub fn find_scoring_swap<T: Clone + PartialEq>(
    board: &Board<T>,
    bag: &Bag<T>,
) -> Option<(Position, Position)> {
    adjacent_pairs(board)
        .into_iter()
        .find(|&(a, b)| match3::attempt_swap(board, bag, a, b).valid)
}

/// Returns the swap that clears the most cells including cascades.
///
/// Ties go to the pair found first.
pub fn find_greediest_swap<T: Clone + PartialEq>(
    board: &Board<T>,
    bag: &Bag<T>,
) -> Option<(Position, Position)> {
    let mut best: Option<((Position, Position), usize)> = None;
    for (a, b) in adjacent_pairs(board) {
        let outcome = match3::attempt_swap(board, bag, a, b);
        if outcome.valid && best.map_or(true, |(_, cleared)| outcome.cleared > cleared) {
            best = Some(((a, b), outcome.cleared));
        }
    }
    best.map(|(pair, _)| pair)
}

/// Takes the first selectable tile in layout order.
pub fn choose_first_selectable<T>(layout: &Layout<T>, _buffer: &[StackTile<T>]) -> Option<TileId> {
    stack::selectable_tiles(layout).first().map(|t| t.id)
}

/// Prefers a selectable tile whose kind already has two entries in the buffer,
/// then one, then any selectable tile. Among equals the kind with the most
/// selectable copies wins, so pairs can be finished later.
pub fn choose_pairing_tile<T: Eq + Hash>(
    layout: &Layout<T>,
    buffer: &[StackTile<T>],
) -> Option<TileId> {
    let mut in_buffer: HashMap<&T, usize> = HashMap::new();
    for entry in buffer {
        *in_buffer.entry(&entry.kind).or_insert(0) += 1;
    }
    let selectable = stack::selectable_tiles(layout);
    let mut on_top: HashMap<&T, usize> = HashMap::new();
    for t in &selectable {
        *on_top.entry(&t.kind).or_insert(0) += 1;
    }

    // `max_by_key` keeps the last maximum, so walk in reverse to favour layout order.
    selectable
        .iter()
        .rev()
        .max_by_key(|t| {
            let held = in_buffer.get(&t.kind).copied().unwrap_or(0) % stack::TRIPLE;
            let visible = on_top.get(&t.kind).copied().unwrap_or(0);
            (held, visible)
        })
        .map(|t| t.id)
}

/// How an automatic game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayResult {
    pub status: GameStatus,
    pub moves: u32,
    /// Score for grid games, cleared triples for stack games.
    pub points: u32,
}

/// Plays `session` to the end with `strategy`.
///
/// When the strategy has nothing to suggest the first adjacent pair is swapped
/// anyway; the session's move limits then end the game.
pub fn play_match3<T: Clone + PartialEq>(
    session: &mut Match3Session<T>,
    strategy: SwapStrategy<T>,
) -> PlayResult {
    while session.status() == GameStatus::Playing {
        let state = session.state();
        let pick = strategy(&state.board, &state.bag)
            .or_else(|| adjacent_pairs(&state.board).into_iter().next());
        let Some((a, b)) = pick else {
            break;
        };
        if session.swap(a, b).is_err() {
            break;
        }
    }
    PlayResult {
        status: session.status(),
        moves: session.moves(),
        points: session.score(),
    }
}

/// Plays `session` to the end with `strategy`.
pub fn play_stack<T: Clone + Eq + Hash>(
    session: &mut StackSession<T>,
    strategy: TileStrategy<T>,
) -> PlayResult {
    while session.status() == GameStatus::Playing {
        let Some(id) = strategy(session.layout(), session.buffer()) else {
            break;
        };
        if session.select(id).is_err() {
            break;
        }
    }
    PlayResult {
        status: session.status(),
        moves: session.moves(),
        points: session.cleared_triples(),
    }
}
