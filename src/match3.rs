//! Grid match-3 engine.
//!
//! This module defines the grid game's fundamental components:
//! - `Cell`: an empty slot or a slot holding one tile value.
//! - `Board`: a fixed `rows x cols` grid with run detection, clearing and
//!   column collapse (gravity plus refill).
//! - `Bag`: the finite, pre-shuffled tile supply consumed during refill.
//! - `attempt_swap`: validates an adjacent swap and resolves the full cascade.
//!
//! Every public operation takes its inputs by reference and returns a fresh
//! snapshot; nothing passed in is ever mutated.
use log::debug;
use rand::Rng;
use std::fmt;

/// Minimum number of identical adjacent tiles that forms a match.
pub const MIN_RUN: usize = 3;

/// Default number of board-fulls of tiles placed in the bag.
pub const DEFAULT_BAG_MULTIPLIER: usize = 3;

/// Contents of a single board position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell<T> {
    /// No tile; left behind by a clear once the bag is exhausted.
    Empty,
    /// A tile value.
    Occupied(T),
}

impl<T> Cell<T> {
    /// Returns `true` if the cell holds no tile.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Returns the tile held by the cell, if any.
    pub fn tile(&self) -> Option<&T> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(t) => Some(t),
        }
    }
}

impl<T> Default for Cell<T> {
    fn default() -> Self {
        Cell::Empty
    }
}

impl<T> From<Option<T>> for Cell<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(t) => Cell::Occupied(t),
            None => Cell::Empty,
        }
    }
}

/// A (row, column) address on the board. Row 0 is the top row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Returns `true` if `other` is exactly one step away horizontally or
    /// vertically (Manhattan distance 1).
    ///
    /// # Examples
    /// ```
    /// use tile_puzzles::match3::Position;
    /// assert!(Position::new(2, 2).is_adjacent(Position::new(2, 3)));
    /// assert!(!Position::new(2, 2).is_adjacent(Position::new(3, 3)));
    /// assert!(!Position::new(2, 2).is_adjacent(Position::new(2, 2)));
    /// ```
    pub fn is_adjacent(self, other: Position) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The finite tile supply. Tiles are drawn from the end.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bag<T> {
    tiles: Vec<T>,
}

impl<T: Clone> Bag<T> {
    /// Builds a bag of `size` tiles by cycling through `tile_set`, then shuffles
    /// it with an unbiased Fisher-Yates pass driven by `rng`.
    ///
    /// An empty `tile_set` yields an empty bag.
    pub fn new_shuffled<R: Rng + ?Sized>(size: usize, tile_set: &[T], rng: &mut R) -> Self {
        if tile_set.is_empty() {
            return Bag { tiles: Vec::new() };
        }
        let mut tiles: Vec<T> = tile_set.iter().cycle().take(size).cloned().collect();
        for i in (1..tiles.len()).rev() {
            let j = rng.gen_range(0..=i);
            tiles.swap(i, j);
        }
        Bag { tiles }
    }
}

impl<T> Bag<T> {
    /// Wraps an already ordered tile sequence. The last element is drawn first.
    pub fn from_vec(tiles: Vec<T>) -> Self {
        Bag { tiles }
    }

    /// Removes and returns the tile at the end of the bag.
    pub fn draw(&mut self) -> Option<T> {
        self.tiles.pop()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.tiles
    }
}

/// A fixed-size grid of cells stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board<T> {
    rows: usize,
    cols: usize,
    cells: Vec<Cell<T>>,
}

impl<T> Board<T> {
    /// Creates a board where every cell is `Cell::Empty`.
    pub fn new_empty(rows: usize, cols: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        cells.resize_with(rows * cols, || Cell::Empty);
        Board { rows, cols, cells }
    }

    /// Builds a board from explicit rows of cells.
    ///
    /// # Returns
    /// * `Err(String)` if the rows do not all have the same width.
    pub fn from_rows(rows: Vec<Vec<Cell<T>>>) -> Result<Self, String> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(height * width);
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "Row {} has {} cells, expected {}",
                    r,
                    row.len(),
                    width
                ));
            }
            cells.extend(row);
        }
        Ok(Board {
            rows: height,
            cols: width,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `true` if `pos` lies on the board.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Returns the cell at `pos`, or `None` when `pos` is off the board.
    pub fn get(&self, pos: Position) -> Option<&Cell<T>> {
        if self.contains(pos) {
            self.cells.get(self.index(pos))
        } else {
            None
        }
    }

    /// Returns the tile at (`r`, `c`), or `None` for an empty or off-board cell.
    pub fn get_tile(&self, r: usize, c: usize) -> Option<&T> {
        self.get(Position::new(r, c)).and_then(Cell::tile)
    }

    /// Iterates over all cells in row-major order together with their position.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell<T>)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Position::new(i / cols, i % cols), cell))
    }

    /// Returns `true` iff at least one cell holds a tile.
    pub fn has_any_tiles(&self) -> bool {
        self.cells.iter().any(|c| !c.is_empty())
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Returns `true` if no column has an empty cell below an occupied one.
    pub fn is_settled(&self) -> bool {
        (0..self.cols).all(|c| {
            let mut seen_tile = false;
            for r in 0..self.rows {
                let empty = self.cells[r * self.cols + c].is_empty();
                if !empty {
                    seen_tile = true;
                } else if seen_tile {
                    return false;
                }
            }
            true
        })
    }

    fn index(&self, pos: Position) -> usize {
        pos.row * self.cols + pos.col
    }

    fn swap_cells(&mut self, a: Position, b: Position) {
        let (ia, ib) = (self.index(a), self.index(b));
        self.cells.swap(ia, ib);
    }

    /// Empties every listed cell and returns how many held a tile.
    fn clear_positions(&mut self, positions: &[Position]) -> usize {
        let mut cleared = 0;
        for &pos in positions {
            let idx = self.index(pos);
            if !self.cells[idx].is_empty() {
                self.cells[idx] = Cell::Empty;
                cleared += 1;
            }
        }
        cleared
    }

    /// Compacts every column downward, keeping relative order, then fills the
    /// exposed top cells from the bag. Returns how many tiles were drawn.
    ///
    /// Gaps stay empty once the bag runs out.
    fn collapse(&mut self, bag: &mut Bag<T>) -> usize {
        let mut drawn = 0;
        for c in 0..self.cols {
            // Bottom-up: surviving tiles first, then freshly drawn ones.
            let mut column: Vec<Cell<T>> = Vec::with_capacity(self.rows);
            for r in (0..self.rows).rev() {
                let idx = r * self.cols + c;
                let cell = std::mem::take(&mut self.cells[idx]);
                if !cell.is_empty() {
                    column.push(cell);
                }
            }
            while column.len() < self.rows {
                match bag.draw() {
                    Some(tile) => {
                        column.push(Cell::Occupied(tile));
                        drawn += 1;
                    }
                    None => break,
                }
            }
            for (offset, cell) in column.into_iter().enumerate() {
                let r = self.rows - 1 - offset;
                self.cells[r * self.cols + c] = cell;
            }
        }
        drawn
    }
}

impl<T: PartialEq> Board<T> {
    /// Finds every cell that belongs to a horizontal or vertical run of at
    /// least [`MIN_RUN`] identical tiles.
    ///
    /// A cell that sits in both a horizontal and a vertical run is reported
    /// once. The result is sorted row-major.
    pub fn find_matches(&self) -> Vec<Position> {
        let mut marked = vec![false; self.cells.len()];

        for r in 0..self.rows {
            let line: Vec<Position> = (0..self.cols).map(|c| Position::new(r, c)).collect();
            self.mark_runs(&line, &mut marked);
        }
        for c in 0..self.cols {
            let line: Vec<Position> = (0..self.rows).map(|r| Position::new(r, c)).collect();
            self.mark_runs(&line, &mut marked);
        }

        marked
            .iter()
            .enumerate()
            .filter(|(_, m)| **m)
            .map(|(i, _)| Position::new(i / self.cols, i % self.cols))
            .collect()
    }

    fn mark_runs(&self, line: &[Position], marked: &mut [bool]) {
        let mut start = 0;
        while start < line.len() {
            let mut end = start + 1;
            if let Some(tile) = self.cells[self.index(line[start])].tile() {
                while end < line.len() && self.cells[self.index(line[end])].tile() == Some(tile) {
                    end += 1;
                }
                if end - start >= MIN_RUN {
                    for &pos in &line[start..end] {
                        marked[self.index(pos)] = true;
                    }
                }
            }
            start = end;
        }
    }

    /// Returns `true` if any row or column holds a run of [`MIN_RUN`] or more.
    pub fn has_matches(&self) -> bool {
        !self.find_matches().is_empty()
    }
}

impl<T: fmt::Display> Board<T> {
    /// Renders the board with row/column numbers, marking `pos` with `>`.
    ///
    /// Empty cells are shown as `.`.
    pub fn to_string_with_highlight(&self, pos: Option<Position>) -> String {
        let mut output = String::from("   ");
        for c_idx in 0..self.cols {
            output.push_str(&format!("{:<3}", c_idx));
        }
        for r_idx in 0..self.rows {
            output.push('\n');
            output.push_str(&format!("{:<3}", r_idx));
            for c_idx in 0..self.cols {
                let here = Position::new(r_idx, c_idx);
                let marker = if pos == Some(here) { '>' } else { ' ' };
                let symbol = match &self.cells[self.index(here)] {
                    Cell::Empty => ".".to_string(),
                    Cell::Occupied(t) => t.to_string(),
                };
                output.push_str(&format!("{}{:<2}", marker, symbol));
            }
        }
        output
    }
}

impl<T: fmt::Display> fmt::Display for Board<T> {
    /// Compact form: one line per row, `.` for empty cells.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            if r > 0 {
                writeln!(f)?;
            }
            for c in 0..self.cols {
                match &self.cells[r * self.cols + c] {
                    Cell::Empty => write!(f, ".")?,
                    Cell::Occupied(t) => write!(f, "{}", t)?,
                }
            }
        }
        Ok(())
    }
}

/// Parameters for a new grid game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridConfig<T> {
    pub rows: usize,
    pub cols: usize,
    pub tile_set: Vec<T>,
    pub bag_multiplier: usize,
}

impl<T> GridConfig<T> {
    pub fn new(rows: usize, cols: usize, tile_set: Vec<T>) -> Self {
        GridConfig {
            rows,
            cols,
            tile_set,
            bag_multiplier: DEFAULT_BAG_MULTIPLIER,
        }
    }

    /// Total number of tiles the bag starts with.
    pub fn bag_size(&self) -> usize {
        self.rows * self.cols * self.bag_multiplier
    }
}

impl Default for GridConfig<char> {
    fn default() -> Self {
        GridConfig::new(6, 6, vec!['🍎', '🍋', '🍇', '🍒', '🥝', '🍊'])
    }
}

/// A board together with the bag that refills it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridState<T> {
    pub board: Board<T>,
    pub bag: Bag<T>,
}

impl<T> GridState<T> {
    /// The win condition: nothing on the board and nothing left to draw.
    pub fn is_exhausted(&self) -> bool {
        !self.board.has_any_tiles() && self.bag.is_empty()
    }
}

/// Builds the bag for `config`, shuffles it with `rng` and fills the board
/// row-major by drawing from the end of the bag.
///
/// If the bag runs out before the board is full the remaining cells are left
/// empty.
///
/// # Examples
/// ```
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
/// use tile_puzzles::match3::{create, GridConfig};
///
/// let config = GridConfig::default();
/// let state = create(&config, &mut SmallRng::seed_from_u64(1));
/// assert_eq!(state.board.occupied_count(), 36);
/// assert_eq!(state.bag.len(), 36 * 3 - 36);
/// ```
pub fn create<T: Clone, R: Rng + ?Sized>(config: &GridConfig<T>, rng: &mut R) -> GridState<T> {
    let mut bag = Bag::new_shuffled(config.bag_size(), &config.tile_set, rng);
    let mut board = Board::new_empty(config.rows, config.cols);
    for cell in board.cells.iter_mut() {
        *cell = bag.draw().into();
    }
    debug!(
        "created {}x{} board, {} tiles left in bag",
        config.rows,
        config.cols,
        bag.len()
    );
    GridState { board, bag }
}

/// The result of running the cascade to a stable board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution<T> {
    pub board: Board<T>,
    pub bag: Bag<T>,
    /// Cells cleared across all rounds.
    pub cleared: usize,
    /// Tiles drawn from the bag across all rounds.
    pub drawn: usize,
    /// Number of find-clear-collapse rounds that cleared something.
    pub rounds: usize,
}

/// Repeats find, clear, collapse and refill until no run remains.
///
/// Terminates because every round clears at least [`MIN_RUN`] cells and the
/// bag can only shrink.
pub fn resolve<T: PartialEq>(mut board: Board<T>, mut bag: Bag<T>) -> Resolution<T> {
    let mut cleared = 0;
    let mut drawn = 0;
    let mut rounds = 0;

    loop {
        let matches = board.find_matches();
        if matches.is_empty() {
            break;
        }
        let round_cleared = board.clear_positions(&matches);
        let round_drawn = board.collapse(&mut bag);
        rounds += 1;
        cleared += round_cleared;
        drawn += round_drawn;
        debug!(
            "cascade round {}: cleared {}, drew {}, bag {}",
            rounds,
            round_cleared,
            round_drawn,
            bag.len()
        );
    }

    Resolution {
        board,
        bag,
        cleared,
        drawn,
        rounds,
    }
}

/// Why a swap was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapRejection {
    /// One of the positions is off the board.
    OutOfBounds,
    /// The positions are not exactly one step apart.
    NotAdjacent,
    /// The swap was legal but produced no match and was reverted.
    NoMatch,
}

/// The result of [`attempt_swap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapOutcome<T> {
    pub board: Board<T>,
    pub bag: Bag<T>,
    /// Total cells cleared across every cascade round.
    pub cleared: usize,
    /// Tiles drawn from the bag to refill the board.
    pub drawn: usize,
    /// Number of cascade rounds.
    pub rounds: usize,
    pub valid: bool,
    /// Set whenever `valid` is `false`.
    pub rejection: Option<SwapRejection>,
}

impl<T: Clone> SwapOutcome<T> {
    fn rejected(board: &Board<T>, bag: &Bag<T>, reason: SwapRejection) -> Self {
        SwapOutcome {
            board: board.clone(),
            bag: bag.clone(),
            cleared: 0,
            drawn: 0,
            rounds: 0,
            valid: false,
            rejection: Some(reason),
        }
    }
}

/// Attempts to swap the tiles at `a` and `b` and resolve the resulting cascade.
///
/// # Arguments
/// * `board`, `bag`: the current snapshot; neither is modified.
/// * `a`, `b`: the two positions to exchange.
///
/// # Returns
/// A `SwapOutcome` where:
/// * non-adjacent or off-board positions give `valid == false` with the input
///   state unchanged;
/// * an adjacent swap that clears nothing is reverted, again `valid == false`
///   with the original board and bag;
/// * otherwise the post-cascade board and bag, `valid == true` and the total
///   number of cleared cells.
pub fn attempt_swap<T: Clone + PartialEq>(
    board: &Board<T>,
    bag: &Bag<T>,
    a: Position,
    b: Position,
) -> SwapOutcome<T> {
    if !board.contains(a) || !board.contains(b) {
        debug!("swap {} <-> {} rejected: off board", a, b);
        return SwapOutcome::rejected(board, bag, SwapRejection::OutOfBounds);
    }
    if !a.is_adjacent(b) {
        debug!("swap {} <-> {} rejected: not adjacent", a, b);
        return SwapOutcome::rejected(board, bag, SwapRejection::NotAdjacent);
    }

    let mut working = board.clone();
    working.swap_cells(a, b);
    let resolution = resolve(working, bag.clone());

    if resolution.cleared == 0 {
        debug!("swap {} <-> {} reverted: no match", a, b);
        return SwapOutcome::rejected(board, bag, SwapRejection::NoMatch);
    }

    SwapOutcome {
        board: resolution.board,
        bag: resolution.bag,
        cleared: resolution.cleared,
        drawn: resolution.drawn,
        rounds: resolution.rounds,
        valid: true,
        rejection: None,
    }
}

/// Returns `true` iff at least one cell of `board` holds a tile.
pub fn has_any_tiles<T>(board: &Board<T>) -> bool {
    board.has_any_tiles()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::grid_from_str_rows;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_position_adjacency() {
        let p = Position::new(1, 1);
        assert!(p.is_adjacent(Position::new(0, 1)));
        assert!(p.is_adjacent(Position::new(2, 1)));
        assert!(p.is_adjacent(Position::new(1, 0)));
        assert!(p.is_adjacent(Position::new(1, 2)));
        assert!(!p.is_adjacent(Position::new(0, 0)));
        assert!(!p.is_adjacent(Position::new(1, 3)));
        assert!(!p.is_adjacent(p));
    }

    #[test]
    fn test_bag_cycles_tile_set() {
        let mut rng = SmallRng::seed_from_u64(3);
        let bag = Bag::new_shuffled(12, &['A', 'B', 'C'], &mut rng);
        assert_eq!(bag.len(), 12);
        for t in ['A', 'B', 'C'] {
            assert_eq!(bag.as_slice().iter().filter(|&&x| x == t).count(), 4);
        }
    }

    #[test]
    fn test_bag_empty_tile_set() {
        let mut rng = SmallRng::seed_from_u64(3);
        let bag: Bag<char> = Bag::new_shuffled(10, &[], &mut rng);
        assert!(bag.is_empty());
    }

    #[test]
    fn test_bag_draws_from_end() {
        let mut bag = Bag::from_vec(vec!['A', 'B', 'C']);
        assert_eq!(bag.draw(), Some('C'));
        assert_eq!(bag.draw(), Some('B'));
        assert_eq!(bag.draw(), Some('A'));
        assert_eq!(bag.draw(), None);
    }

    #[test]
    fn test_create_fills_board_and_sizes_bag() {
        let config = GridConfig::new(6, 6, vec!['A', 'B', 'C', 'D', 'E', 'F']);
        let state = create(&config, &mut SmallRng::seed_from_u64(42));
        assert_eq!(state.board.rows(), 6);
        assert_eq!(state.board.cols(), 6);
        assert_eq!(state.board.occupied_count(), 36);
        assert_eq!(state.bag.len(), 6 * 6 * 3 - 36);
    }

    #[test]
    fn test_create_is_deterministic_per_seed() {
        let config = GridConfig::new(5, 5, vec!['A', 'B', 'C', 'D']);
        let a = create(&config, &mut SmallRng::seed_from_u64(9));
        let b = create(&config, &mut SmallRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_create_with_short_bag_leaves_empty_cells() {
        let mut config = GridConfig::new(4, 4, vec!['A', 'B']);
        config.bag_multiplier = 0;
        let state = create(&config, &mut SmallRng::seed_from_u64(1));
        assert!(!state.board.has_any_tiles());
        assert!(state.is_exhausted());
    }

    #[test]
    fn test_create_fills_row_major_from_bag_end() {
        // Single-symbol set: the shuffle order cannot matter.
        let config = GridConfig {
            rows: 2,
            cols: 3,
            tile_set: vec!['Z'],
            bag_multiplier: 1,
        };
        let state = create(&config, &mut SmallRng::seed_from_u64(0));
        assert_eq!(state.board.to_string(), "ZZZ\nZZZ");
        assert!(state.bag.is_empty());
    }

    #[test]
    fn test_find_matches_horizontal_and_vertical_dedup() {
        let board = grid_from_str_rows(&["AAAB", "ACDB", "AEFB"]).unwrap();
        let matches = board.find_matches();
        let expected = vec![
            Position::new(0, 0),
            Position::new(0, 1),
            Position::new(0, 2),
            Position::new(0, 3),
            Position::new(1, 0),
            Position::new(1, 3),
            Position::new(2, 0),
            Position::new(2, 3),
        ];
        assert_eq!(matches, expected);
    }

    #[test]
    fn test_find_matches_ignores_runs_of_two_and_empties() {
        let board = grid_from_str_rows(&["AAB.", "...B", "CC.."]).unwrap();
        assert!(board.find_matches().is_empty());
    }

    #[test]
    fn test_find_matches_long_run() {
        let board = grid_from_str_rows(&["BAAAAB"]).unwrap();
        assert_eq!(board.find_matches().len(), 4);
    }

    #[test]
    fn test_collapse_preserves_order_and_refills_top() {
        let mut board = grid_from_str_rows(&["A", ".", "B", "."]).unwrap();
        let mut bag = Bag::from_vec(vec!['Y', 'X']);
        let drawn = board.collapse(&mut bag);
        assert_eq!(drawn, 2);
        // Bottom-up: B, A, then X (first draw), then Y.
        assert_eq!(board.to_string(), "Y\nX\nA\nB");
        assert!(bag.is_empty());
    }

    #[test]
    fn test_collapse_with_empty_bag_leaves_top_gaps() {
        let mut board = grid_from_str_rows(&["A.", "..", "B."]).unwrap();
        let mut bag: Bag<char> = Bag::from_vec(Vec::new());
        assert_eq!(board.collapse(&mut bag), 0);
        assert_eq!(board.to_string(), "..\nA.\nB.");
        assert!(board.is_settled());
    }

    #[test]
    fn test_swap_rejects_non_adjacent() {
        let board = grid_from_str_rows(&["ABA", "BAB", "ABA"]).unwrap();
        let bag = Bag::from_vec(vec!['C'; 5]);
        let outcome = attempt_swap(&board, &bag, Position::new(0, 0), Position::new(2, 2));
        assert!(!outcome.valid);
        assert_eq!(outcome.rejection, Some(SwapRejection::NotAdjacent));
        assert_eq!(outcome.board, board);
        assert_eq!(outcome.bag, bag);
        assert_eq!(outcome.cleared, 0);
    }

    #[test]
    fn test_swap_rejects_off_board() {
        let board = grid_from_str_rows(&["AB", "BA"]).unwrap();
        let bag = Bag::from_vec(vec!['C']);
        let outcome = attempt_swap(&board, &bag, Position::new(1, 1), Position::new(1, 2));
        assert!(!outcome.valid);
        assert_eq!(outcome.rejection, Some(SwapRejection::OutOfBounds));
        assert_eq!(outcome.board, board);
    }

    #[test]
    fn test_swap_without_match_is_reverted() {
        let board = grid_from_str_rows(&["ABC", "DEF", "GHI"]).unwrap();
        let bag = Bag::from_vec(vec!['Z'; 4]);
        let outcome = attempt_swap(&board, &bag, Position::new(0, 0), Position::new(0, 1));
        assert!(!outcome.valid);
        assert_eq!(outcome.rejection, Some(SwapRejection::NoMatch));
        assert_eq!(outcome.board, board);
        assert_eq!(outcome.bag, bag);
    }

    #[test]
    fn test_swap_equal_tiles_is_reverted() {
        let board = grid_from_str_rows(&["AAB", "CDE"]).unwrap();
        let bag = Bag::from_vec(vec!['Z'; 3]);
        let outcome = attempt_swap(&board, &bag, Position::new(0, 0), Position::new(0, 1));
        assert!(!outcome.valid);
        assert_eq!(outcome.board, board);
    }

    #[test]
    fn test_swap_completing_run_clears_and_refills() {
        // Swapping (1,2) up into (0,2) completes "AAA" on the top row.
        let board = grid_from_str_rows(&["AAB", "CDA", "EFG"]).unwrap();
        let bag = Bag::from_vec(vec!['X', 'Y', 'Z']);
        let outcome = attempt_swap(&board, &bag, Position::new(0, 2), Position::new(1, 2));
        assert!(outcome.valid);
        assert_eq!(outcome.rejection, None);
        assert_eq!(outcome.cleared, 3);
        assert_eq!(outcome.drawn, 3);
        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.board.to_string(), "ZYX\nCDB\nEFG");
        assert!(outcome.bag.is_empty());
        // Inputs untouched.
        assert_eq!(board.to_string(), "AAB\nCDA\nEFG");
        assert_eq!(bag.len(), 3);
    }

    #[test]
    fn test_swap_clears_vertical_run_without_refill() {
        // Swapping (2,0) and (3,0) lines up A,A,A in column 0.
        let board = grid_from_str_rows(&["ACD", "AEF", "CBB", "ABG"]).unwrap();
        let bag: Bag<char> = Bag::from_vec(Vec::new());
        let outcome = attempt_swap(&board, &bag, Position::new(2, 0), Position::new(3, 0));
        assert!(outcome.valid);
        assert_eq!(outcome.cleared, 3);
        assert_eq!(outcome.drawn, 0);
        assert_eq!(outcome.board.to_string(), ".CD\n.EF\n.BB\nCBG");
        assert!(!outcome.board.has_matches());
        assert!(outcome.board.is_settled());
    }

    #[test]
    fn test_multi_round_cascade_counts_all_rounds() {
        // Round 1 clears the vertical AAA in column 0; the B that falls makes a
        // horizontal BBB on the bottom row for round 2.
        let board = grid_from_str_rows(&["B..", "A..", "A..", "ABB"]).unwrap();
        let resolution = resolve(board, Bag::from_vec(Vec::new()));
        assert_eq!(resolution.rounds, 2);
        assert_eq!(resolution.cleared, 6);
        assert_eq!(resolution.drawn, 0);
        assert!(!resolution.board.has_any_tiles());
    }

    #[test]
    fn test_resolve_conservation() {
        let config = GridConfig::new(8, 8, vec!['A', 'B', 'C']);
        let state = create(&config, &mut SmallRng::seed_from_u64(5));
        let before = state.board.occupied_count();
        let bag_before = state.bag.len();
        let resolution = resolve(state.board, state.bag);
        assert_eq!(
            resolution.board.occupied_count() + resolution.cleared,
            before + resolution.drawn
        );
        assert_eq!(bag_before - resolution.bag.len(), resolution.drawn);
        assert!(!resolution.board.has_matches());
    }

    #[test]
    fn test_has_any_tiles() {
        let empty: Board<char> = Board::new_empty(3, 3);
        assert!(!has_any_tiles(&empty));
        let one = grid_from_str_rows(&["...", ".A.", "..."]).unwrap();
        assert!(has_any_tiles(&one));
    }

    #[test]
    fn test_highlight_rendering() {
        let board = grid_from_str_rows(&["AB", ".C"]).unwrap();
        let text = board.to_string_with_highlight(Some(Position::new(1, 1)));
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains(">C"));
        assert!(text.contains(" ."));
    }

    #[test]
    fn test_iter_is_row_major_with_positions() {
        let board = grid_from_str_rows(&["AB.", "C.D"]).unwrap();
        let cells: Vec<(Position, Option<char>)> =
            board.iter().map(|(pos, cell)| (pos, cell.tile().copied())).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (Position::new(0, 0), Some('A')));
        assert_eq!(cells[2], (Position::new(0, 2), None));
        assert_eq!(cells[3], (Position::new(1, 0), Some('C')));
        assert_eq!(cells[5], (Position::new(1, 2), Some('D')));
    }
}
