//! Layered stack engine ("buffer triplet" game).
//!
//! Tiles sit at a (column, row, layer) coordinate. Several tiles may share a
//! column and row; the one with the highest layer covers the others. Only
//! uncovered tiles can be taken, and taken tiles go into a bounded buffer that
//! drops every complete same-kind triple.
//!
//! As with the grid engine, every operation returns a new snapshot and leaves
//! its inputs untouched.
use crate::rng::Mulberry32;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// Default buffer capacity; the game is lost once the buffer holds this many.
pub const DEFAULT_SLOT_LIMIT: usize = 7;

/// Number of same-kind tiles that clear from the buffer together.
pub const TRIPLE: usize = 3;

/// Stable identity of a generated tile.
///
/// Encodes where the tile was created and its creation index, so two tiles can
/// never share an id within one layout. Displays as `c{col}-r{row}-l{layer}-{index}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    col: usize,
    row: usize,
    layer: usize,
    index: usize,
}

impl TileId {
    pub fn new(col: usize, row: usize, layer: usize, index: usize) -> Self {
        TileId {
            col,
            row,
            layer,
            index,
        }
    }

    /// Creation index (position in the shuffled pool).
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}-r{}-l{}-{}", self.col, self.row, self.layer, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tile id {0:?}, expected c<col>-r<row>-l<layer>-<index>")]
pub struct ParseTileIdError(String);

impl FromStr for TileId {
    type Err = ParseTileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTileIdError(s.to_string());
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 4 {
            return Err(err());
        }
        let field = |part: &str, prefix: &str| -> Result<usize, ParseTileIdError> {
            part.strip_prefix(prefix)
                .and_then(|n| n.parse().ok())
                .ok_or_else(err)
        };
        Ok(TileId {
            col: field(parts[0], "c")?,
            row: field(parts[1], "r")?,
            layer: field(parts[2], "l")?,
            index: field(parts[3], "")?,
        })
    }
}

/// A tile in the stack. Immutable once generated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StackTile<T> {
    pub id: TileId,
    pub kind: T,
    pub col: usize,
    pub row: usize,
    pub layer: usize,
}

impl<T> StackTile<T> {
    /// Creates a tile whose id is derived from its coordinates and `index`.
    pub fn new(kind: T, col: usize, row: usize, layer: usize, index: usize) -> Self {
        StackTile {
            id: TileId::new(col, row, layer, index),
            kind,
            col,
            row,
            layer,
        }
    }

    /// Returns `true` if `self` sits directly above `other` at the same cell.
    pub fn covers(&self, other: &StackTile<T>) -> bool {
        self.id != other.id
            && self.col == other.col
            && self.row == other.row
            && self.layer > other.layer
    }
}

/// Parameters for [`generate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackConfig<T> {
    pub columns: usize,
    pub min_rows: usize,
    pub max_rows: usize,
    pub max_stack_height: usize,
    pub tile_set: Vec<T>,
}

impl Default for StackConfig<char> {
    fn default() -> Self {
        StackConfig {
            columns: 9,
            min_rows: 5,
            max_rows: 9,
            max_stack_height: 3,
            tile_set: vec![
                '🐑', '🐱', '🐶', '🐷', '🐔', '🐸', '🐙', '🐝', '🐠', '🌽', '🥕', '🍅', '🍆', '🥑',
                '🍄', '🍇',
            ],
        }
    }
}

/// The columns of a stack game. Each column keeps its tiles in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layout<T> {
    columns: Vec<Vec<StackTile<T>>>,
}

impl<T> Layout<T> {
    pub fn from_columns(columns: Vec<Vec<StackTile<T>>>) -> Self {
        Layout { columns }
    }

    pub fn columns(&self) -> &[Vec<StackTile<T>>] {
        &self.columns
    }

    /// All tiles, column by column.
    pub fn tiles(&self) -> impl Iterator<Item = &StackTile<T>> + '_ {
        self.columns.iter().flatten()
    }

    pub fn tile_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn find(&self, id: TileId) -> Option<&StackTile<T>> {
        self.tiles().find(|t| t.id == id)
    }
}

/// Builds a deterministic layout from `seed`.
///
/// Per column a row count in `[min_rows, max_rows]` is drawn, and per row a
/// stack height in `[1, max_stack_height]`. If the total is not a multiple of
/// three the last row of the last column is raised until it is. The tile kinds
/// come from `tile_set` cycled to the total and shuffled with the same
/// generator; they are assigned in column, row, layer order. Each column is
/// finally sorted by ascending layer.
///
/// An empty `tile_set` produces a layout with no tiles.
///
/// # Examples
/// ```
/// use tile_puzzles::stack::{generate, StackConfig};
///
/// let layout = generate(&StackConfig::default(), 1234);
/// assert_eq!(layout.tile_count() % 3, 0);
/// assert_eq!(layout, generate(&StackConfig::default(), 1234));
/// ```
pub fn generate<T: Clone>(config: &StackConfig<T>, seed: u32) -> Layout<T> {
    let mut rng = Mulberry32::new(seed);
    let mut plans: Vec<Vec<usize>> = Vec::with_capacity(config.columns);
    let mut total = 0;

    for _ in 0..config.columns {
        let rows = rng.int_in(config.min_rows as u32, config.max_rows as u32) as usize;
        let mut heights = Vec::with_capacity(rows);
        for _ in 0..rows {
            let height = rng.int_in(1, config.max_stack_height as u32) as usize;
            heights.push(height);
            total += height;
        }
        plans.push(heights);
    }

    let remainder = total % TRIPLE;
    if remainder != 0 {
        let extra = TRIPLE - remainder;
        if let Some(last_column) = plans.last_mut() {
            match last_column.last_mut() {
                Some(height) => *height += extra,
                None => last_column.push(extra),
            }
            total += extra;
        }
    }

    if config.tile_set.is_empty() {
        debug!("stack generation with empty tile set, seed {}", seed);
        return Layout {
            columns: vec![Vec::new(); config.columns],
        };
    }

    let mut pool: Vec<T> = config.tile_set.iter().cycle().take(total).cloned().collect();
    rng.shuffle(&mut pool);

    let mut pool = pool.into_iter();
    let mut cursor = 0;
    let mut columns = Vec::with_capacity(plans.len());
    for (col, heights) in plans.iter().enumerate() {
        let mut tiles = Vec::new();
        for (row, &height) in heights.iter().enumerate() {
            for layer in 0..height {
                if let Some(kind) = pool.next() {
                    tiles.push(StackTile::new(kind, col, row, layer, cursor));
                    cursor += 1;
                }
            }
        }
        tiles.sort_by_key(|t| t.layer);
        columns.push(tiles);
    }

    debug!(
        "generated {} columns with {} tiles from seed {}",
        columns.len(),
        cursor,
        seed
    );
    Layout { columns }
}

/// Returns `true` iff no other tile in `layout` shares `tile`'s column and row
/// with a strictly greater layer.
///
/// Always computed from the current layout; nothing is cached.
pub fn is_selectable<T>(tile: &StackTile<T>, layout: &Layout<T>) -> bool {
    !layout.tiles().any(|other| other.covers(tile))
}

/// All currently selectable tiles, in layout order.
pub fn selectable_tiles<T>(layout: &Layout<T>) -> Vec<&StackTile<T>> {
    layout
        .tiles()
        .filter(|t| is_selectable(t, layout))
        .collect()
}

/// Why [`take`] refused a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TakeError {
    #[error("no tile with id {0}")]
    UnknownTile(TileId),
    #[error("tile {0} is covered by a higher layer")]
    Covered(TileId),
}

/// A successfully taken tile and the layout without it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Taken<T> {
    pub tile: StackTile<T>,
    pub layout: Layout<T>,
}

/// Removes the tile `id` from `layout` if it is selectable.
///
/// No other tile changes: layers of the remaining tiles are never renumbered,
/// so a tile that was covered becomes selectable only because its coverer is
/// gone.
pub fn take<T: Clone>(layout: &Layout<T>, id: TileId) -> Result<Taken<T>, TakeError> {
    let tile = layout.find(id).ok_or(TakeError::UnknownTile(id))?;
    if !is_selectable(tile, layout) {
        return Err(TakeError::Covered(id));
    }
    let columns = layout
        .columns
        .iter()
        .map(|column| column.iter().filter(|t| t.id != id).cloned().collect())
        .collect();
    Ok(Taken {
        tile: tile.clone(),
        layout: Layout { columns },
    })
}

/// The buffer after clearing triples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferResolution<T> {
    pub buffer: Vec<StackTile<T>>,
    /// Tiles removed; always a multiple of three.
    pub cleared: usize,
    pub cleared_triples: usize,
}

/// Removes every complete same-kind triple from `buffer`.
///
/// For a kind with `n` entries the first `3 * (n / 3)` of them, in buffer
/// order, are removed; the 0, 1 or 2 left over stay where they were. Survivors
/// keep their relative order.
pub fn resolve_buffer<T: Clone + Eq + Hash>(buffer: &[StackTile<T>]) -> BufferResolution<T> {
    let mut counts: HashMap<&T, usize> = HashMap::new();
    for entry in buffer {
        *counts.entry(&entry.kind).or_insert(0) += 1;
    }

    let mut quota: HashMap<&T, usize> = counts
        .into_iter()
        .map(|(kind, n)| (kind, n - n % TRIPLE))
        .filter(|&(_, q)| q > 0)
        .collect();

    if quota.is_empty() {
        return BufferResolution {
            buffer: buffer.to_vec(),
            cleared: 0,
            cleared_triples: 0,
        };
    }

    let mut survivors = Vec::with_capacity(buffer.len());
    let mut cleared = 0;
    for entry in buffer {
        match quota.get_mut(&entry.kind) {
            Some(left) if *left > 0 => {
                *left -= 1;
                cleared += 1;
            }
            _ => survivors.push(entry.clone()),
        }
    }

    BufferResolution {
        buffer: survivors,
        cleared,
        cleared_triples: cleared / TRIPLE,
    }
}

/// Returns `true` iff every column is empty.
pub fn is_board_empty<T>(layout: &Layout<T>) -> bool {
    layout.columns.iter().all(Vec::is_empty)
}

/// Returns `true` iff the buffer has reached `slot_limit` entries.
///
/// Callers check this after [`resolve_buffer`], so a move that fills the last
/// slot and completes a triple at once is judged after the clear.
pub fn is_buffer_fail<T>(buffer: &[StackTile<T>], slot_limit: usize) -> bool {
    buffer.len() >= slot_limit
}
