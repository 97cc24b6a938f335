//! Game sessions: move counters, scoring and terminal status on top of the
//! stateless engines.
//!
//! A session owns the current snapshot and replaces it after every accepted
//! action. Once a session reaches `Won` or `Lost` further actions are refused
//! until it is restarted.
use crate::match3::{self, GridConfig, GridState, Position, SwapRejection};
use crate::stack::{self, Layout, StackConfig, StackTile, TakeError, TileId};
use log::{debug, info};
use rand::Rng;
use std::hash::Hash;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the game is over; restart to keep playing")]
    NotPlaying,
    #[error(transparent)]
    Take(#[from] TakeError),
}

/// Limits and scoring for a grid session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match3Rules {
    /// Total swaps (valid or not) before the game is lost.
    pub max_moves: u32,
    /// Rejected swaps before the game is lost.
    pub max_invalid_moves: u32,
    pub points_per_tile: u32,
}

impl Default for Match3Rules {
    fn default() -> Self {
        Match3Rules {
            max_moves: 40,
            max_invalid_moves: 8,
            points_per_tile: 10,
        }
    }
}

/// What one swap did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapReport {
    pub valid: bool,
    pub rejection: Option<SwapRejection>,
    pub cleared: usize,
    pub points: u32,
    pub status: GameStatus,
}

#[derive(Clone, Debug)]
pub struct Match3Session<T> {
    config: GridConfig<T>,
    rules: Match3Rules,
    state: GridState<T>,
    status: GameStatus,
    score: u32,
    moves: u32,
    invalid_moves: u32,
    cleared_tiles: u32,
}

impl<T: Clone + PartialEq> Match3Session<T> {
    pub fn new<R: Rng + ?Sized>(config: GridConfig<T>, rules: Match3Rules, rng: &mut R) -> Self {
        let state = match3::create(&config, rng);
        Match3Session {
            config,
            rules,
            state,
            status: GameStatus::Playing,
            score: 0,
            moves: 0,
            invalid_moves: 0,
            cleared_tiles: 0,
        }
    }

    /// Starts over with a freshly shuffled bag and zeroed counters.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.state = match3::create(&self.config, rng);
        self.status = GameStatus::Playing;
        self.score = 0;
        self.moves = 0;
        self.invalid_moves = 0;
        self.cleared_tiles = 0;
    }

    /// Swaps `a` and `b`.
    ///
    /// Every call while playing counts as a move. A rejected swap also counts
    /// as an invalid move; the game is lost when either counter reaches its
    /// limit. A valid swap scores `points_per_tile` per cleared cell, and the
    /// game is won once the board and bag are both empty.
    pub fn swap(&mut self, a: Position, b: Position) -> Result<SwapReport, SessionError> {
        if self.status != GameStatus::Playing {
            return Err(SessionError::NotPlaying);
        }

        let outcome = match3::attempt_swap(&self.state.board, &self.state.bag, a, b);
        self.moves += 1;

        if !outcome.valid {
            self.invalid_moves += 1;
            if self.invalid_moves >= self.rules.max_invalid_moves
                || self.moves >= self.rules.max_moves
            {
                self.finish(GameStatus::Lost);
            }
            return Ok(SwapReport {
                valid: false,
                rejection: outcome.rejection,
                cleared: 0,
                points: 0,
                status: self.status,
            });
        }

        let cleared = outcome.cleared as u32;
        let points = cleared * self.rules.points_per_tile;
        self.score += points;
        self.cleared_tiles += cleared;
        self.state = GridState {
            board: outcome.board,
            bag: outcome.bag,
        };
        debug!(
            "swap {} <-> {} cleared {} in {} rounds",
            a, b, cleared, outcome.rounds
        );

        if self.state.is_exhausted() {
            self.finish(GameStatus::Won);
        } else if self.moves >= self.rules.max_moves {
            self.finish(GameStatus::Lost);
        }

        Ok(SwapReport {
            valid: true,
            rejection: None,
            cleared: outcome.cleared,
            points,
            status: self.status,
        })
    }

    fn finish(&mut self, status: GameStatus) {
        self.status = status;
        info!(
            "match-3 game {:?}: score {}, moves {}, invalid {}, cleared {}",
            status, self.score, self.moves, self.invalid_moves, self.cleared_tiles
        );
    }
}

impl<T> Match3Session<T> {
    pub fn state(&self) -> &GridState<T> {
        &self.state
    }

    pub fn rules(&self) -> &Match3Rules {
        &self.rules
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn invalid_moves(&self) -> u32 {
        self.invalid_moves
    }

    pub fn cleared_tiles(&self) -> u32 {
        self.cleared_tiles
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackRules {
    pub slot_limit: usize,
}

impl Default for StackRules {
    fn default() -> Self {
        StackRules {
            slot_limit: stack::DEFAULT_SLOT_LIMIT,
        }
    }
}

/// What one selection did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectReport<T> {
    pub tile: StackTile<T>,
    pub cleared_triples: usize,
    pub status: GameStatus,
}

#[derive(Clone, Debug)]
pub struct StackSession<T> {
    config: StackConfig<T>,
    rules: StackRules,
    seed: u32,
    layout: Layout<T>,
    buffer: Vec<StackTile<T>>,
    status: GameStatus,
    moves: u32,
    cleared_triples: u32,
}

impl<T: Clone + Eq + Hash> StackSession<T> {
    pub fn new(config: StackConfig<T>, rules: StackRules, seed: u32) -> Self {
        let layout = stack::generate(&config, seed);
        StackSession {
            config,
            rules,
            seed,
            layout,
            buffer: Vec::new(),
            status: GameStatus::Playing,
            moves: 0,
            cleared_triples: 0,
        }
    }

    /// Replays the current seed from the start.
    pub fn restart_same(&mut self) {
        self.restart_with(self.seed);
    }

    /// Starts a new layout from `seed`.
    pub fn restart_with(&mut self, seed: u32) {
        self.seed = seed;
        self.layout = stack::generate(&self.config, seed);
        self.buffer.clear();
        self.status = GameStatus::Playing;
        self.moves = 0;
        self.cleared_triples = 0;
    }

    /// Moves tile `id` into the buffer and clears any triples.
    ///
    /// A covered or unknown tile is refused without counting a move. After an
    /// accepted move the game is won if the board and buffer are both empty,
    /// lost if the board is empty but the buffer is not, and lost if the buffer
    /// has reached the slot limit after clearing.
    pub fn select(&mut self, id: TileId) -> Result<SelectReport<T>, SessionError> {
        if self.status != GameStatus::Playing {
            return Err(SessionError::NotPlaying);
        }

        let taken = stack::take(&self.layout, id)?;
        self.buffer.push(taken.tile.clone());
        let resolved = stack::resolve_buffer(&self.buffer);

        self.layout = taken.layout;
        self.buffer = resolved.buffer;
        self.moves += 1;
        self.cleared_triples += resolved.cleared_triples as u32;
        debug!(
            "took {} ({} in buffer, {} triples cleared)",
            id,
            self.buffer.len(),
            resolved.cleared_triples
        );

        if stack::is_board_empty(&self.layout) {
            if self.buffer.is_empty() {
                self.finish(GameStatus::Won);
            } else {
                self.finish(GameStatus::Lost);
            }
        } else if stack::is_buffer_fail(&self.buffer, self.rules.slot_limit) {
            self.finish(GameStatus::Lost);
        }

        Ok(SelectReport {
            tile: taken.tile,
            cleared_triples: resolved.cleared_triples,
            status: self.status,
        })
    }

    /// Tiles that can be selected right now.
    pub fn selectable(&self) -> Vec<&StackTile<T>> {
        stack::selectable_tiles(&self.layout)
    }

    fn finish(&mut self, status: GameStatus) {
        self.status = status;
        info!(
            "stack game {:?}: seed {}, moves {}, triples {}",
            status, self.seed, self.moves, self.cleared_triples
        );
    }
}

impl<T> StackSession<T> {
    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn layout(&self) -> &Layout<T> {
        &self.layout
    }

    pub fn buffer(&self) -> &[StackTile<T>] {
        &self.buffer
    }

    pub fn rules(&self) -> &StackRules {
        &self.rules
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn cleared_triples(&self) -> u32 {
        self.cleared_triples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn small_grid() -> GridConfig<char> {
        GridConfig::new(4, 4, vec!['A', 'B', 'C', 'D'])
    }

    fn single_kind_stack() -> StackConfig<char> {
        StackConfig {
            columns: 1,
            min_rows: 3,
            max_rows: 3,
            max_stack_height: 1,
            tile_set: vec!['X'],
        }
    }

    #[test]
    fn test_match3_invalid_moves_lose() {
        let mut rng = SmallRng::seed_from_u64(1);
        let rules = Match3Rules {
            max_invalid_moves: 3,
            ..Match3Rules::default()
        };
        let mut session = Match3Session::new(small_grid(), rules, &mut rng);
        let far = (Position::new(0, 0), Position::new(3, 3));
        for i in 0..3 {
            let report = session.swap(far.0, far.1).unwrap();
            assert!(!report.valid);
            assert_eq!(report.rejection, Some(SwapRejection::NotAdjacent));
            let expected = if i < 2 { GameStatus::Playing } else { GameStatus::Lost };
            assert_eq!(report.status, expected);
        }
        assert_eq!(session.moves(), 3);
        assert_eq!(session.invalid_moves(), 3);
        assert_eq!(session.score(), 0);
        assert_eq!(session.swap(far.0, far.1), Err(SessionError::NotPlaying));
        assert_eq!(session.moves(), 3);
    }

    #[test]
    fn test_match3_move_limit_loses() {
        let mut rng = SmallRng::seed_from_u64(2);
        let rules = Match3Rules {
            max_moves: 2,
            max_invalid_moves: 100,
            ..Match3Rules::default()
        };
        let mut session = Match3Session::new(small_grid(), rules, &mut rng);
        session.swap(Position::new(0, 0), Position::new(2, 2)).unwrap();
        assert_eq!(session.status(), GameStatus::Playing);
        session.swap(Position::new(0, 0), Position::new(2, 2)).unwrap();
        assert_eq!(session.status(), GameStatus::Lost);
    }

    #[test]
    fn test_match3_valid_swap_scores() {
        // Search the seeded board for a scoring swap and play it.
        let mut rng = SmallRng::seed_from_u64(3);
        let mut session = Match3Session::new(small_grid(), Match3Rules::default(), &mut rng);
        let (a, b) =
            crate::autoplay::find_scoring_swap(&session.state().board, &session.state().bag)
                .expect("seed has a scoring swap");
        let report = session.swap(a, b).unwrap();
        assert!(report.valid);
        assert!(report.cleared >= 3);
        assert_eq!(report.points, report.cleared as u32 * 10);
        assert_eq!(session.score(), report.points);
        assert_eq!(session.cleared_tiles(), report.cleared as u32);
        assert_eq!(session.invalid_moves(), 0);
        assert_eq!(session.moves(), 1);
    }

    #[test]
    fn test_match3_restart_resets_counters() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut session = Match3Session::new(small_grid(), Match3Rules::default(), &mut rng);
        session.swap(Position::new(0, 0), Position::new(3, 3)).unwrap();
        session.restart(&mut rng);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.invalid_moves(), 0);
        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.state().board.occupied_count(), 16);
    }

    #[test]
    fn test_stack_single_kind_wins() {
        let mut session = StackSession::new(single_kind_stack(), StackRules::default(), 8);
        let ids: Vec<TileId> = session.layout().tiles().map(|t| t.id).collect();
        for (i, id) in ids.into_iter().enumerate() {
            let report = session.select(id).unwrap();
            if i < 2 {
                assert_eq!(report.status, GameStatus::Playing);
                assert_eq!(report.cleared_triples, 0);
            } else {
                assert_eq!(report.cleared_triples, 1);
                assert_eq!(report.status, GameStatus::Won);
            }
        }
        assert_eq!(session.moves(), 3);
        assert_eq!(session.cleared_triples(), 1);
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn test_stack_rejected_take_does_not_count() {
        let mut session = StackSession::new(StackConfig::default(), StackRules::default(), 77);
        let covered = session
            .layout()
            .tiles()
            .find(|t| !stack::is_selectable(t, session.layout()))
            .map(|t| t.id)
            .expect("seed has a covered tile");
        assert_eq!(
            session.select(covered),
            Err(SessionError::Take(TakeError::Covered(covered)))
        );
        assert_eq!(session.moves(), 0);
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn test_stack_covered_fixture_is_refused() {
        let config = StackConfig {
            columns: 1,
            min_rows: 1,
            max_rows: 1,
            max_stack_height: 3,
            tile_set: vec!['X'],
        };
        // A single cell: whatever height is drawn gets padded to three layers.
        let mut session = StackSession::new(config, StackRules::default(), 0);
        assert_eq!(session.layout().tile_count(), 3);
        let bottom = session
            .layout()
            .tiles()
            .min_by_key(|t| t.layer)
            .map(|t| t.id)
            .unwrap();
        assert_eq!(
            session.select(bottom),
            Err(SessionError::Take(TakeError::Covered(bottom)))
        );
        let unknown = TileId::new(5, 5, 5, 99);
        assert_eq!(
            session.select(unknown),
            Err(SessionError::Take(TakeError::UnknownTile(unknown)))
        );
        assert_eq!(session.moves(), 0);
    }

    #[test]
    fn test_stack_buffer_full_loses() {
        let config = StackConfig {
            columns: 3,
            min_rows: 3,
            max_rows: 3,
            max_stack_height: 1,
            tile_set: vec!['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I'],
        };
        let rules = StackRules { slot_limit: 3 };
        let mut session = StackSession::new(config, rules, 5);
        // Nine distinct kinds: the first three takes can never clear.
        for _ in 0..3 {
            let id = session.selectable()[0].id;
            session.select(id).unwrap();
        }
        assert_eq!(session.status(), GameStatus::Lost);
        assert_eq!(session.buffer().len(), 3);
    }

    #[test]
    fn test_stack_board_empty_with_leftovers_loses() {
        let config = StackConfig {
            columns: 1,
            min_rows: 3,
            max_rows: 3,
            max_stack_height: 1,
            tile_set: vec!['A', 'B', 'C'],
        };
        let mut session = StackSession::new(config, StackRules::default(), 9);
        for _ in 0..3 {
            let id = session.selectable()[0].id;
            session.select(id).unwrap();
        }
        assert_eq!(session.status(), GameStatus::Lost);
        assert_eq!(session.buffer().len(), 3);
    }

    #[test]
    fn test_stack_restart_same_replays_layout() {
        let mut session = StackSession::new(StackConfig::default(), StackRules::default(), 31);
        let original = session.layout().clone();
        let id = session.selectable()[0].id;
        session.select(id).unwrap();
        session.restart_same();
        assert_eq!(session.layout(), &original);
        assert_eq!(session.moves(), 0);
        session.restart_with(32);
        assert_eq!(session.seed(), 32);
        assert_ne!(session.layout(), &original);
    }
}
