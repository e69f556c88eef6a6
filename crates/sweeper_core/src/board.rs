//! The minefield: mine placement, adjacency counts, flood fill reveal and
//! flag bookkeeping.
//!
//! A [`Board`] enforces only the rules that keep its counters consistent.
//! Policy about *who* may do *what* (no flagging revealed tiles, no revealing
//! flagged tiles, ...) belongs to [`crate::Session`].

use crate::{
    error::GameError,
    tile::Tile,
    types::{BoardParams, Coord, TileDelta},
};
use rand::Rng;
use std::collections::{BTreeSet, VecDeque};

/// Row/column offsets of the 8-connected neighbourhood.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A `rows x cols` grid of tiles with a fixed mine layout.
///
/// # Invariants
///
/// * exactly `mine_count` tiles are mines and `mines` lists exactly those
/// * `unrevealed_count` only ever decreases, by the number of tiles each
///   reveal newly uncovers
/// * `flagged_count` equals the number of flagged tiles
/// * once `ended` is set no reveal or flag mutates the board
#[derive(Debug, Clone)]
pub struct Board {
    params: BoardParams,
    /// Row-major tile storage
    tiles: Vec<Tile>,
    mines: BTreeSet<Coord>,
    unrevealed_count: usize,
    flagged_count: usize,
    ended: bool,
    won: bool,
}

impl Board {
    /// Generates a board with uniformly random mine placement.
    ///
    /// Mines are placed by rejection sampling: a random cell is drawn and
    /// accepted only if it is not already a mine, until `mine_count` mines
    /// exist. Adjacency counts are then computed over the final layout.
    ///
    /// # Arguments
    ///
    /// * `params` - Board dimensions and mine count
    /// * `rng` - Random source; seed it for reproducible boards
    ///
    /// # Returns
    ///
    /// The new board, or `GameError::InvalidDimensions` if `params` cannot
    /// form a playable board.
    pub fn generate<R: Rng + ?Sized>(params: BoardParams, rng: &mut R) -> Result<Self, GameError> {
        params.validate()?;

        let mut mines = BTreeSet::new();
        while mines.len() < usize::from(params.mine_count) {
            let coord = Coord::new(
                rng.gen_range(0..u16::from(params.rows)),
                rng.gen_range(0..u16::from(params.cols)),
            );
            // Duplicate draws are rejected by the set
            mines.insert(coord);
        }

        Ok(Self::with_layout(params, mines))
    }

    /// Builds a board from an explicit mine layout.
    ///
    /// The layout must contain exactly `params.mine_count` distinct in-bounds
    /// coordinates.
    pub fn from_mines<I>(params: BoardParams, mines: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = Coord>,
    {
        params.validate()?;

        let mut layout = BTreeSet::new();
        for coord in mines {
            if !params.contains(coord) {
                return Err(GameError::InvalidLayout(format!(
                    "mine {coord} is outside a {}x{} board",
                    params.rows, params.cols
                )));
            }
            if !layout.insert(coord) {
                return Err(GameError::InvalidLayout(format!("mine {coord} listed twice")));
            }
        }

        if layout.len() != usize::from(params.mine_count) {
            return Err(GameError::InvalidLayout(format!(
                "expected {} mines, got {}",
                params.mine_count,
                layout.len()
            )));
        }

        Ok(Self::with_layout(params, layout))
    }

    fn with_layout(params: BoardParams, mines: BTreeSet<Coord>) -> Self {
        let tile_count = params.tile_count();
        let mut board = Self {
            params,
            tiles: vec![Tile::default(); tile_count],
            mines,
            unrevealed_count: tile_count,
            flagged_count: 0,
            ended: false,
            won: false,
        };

        for index in board.mines.iter().map(|&coord| board.index(coord)).collect::<Vec<_>>() {
            board.tiles[index].is_mine = true;
        }

        for row in 0..u16::from(params.rows) {
            for col in 0..u16::from(params.cols) {
                let coord = Coord::new(row, col);
                let index = board.index(coord);
                if board.tiles[index].is_mine {
                    continue;
                }
                let count = board
                    .neighbors(coord)
                    .filter(|&neighbor| board.tiles[board.index(neighbor)].is_mine)
                    .count();
                board.tiles[index].adjacent_mines = count as u8;
            }
        }

        board
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn params(&self) -> BoardParams {
        self.params
    }

    pub fn rows(&self) -> u8 {
        self.params.rows
    }

    pub fn cols(&self) -> u8 {
        self.params.cols
    }

    pub fn mine_count(&self) -> usize {
        usize::from(self.params.mine_count)
    }

    pub fn unrevealed_count(&self) -> usize {
        self.unrevealed_count
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged_count
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn mine_coordinates(&self) -> &BTreeSet<Coord> {
        &self.mines
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.params.contains(coord)
    }

    pub fn tile(&self, coord: Coord) -> Option<&Tile> {
        self.contains(coord).then(|| &self.tiles[self.index(coord)])
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Reveals a tile, flood filling through zero tiles.
    ///
    /// Returns nothing if the board has ended, the target is out of bounds or
    /// already revealed. A mine reveals only itself and ends the game as
    /// lost. Otherwise a breadth-first fill from the target reveals every
    /// reachable tile; only zero tiles enqueue their 8 neighbours, so the fill
    /// stops at the numbered border of the zero region. Bounds and "already
    /// revealed" are checked when a cell is dequeued.
    ///
    /// A flagged tile reached by the fill is revealed and loses its flag.
    ///
    /// # Returns
    ///
    /// The newly revealed tiles in reveal order.
    pub fn reveal(&mut self, coord: Coord) -> Vec<TileDelta> {
        if self.ended || !self.contains(coord) {
            return Vec::new();
        }

        let index = self.index(coord);
        if self.tiles[index].is_revealed {
            return Vec::new();
        }

        if self.tiles[index].is_mine {
            let tile = &mut self.tiles[index];
            tile.is_revealed = true;
            if tile.is_flagged {
                tile.is_flagged = false;
                self.flagged_count -= 1;
            }
            let delta = TileDelta::new(coord, tile.kind());
            self.unrevealed_count -= 1;
            self.ended = true;
            self.won = false;
            return vec![delta];
        }

        let mut revealed = Vec::new();
        let mut queue = VecDeque::from([(i32::from(coord.row), i32::from(coord.col))]);

        while let Some((row, col)) = queue.pop_front() {
            let Some(cell) = self.checked_coord(row, col) else {
                continue;
            };
            let index = self.index(cell);
            let tile = &mut self.tiles[index];
            if tile.is_revealed {
                continue;
            }

            tile.is_revealed = true;
            if tile.is_flagged {
                tile.is_flagged = false;
                self.flagged_count -= 1;
            }
            revealed.push(TileDelta::new(cell, tile.kind()));

            if tile.adjacent_mines == 0 {
                for (d_row, d_col) in NEIGHBOR_OFFSETS {
                    queue.push_back((row + d_row, col + d_col));
                }
            }
        }

        self.unrevealed_count -= revealed.len();
        revealed
    }

    /// Flags a tile. Returns `false` if nothing changed.
    pub fn flag(&mut self, coord: Coord) -> bool {
        self.set_flag(coord, true)
    }

    /// Removes a flag. Returns `false` if nothing changed.
    pub fn unflag(&mut self, coord: Coord) -> bool {
        self.set_flag(coord, false)
    }

    fn set_flag(&mut self, coord: Coord, flagged: bool) -> bool {
        if self.ended || !self.contains(coord) {
            return false;
        }

        let index = self.index(coord);
        let tile = &mut self.tiles[index];
        if tile.is_flagged == flagged {
            return false;
        }

        tile.is_flagged = flagged;
        if flagged {
            self.flagged_count += 1;
        } else {
            self.flagged_count -= 1;
        }
        true
    }

    /// Marks the board as finished.
    pub fn end(&mut self, won: bool) {
        self.ended = true;
        self.won = won;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of mines that currently carry a flag.
    pub fn flagged_mine_count(&self) -> usize {
        self.mines
            .iter()
            .filter(|&&coord| self.tiles[self.index(coord)].is_flagged)
            .count()
    }

    /// Win predicate: `(mines - flagged mines) == (unrevealed - flagged)`.
    ///
    /// Holds exactly when every tile that is neither revealed nor flagged is an
    /// unflagged mine.
    pub fn is_cleared(&self) -> bool {
        // Rearranged to avoid unsigned subtraction
        self.mine_count() + self.flagged_count == self.unrevealed_count + self.flagged_mine_count()
    }

    /// Every revealed or flagged tile with its type, in row-major order.
    ///
    /// Used to resynchronize a joining client without leaking hidden mines.
    pub fn shown_tiles(&self) -> Vec<TileDelta> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_revealed || tile.is_flagged)
            .map(|(index, tile)| TileDelta::new(self.coord_of(index), tile.kind()))
            .collect()
    }

    // ========================================================================
    // Indexing helpers
    // ========================================================================

    fn index(&self, coord: Coord) -> usize {
        usize::from(coord.row) * usize::from(self.params.cols) + usize::from(coord.col)
    }

    fn coord_of(&self, index: usize) -> Coord {
        let cols = usize::from(self.params.cols);
        Coord::new((index / cols) as u16, (index % cols) as u16)
    }

    fn checked_coord(&self, row: i32, col: i32) -> Option<Coord> {
        if row < 0
            || col < 0
            || row >= i32::from(self.params.rows)
            || col >= i32::from(self.params.cols)
        {
            return None;
        }
        Some(Coord::new(row as u16, col as u16))
    }

    fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        let (row, col) = (i32::from(coord.row), i32::from(coord.col));
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(d_row, d_col)| self.checked_coord(row + d_row, col + d_col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileKind;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn params(rows: u8, cols: u8, mines: u8) -> BoardParams {
        BoardParams::new(rows, cols, mines).unwrap()
    }

    /// 5x5 board with a full wall of mines in column 2.
    fn wall_board() -> Board {
        Board::from_mines(params(5, 5, 5), (0..5).map(|row| Coord::new(row, 2))).unwrap()
    }

    fn true_neighbor_mines(board: &Board, coord: Coord) -> u8 {
        let mut count = 0;
        for d_row in -1i32..=1 {
            for d_col in -1i32..=1 {
                if d_row == 0 && d_col == 0 {
                    continue;
                }
                let (row, col) = (i32::from(coord.row) + d_row, i32::from(coord.col) + d_col);
                if row < 0 || col < 0 {
                    continue;
                }
                if let Some(tile) = board.tile(Coord::new(row as u16, col as u16)) {
                    if tile.is_mine {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    #[test]
    fn test_generated_boards_have_exact_mines_and_counts() {
        let mut rng = StdRng::seed_from_u64(7);
        let shapes = [(10, 10, 5), (8, 30, 99), (1, 2, 1), (3, 3, 8), (16, 16, 40), (4, 4, 0)];
        for (rows, cols, mines) in shapes {
            let board = Board::generate(params(rows, cols, mines), &mut rng).unwrap();

            let mut mine_tiles = 0;
            for row in 0..u16::from(rows) {
                for col in 0..u16::from(cols) {
                    let coord = Coord::new(row, col);
                    let tile = board.tile(coord).unwrap();
                    if tile.is_mine {
                        mine_tiles += 1;
                        assert!(board.mine_coordinates().contains(&coord));
                    } else {
                        assert_eq!(tile.adjacent_mines, true_neighbor_mines(&board, coord));
                    }
                }
            }

            assert_eq!(mine_tiles, usize::from(mines));
            assert_eq!(board.mine_coordinates().len(), usize::from(mines));
            assert_eq!(board.unrevealed_count(), usize::from(rows) * usize::from(cols));
            assert_eq!(board.flagged_count(), 0);
        }
    }

    #[test]
    fn test_generate_rejects_invalid_params() {
        let mut rng = StdRng::seed_from_u64(1);
        let bad = BoardParams {
            rows: 2,
            cols: 2,
            mine_count: 4,
        };
        assert!(matches!(
            Board::generate(bad, &mut rng),
            Err(GameError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_from_mines_validates_layout() {
        assert!(Board::from_mines(params(3, 3, 1), [Coord::new(3, 0)]).is_err());
        assert!(Board::from_mines(params(3, 3, 2), [Coord::new(0, 0), Coord::new(0, 0)]).is_err());
        assert!(Board::from_mines(params(3, 3, 2), [Coord::new(0, 0)]).is_err());
        assert!(Board::from_mines(params(3, 3, 1), [Coord::new(1, 1)]).is_ok());
    }

    #[test]
    fn test_flood_fill_stops_at_numbered_border() {
        let mut board = wall_board();

        let revealed = board.reveal(Coord::new(2, 0));

        // Column 0 is all zeros, column 1 is the numbered border
        assert_eq!(revealed.len(), 10);
        assert!(revealed.iter().all(|delta| delta.coord.col <= 1));
        assert_eq!(revealed[0], TileDelta::new(Coord::new(2, 0), TileKind::Count(0)));
        assert!(revealed.contains(&TileDelta::new(Coord::new(0, 1), TileKind::Count(2))));
        assert!(revealed.contains(&TileDelta::new(Coord::new(2, 1), TileKind::Count(3))));
        assert_eq!(board.unrevealed_count(), 15);
        assert!(!board.is_ended());
    }

    #[test]
    fn test_reveal_numbered_tile_reveals_only_itself() {
        let mut board = wall_board();

        let revealed = board.reveal(Coord::new(0, 3));
        assert_eq!(revealed, vec![TileDelta::new(Coord::new(0, 3), TileKind::Count(2))]);
        assert_eq!(board.unrevealed_count(), 24);
    }

    #[test]
    fn test_reveal_twice_is_idempotent() {
        let mut board = wall_board();

        assert!(!board.reveal(Coord::new(2, 4)).is_empty());
        let unrevealed = board.unrevealed_count();
        assert!(board.reveal(Coord::new(2, 4)).is_empty());
        assert!(board.reveal(Coord::new(0, 3)).is_empty());
        assert_eq!(board.unrevealed_count(), unrevealed);
    }

    #[test]
    fn test_reveal_out_of_bounds_is_noop() {
        let mut board = wall_board();
        assert!(board.reveal(Coord::new(5, 0)).is_empty());
        assert!(board.reveal(Coord::new(0, 500)).is_empty());
        assert_eq!(board.unrevealed_count(), 25);
    }

    #[test]
    fn test_reveal_mine_reveals_only_that_tile_and_loses() {
        let mut board = wall_board();

        let revealed = board.reveal(Coord::new(1, 2));
        assert_eq!(revealed, vec![TileDelta::new(Coord::new(1, 2), TileKind::Mine)]);
        assert!(board.is_ended());
        assert!(!board.is_won());

        // Other mines stay hidden
        assert!(!board.tile(Coord::new(0, 2)).unwrap().is_revealed);

        // Ended boards accept nothing
        assert!(board.reveal(Coord::new(2, 0)).is_empty());
        assert!(!board.flag(Coord::new(0, 0)));
    }

    #[test]
    fn test_single_mine_corner_board_clears_in_one_reveal() {
        let mut board = Board::from_mines(params(5, 5, 1), [Coord::new(0, 0)]).unwrap();

        let revealed = board.reveal(Coord::new(4, 4));
        assert_eq!(revealed.len(), 24);
        assert_eq!(board.unrevealed_count(), 1);
        assert!(board.is_cleared());
    }

    #[test]
    fn test_flag_counters() {
        let mut board = wall_board();

        assert!(board.flag(Coord::new(0, 2)));
        assert!(!board.flag(Coord::new(0, 2)));
        assert!(board.flag(Coord::new(0, 0)));
        assert_eq!(board.flagged_count(), 2);
        assert_eq!(board.flagged_mine_count(), 1);

        assert!(board.unflag(Coord::new(0, 0)));
        assert!(!board.unflag(Coord::new(0, 0)));
        assert_eq!(board.flagged_count(), 1);
        assert_eq!(board.flagged_mine_count(), 1);

        assert!(!board.flag(Coord::new(9, 9)));
    }

    #[test]
    fn test_flood_fill_clears_flags_it_reveals() {
        let mut board = wall_board();
        assert!(board.flag(Coord::new(4, 0)));

        let revealed = board.reveal(Coord::new(0, 0));
        assert!(revealed.contains(&TileDelta::new(Coord::new(4, 0), TileKind::Count(0))));
        assert_eq!(board.flagged_count(), 0);
        assert!(!board.tile(Coord::new(4, 0)).unwrap().is_flagged);
    }

    #[test]
    fn test_win_predicate() {
        let mut board = wall_board();
        assert!(!board.is_cleared());

        board.reveal(Coord::new(0, 0));
        assert!(!board.is_cleared());
        board.reveal(Coord::new(0, 4));
        assert!(board.is_cleared());

        // Flags on mines keep the predicate true, a flag on nothing else can exist
        board.flag(Coord::new(0, 2));
        assert!(board.is_cleared());
    }

    #[test]
    fn test_hidden_safe_tile_blocks_win() {
        let mut board = Board::from_mines(params(1, 3, 1), [Coord::new(0, 0)]).unwrap();
        board.reveal(Coord::new(0, 1));
        assert!(!board.is_cleared());

        // Flagging the mine is not enough while a safe tile is hidden
        board.flag(Coord::new(0, 0));
        assert!(!board.is_cleared());

        board.reveal(Coord::new(0, 2));
        assert!(board.is_cleared());
    }

    #[test]
    fn test_shown_tiles_matches_revealed_and_flagged() {
        let mut board = wall_board();
        let mut expected: HashSet<TileDelta> = HashSet::new();

        expected.extend(board.reveal(Coord::new(0, 0)));
        board.flag(Coord::new(3, 2));
        expected.insert(TileDelta::new(Coord::new(3, 2), TileKind::Flagged));
        expected.extend(board.reveal(Coord::new(4, 3)));

        let shown: HashSet<TileDelta> = board.shown_tiles().into_iter().collect();
        assert_eq!(shown, expected);
        assert_eq!(board.shown_tiles().len(), expected.len());
    }

    #[test]
    fn test_flood_fill_region_shape_on_random_boards() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut board = Board::generate(params(12, 12, 15), &mut rng).unwrap();
            let Some(start) = (0..144u16)
                .map(|i| Coord::new(i / 12, i % 12))
                .find(|&c| board.tile(c).unwrap().kind() == TileKind::Count(0))
            else {
                continue;
            };

            let revealed = board.reveal(start);
            let set: HashSet<Coord> = revealed.iter().map(|d| d.coord).collect();
            assert_eq!(set.len(), revealed.len(), "no tile is revealed twice");
            assert_eq!(board.unrevealed_count(), 144 - revealed.len());

            for delta in &revealed {
                let tile = board.tile(delta.coord).unwrap();
                assert!(!tile.is_mine);
                let neighbors: Vec<Coord> = board.neighbors(delta.coord).collect();
                if tile.adjacent_mines == 0 {
                    // Every neighbour of a revealed zero is revealed
                    assert!(neighbors.iter().all(|n| set.contains(n)));
                } else {
                    // Every numbered tile borders a revealed zero
                    assert!(neighbors
                        .iter()
                        .any(|n| set.contains(n) && board.tile(*n).unwrap().adjacent_mines == 0));
                }
            }
        }
    }
}
