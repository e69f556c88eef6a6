//! # Core Type Definitions
//!
//! Identifiers, coordinates and the events a session emits. These types are
//! shared by the engine, the wire codec and the server.

use crate::{error::GameError, tile::TileKind};

/// Identifier of a game session. Valid ids are `0..=MAX_SESSION_ID`.
pub type SessionId = u8;

/// Highest id the registry hands out. `0xFF` is reserved on the wire for
/// "create a new session".
pub const MAX_SESSION_ID: SessionId = 254;

/// Opaque identifier of an attached client, unique for the process lifetime.
pub type ClientId = usize;

/// A board cell address. `row` is the wire `y`, `col` the wire `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: u16,
    pub col: u16,
}

impl Coord {
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Dimensions and mine count of a board, fixed for a session's lifetime.
///
/// Fields are public so decoders can carry unchecked values around; use
/// [`BoardParams::new`] or [`BoardParams::validate`] before building a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardParams {
    pub rows: u8,
    pub cols: u8,
    pub mine_count: u8,
}

impl BoardParams {
    /// Creates validated board parameters.
    ///
    /// # Returns
    ///
    /// `Err(GameError::InvalidDimensions)` if either dimension is zero or the
    /// mines would fill the whole board.
    pub fn new(rows: u8, cols: u8, mine_count: u8) -> Result<Self, GameError> {
        let params = Self {
            rows,
            cols,
            mine_count,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks `rows > 0`, `cols > 0` and `mine_count < rows * cols`.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.rows == 0 || self.cols == 0 || usize::from(self.mine_count) >= self.tile_count() {
            return Err(GameError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
                mine_count: self.mine_count,
            });
        }
        Ok(())
    }

    pub fn tile_count(&self) -> usize {
        usize::from(self.rows) * usize::from(self.cols)
    }

    /// Whether `coord` lies inside a board of these dimensions.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < u16::from(self.rows) && coord.col < u16::from(self.cols)
    }
}

/// The visible state of one tile as sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileDelta {
    pub coord: Coord,
    pub kind: TileKind,
}

impl TileDelta {
    pub const fn new(coord: Coord, kind: TileKind) -> Self {
        Self { coord, kind }
    }
}

/// Everything a session can tell its clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Sent once to a client when it attaches to a session
    Connected {
        session_id: SessionId,
        params: BoardParams,
    },
    /// Tiles whose visible state changed, or a resync snapshot
    RevealBatch(Vec<TileDelta>),
    /// A mine was revealed
    Lost,
    /// Every safe tile is revealed
    Won,
    /// The board was discarded; a fresh one is generated on the next reveal
    Reset,
}
