//! Single cell state and its client-visible projection.


/// One cell of the board.
///
/// `adjacent_mines` is only meaningful while `is_mine` is false. It is filled
/// in once, when the board is built, over the final mine layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub adjacent_mines: u8,
}

impl Tile {
    /// The tile's type regardless of whether it has been revealed:
    /// flagged first, then mine, then the adjacency count.
    pub fn kind(&self) -> TileKind {
        if self.is_flagged {
            TileKind::Flagged
        } else if self.is_mine {
            TileKind::Mine
        } else {
            TileKind::Count(self.adjacent_mines)
        }
    }

    /// What a client is allowed to see of this tile.
    pub fn visible_kind(&self) -> TileKind {
        if self.is_revealed || self.is_flagged {
            self.kind()
        } else {
            TileKind::Hidden
        }
    }
}

/// Visible type of a tile.
///
/// Wire projection: `Hidden` = -1, `Count(n)` = n, `Flagged` = 9, `Mine` = 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Hidden,
    Count(u8),
    Flagged,
    Mine,
}

impl TileKind {
    pub const HIDDEN_WIRE: i8 = -1;
    pub const FLAGGED_WIRE: i8 = 9;
    pub const MINE_WIRE: i8 = 10;

    pub fn to_wire(self) -> i8 {
        match self {
            TileKind::Hidden => Self::HIDDEN_WIRE,
            // Counts never exceed 8
            TileKind::Count(n) => n.min(8) as i8,
            TileKind::Flagged => Self::FLAGGED_WIRE,
            TileKind::Mine => Self::MINE_WIRE,
        }
    }

    /// Inverse of [`TileKind::to_wire`]. `None` for values outside -1..=10.
    pub fn from_wire(value: i8) -> Option<Self> {
        match value {
            Self::HIDDEN_WIRE => Some(TileKind::Hidden),
            0..=8 => Some(TileKind::Count(value as u8)),
            Self::FLAGGED_WIRE => Some(TileKind::Flagged),
            Self::MINE_WIRE => Some(TileKind::Mine),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_priority() {
        let mut tile = Tile {
            is_mine: true,
            adjacent_mines: 3,
            ..Default::default()
        };
        assert_eq!(tile.kind(), TileKind::Mine);

        tile.is_flagged = true;
        assert_eq!(tile.kind(), TileKind::Flagged);

        let plain = Tile {
            adjacent_mines: 4,
            ..Default::default()
        };
        assert_eq!(plain.kind(), TileKind::Count(4));
    }

    #[test]
    fn test_visible_kind_hides_unrevealed() {
        let mut tile = Tile {
            is_mine: true,
            ..Default::default()
        };
        assert_eq!(tile.visible_kind(), TileKind::Hidden);

        tile.is_flagged = true;
        assert_eq!(tile.visible_kind(), TileKind::Flagged);

        tile.is_flagged = false;
        tile.is_revealed = true;
        assert_eq!(tile.visible_kind(), TileKind::Mine);
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(TileKind::Hidden.to_wire(), -1);
        assert_eq!(TileKind::Count(0).to_wire(), 0);
        assert_eq!(TileKind::Count(8).to_wire(), 8);
        assert_eq!(TileKind::Flagged.to_wire(), 9);
        assert_eq!(TileKind::Mine.to_wire(), 10);

        assert_eq!(TileKind::from_wire(-1), Some(TileKind::Hidden));
        assert_eq!(TileKind::from_wire(5), Some(TileKind::Count(5)));
        assert_eq!(TileKind::from_wire(10), Some(TileKind::Mine));
        assert_eq!(TileKind::from_wire(11), None);
        assert_eq!(TileKind::from_wire(-2), None);
    }
}
