//! A player's local picture of the board, rebuilt from server events.

use rand::seq::SliceRandom;
use rand::Rng;
use sweeper_core::{BoardParams, Coord, GameEvent, SessionId, TileKind};
use sweeper_protocol::ClientCommand;

/// Probability that a move is a flag toggle rather than a reveal.
const FLAG_PROBABILITY: f64 = 0.15;

/// Outcome of the last game seen on this board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    Playing,
    Lost,
    Won,
}

#[derive(Debug, Default)]
pub struct BoardView {
    pub session_id: Option<SessionId>,
    params: Option<BoardParams>,
    tiles: Vec<TileKind>,
    pub outcome: Outcome,
}

impl BoardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.params.is_some()
    }

    /// Folds one server event into the view.
    pub fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Connected { session_id, params } => {
                self.session_id = Some(*session_id);
                self.params = Some(*params);
                self.tiles = vec![TileKind::Hidden; params.tile_count()];
                self.outcome = Outcome::Playing;
            }
            GameEvent::RevealBatch(deltas) => {
                for delta in deltas {
                    if let Some(index) = self.index(delta.coord) {
                        self.tiles[index] = delta.kind;
                    }
                }
            }
            GameEvent::Lost => self.outcome = Outcome::Lost,
            GameEvent::Won => self.outcome = Outcome::Won,
            GameEvent::Reset => {
                self.tiles.iter_mut().for_each(|tile| *tile = TileKind::Hidden);
                self.outcome = Outcome::Playing;
            }
        }
    }

    pub fn kind_at(&self, coord: Coord) -> Option<TileKind> {
        self.index(coord).map(|index| self.tiles[index])
    }

    /// Picks a random move among tiles that are still hidden or flagged.
    ///
    /// Flagged tiles are only ever unflagged, since revealing them is a
    /// no-op. Returns `None` when the view is not connected, the game is
    /// over, or nothing is left to play.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ClientCommand> {
        let params = self.params?;
        if self.outcome != Outcome::Playing {
            return None;
        }

        let candidates: Vec<usize> = self
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, kind)| matches!(kind, TileKind::Hidden | TileKind::Flagged))
            .map(|(index, _)| index)
            .collect();
        let index = *candidates.choose(rng)?;
        let coord = Coord::new(
            (index / params.cols as usize) as u16,
            (index % params.cols as usize) as u16,
        );

        Some(match self.tiles[index] {
            TileKind::Flagged => ClientCommand::Flag { coord, unflag: true },
            _ if rng.gen_bool(FLAG_PROBABILITY) => ClientCommand::Flag { coord, unflag: false },
            _ => ClientCommand::Reveal { coord },
        })
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        let params = self.params?;
        params
            .contains(coord)
            .then(|| coord.row as usize * params.cols as usize + coord.col as usize)
    }
}
