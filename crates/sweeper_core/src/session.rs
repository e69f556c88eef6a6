//! One game session: the board lifecycle and its attached clients.
//!
//! A session starts `Empty`. The first reveal builds a board (retrying for a
//! safe opening), later reveals and flags mutate it until a mine is hit or
//! every safe tile is open, and a reset throws the board away again.
//!
//! Every visible change is broadcast to all attached clients and also returned
//! to the caller, which keeps the state machine testable without a transport.

use crate::{
    board::Board,
    error::GameError,
    tile::TileKind,
    types::{BoardParams, ClientId, Coord, GameEvent, SessionId, TileDelta},
};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info};

/// How many boards the first reveal may generate looking for a zero tile
/// under the cursor before it settles for the last one.
pub const MAX_FIRST_MOVE_ATTEMPTS: usize = 20;

/// Outbound side of a client as seen by a session.
///
/// Implementations must not block: `send` is called while the session mutex
/// is held.
pub trait ClientHandle: Send + Sync {
    /// Identifier unique among live clients
    fn id(&self) -> ClientId;

    /// Whether the underlying transport still accepts messages
    fn is_open(&self) -> bool;

    /// Queues an event for delivery. Failures are the transport's concern.
    fn send(&self, event: &GameEvent);
}

/// Lifecycle of a session's board.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No board yet; the next reveal creates one
    Empty,
    /// A game in progress
    Active(Board),
    /// A finished game, kept so late joiners can see the result
    Ended { board: Board, won: bool },
}

impl SessionState {
    /// The current board, if one exists.
    pub fn board(&self) -> Option<&Board> {
        match self {
            SessionState::Empty => None,
            SessionState::Active(board) | SessionState::Ended { board, .. } => Some(board),
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, SessionState::Ended { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Active(_) => "active",
            SessionState::Ended { won: true, .. } => "won",
            SessionState::Ended { won: false, .. } => "lost",
        }
    }
}

/// A single shared game.
pub struct Session {
    id: SessionId,
    params: BoardParams,
    state: SessionState,
    clients: BTreeMap<ClientId, Arc<dyn ClientHandle>>,
    /// Set while no client is attached
    idle_since: Option<Instant>,
    rng: StdRng,
}

impl Session {
    /// Creates an empty session seeded from OS entropy.
    pub fn new(id: SessionId, params: BoardParams) -> Result<Self, GameError> {
        Self::with_rng(id, params, StdRng::from_entropy())
    }

    /// Creates an empty session that draws boards from `rng`.
    pub fn with_rng(id: SessionId, params: BoardParams, rng: StdRng) -> Result<Self, GameError> {
        params.validate()?;
        Ok(Self {
            id,
            params,
            state: SessionState::Empty,
            clients: BTreeMap::new(),
            idle_since: Some(Instant::now()),
            rng,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn params(&self) -> BoardParams {
        self.params
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the current board exists, i.e. the first reveal has happened
    /// since creation or the last reset.
    pub fn first_move_taken(&self) -> bool {
        !matches!(self.state, SessionState::Empty)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn has_client(&self, client_id: ClientId) -> bool {
        self.clients.contains_key(&client_id)
    }

    pub fn idle_since(&self) -> Option<Instant> {
        self.idle_since
    }

    /// True if no client is attached and none has been for at least `max_idle`.
    pub fn is_idle_for(&self, max_idle: Duration, now: Instant) -> bool {
        self.clients.is_empty()
            && self
                .idle_since
                .is_some_and(|since| now.saturating_duration_since(since) >= max_idle)
    }

    // ========================================================================
    // Client Set
    // ========================================================================

    /// Attaches a client and brings it up to date.
    ///
    /// The client alone receives `Connected`, then the shown tiles of the
    /// current board (if any are shown), then `Lost`/`Won` if the game is over.
    ///
    /// # Returns
    ///
    /// The events sent to the joining client.
    pub fn attach(&mut self, client: Arc<dyn ClientHandle>) -> Vec<GameEvent> {
        let mut events = vec![GameEvent::Connected {
            session_id: self.id,
            params: self.params,
        }];

        if let Some(board) = self.state.board() {
            let shown = board.shown_tiles();
            if !shown.is_empty() {
                events.push(GameEvent::RevealBatch(shown));
            }
        }
        if let SessionState::Ended { won, .. } = self.state {
            events.push(if won { GameEvent::Won } else { GameEvent::Lost });
        }

        for event in &events {
            client.send(event);
        }

        debug!(
            "Client {} attached to session {} ({} clients)",
            client.id(),
            self.id,
            self.clients.len() + 1
        );
        self.clients.insert(client.id(), client);
        self.idle_since = None;
        events
    }

    /// Removes a client. Returns `false` if it was not attached.
    pub fn detach(&mut self, client_id: ClientId) -> bool {
        if self.clients.remove(&client_id).is_none() {
            return false;
        }

        debug!(
            "Client {} detached from session {} ({} clients)",
            client_id,
            self.id,
            self.clients.len()
        );
        if self.clients.is_empty() {
            self.idle_since = Some(Instant::now());
        }
        true
    }

    // ========================================================================
    // Game Commands
    // ========================================================================

    /// Reveals a tile, creating the board first if the session is empty.
    ///
    /// Out-of-bounds targets, flagged targets, already revealed targets and
    /// reveals after the game ended produce no events.
    pub fn reveal(&mut self, coord: Coord) -> Vec<GameEvent> {
        if !self.params.contains(coord) {
            return Vec::new();
        }

        if let SessionState::Empty = self.state {
            match self.generate_opening_board(coord) {
                Ok(board) => self.state = SessionState::Active(board),
                Err(e) => {
                    debug!("Session {} could not build a board: {}", self.id, e);
                    return Vec::new();
                }
            }
        }

        let SessionState::Active(board) = &mut self.state else {
            return Vec::new();
        };
        if board.tile(coord).is_some_and(|tile| tile.is_flagged) {
            return Vec::new();
        }

        let revealed = board.reveal(coord);
        if revealed.is_empty() {
            return Vec::new();
        }

        let outcome = if board.is_ended() {
            Some(false)
        } else if board.is_cleared() {
            Some(true)
        } else {
            None
        };

        let mut events = vec![GameEvent::RevealBatch(revealed)];
        if let Some(won) = outcome {
            self.finish(won);
            events.push(if won { GameEvent::Won } else { GameEvent::Lost });
        }

        self.broadcast(&events);
        events
    }

    /// Places (`unflag == false`) or removes a flag.
    ///
    /// Emits one delta carrying `Flagged` or `Hidden`. Flags on revealed tiles,
    /// redundant flags and flags outside an active game produce no events.
    pub fn flag(&mut self, coord: Coord, unflag: bool) -> Vec<GameEvent> {
        let SessionState::Active(board) = &mut self.state else {
            return Vec::new();
        };
        let Some(tile) = board.tile(coord).copied() else {
            return Vec::new();
        };
        if tile.is_revealed {
            return Vec::new();
        }

        let changed = if unflag { board.unflag(coord) } else { board.flag(coord) };
        if !changed {
            return Vec::new();
        }

        let kind = if unflag { TileKind::Hidden } else { TileKind::Flagged };
        let won = board.is_cleared();

        let mut events = vec![GameEvent::RevealBatch(vec![TileDelta::new(coord, kind)])];
        if won {
            self.finish(true);
            events.push(GameEvent::Won);
        }

        self.broadcast(&events);
        events
    }

    /// Discards the board. Dimensions are kept and every client is told.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        debug!("Session {} reset from {} state", self.id, self.state.name());
        self.state = SessionState::Empty;

        let events = vec![GameEvent::Reset];
        self.broadcast(&events);
        events
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Builds boards until the tile under `coord` is a zero, giving up after
    /// `MAX_FIRST_MOVE_ATTEMPTS` and keeping the last one.
    fn generate_opening_board(&mut self, coord: Coord) -> Result<Board, GameError> {
        let mut board = Board::generate(self.params, &mut self.rng)?;
        let mut attempts = 1;

        while attempts < MAX_FIRST_MOVE_ATTEMPTS
            && board.tile(coord).map(|tile| tile.kind()) != Some(TileKind::Count(0))
        {
            board = Board::generate(self.params, &mut self.rng)?;
            attempts += 1;
        }

        debug!(
            "Session {} generated opening board in {} attempt(s)",
            self.id, attempts
        );
        Ok(board)
    }

    fn finish(&mut self, won: bool) {
        self.state = match std::mem::replace(&mut self.state, SessionState::Empty) {
            SessionState::Active(mut board) => {
                board.end(won);
                SessionState::Ended { board, won }
            }
            other => other,
        };
        info!(
            "🏁 Session {} {} ({} clients watching)",
            self.id,
            if won { "won" } else { "lost" },
            self.clients.len()
        );
    }

    fn broadcast(&self, events: &[GameEvent]) {
        for client in self.clients.values().filter(|client| client.is_open()) {
            for event in events {
                client.send(event);
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("params", &self.params)
            .field("state", &self.state.name())
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}
