//! Process-wide table of live sessions.

use crate::{
    error::GameError,
    session::{ClientHandle, Session},
    types::{BoardParams, GameEvent, SessionId, MAX_SESSION_ID},
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Shared handle to one session. Commands for a session are serialized by
/// this mutex; different sessions never contend.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Allocates session ids and maps them to sessions.
///
/// Ids come from `0..=MAX_SESSION_ID`, lowest free id first. Lookups never
/// create sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new empty session.
    ///
    /// # Arguments
    ///
    /// * `rows` - Board height
    /// * `cols` - Board width
    /// * `mine_count` - Mines to place on the first reveal
    ///
    /// # Returns
    ///
    /// The new id and handle, `GameError::InvalidDimensions` for an unplayable
    /// board, or `GameError::SessionsExhausted` when every id is taken.
    pub async fn create_session(
        &self,
        rows: u8,
        cols: u8,
        mine_count: u8,
    ) -> Result<(SessionId, SessionHandle), GameError> {
        let params = BoardParams::new(rows, cols, mine_count)?;

        let mut sessions = self.sessions.write().await;
        let id = (0..=MAX_SESSION_ID)
            .find(|id| !sessions.contains_key(id))
            .ok_or(GameError::SessionsExhausted)?;

        let handle = Arc::new(Mutex::new(Session::new(id, params)?));
        sessions.insert(id, handle.clone());

        info!(
            "🎮 Session {} created: {}x{} with {} mines ({} live)",
            id,
            rows,
            cols,
            mine_count,
            sessions.len()
        );
        Ok((id, handle))
    }

    /// Looks up an existing session.
    pub async fn get_session(&self, id: SessionId) -> Result<SessionHandle, GameError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(GameError::SessionNotFound(id))
    }

    /// Looks up a session and attaches `client` to it.
    ///
    /// The attach happens while the registry is read-locked, so the idle reaper
    /// cannot remove the session between lookup and attach.
    ///
    /// # Returns
    ///
    /// The session handle and the events sent to the client on attach.
    pub async fn join_session(
        &self,
        id: SessionId,
        client: Arc<dyn ClientHandle>,
    ) -> Result<(SessionHandle, Vec<GameEvent>), GameError> {
        let sessions = self.sessions.read().await;
        let handle = sessions.get(&id).cloned().ok_or(GameError::SessionNotFound(id))?;
        let events = handle.lock().await.attach(client);
        Ok((handle, events))
    }

    pub async fn remove_session(&self, id: SessionId) -> Option<SessionHandle> {
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_some() {
            debug!("Session {} removed", id);
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Ids of all live sessions in ascending order.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Removes every session that has had no clients for at least `max_idle`.
    ///
    /// Sessions whose mutex is currently held are busy by definition and are
    /// skipped until the next pass.
    ///
    /// # Returns
    ///
    /// The removed ids in ascending order.
    pub async fn reap_idle(&self, max_idle: Duration) -> Vec<SessionId> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let mut expired: Vec<SessionId> = sessions
            .iter()
            .filter_map(|(id, handle)| {
                let session = handle.try_lock().ok()?;
                session.is_idle_for(max_idle, now).then_some(*id)
            })
            .collect();
        expired.sort_unstable();

        for id in &expired {
            sessions.remove(id);
        }

        if !expired.is_empty() {
            info!(
                "🧹 Reaped {} idle session(s) {:?} ({} live)",
                expired.len(),
                expired,
                sessions.len()
            );
        }
        expired
    }
}
