//! Game persistence.
//!
//! A store holds one snapshot per game and serializes all mutation through
//! a per-game lock: operations are single-writer and all-or-nothing. An
//! operation that returns an error leaves the stored snapshot untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::core::error::{EngineError, EngineResult};
use crate::core::GameId;
use crate::engine::GameEngine;

/// Storage backend for game instances.
pub trait GameStore {
    /// Persist a new game and assign it an id.
    fn create(&self, engine: &GameEngine) -> EngineResult<GameId>;

    /// Load a read-only copy of a game.
    fn load(&self, id: GameId) -> EngineResult<GameEngine>;

    /// Run one operation against a game under its lock. The mutated engine
    /// is persisted only when the closure succeeds.
    fn with_game<T>(
        &self,
        id: GameId,
        op: impl FnOnce(&mut GameEngine) -> EngineResult<T>,
    ) -> EngineResult<T>;

    /// Drop a finished game.
    fn remove(&self, id: GameId) -> EngineResult<()>;
}

type Snapshot = Arc<Mutex<Vec<u8>>>;

/// In-memory store keeping bincode snapshots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: Mutex<FxHashMap<GameId, Snapshot>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, id: GameId) -> EngineResult<Snapshot> {
        let games = self
            .games
            .lock()
            .map_err(|_| EngineError::internal("store mutex poisoned"))?;
        games
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("game", id))
    }
}

fn encode(engine: &GameEngine) -> EngineResult<Vec<u8>> {
    bincode::serialize(engine)
        .map_err(|e| EngineError::internal(format!("snapshot encode failed: {e}")))
}

fn decode(bytes: &[u8]) -> EngineResult<GameEngine> {
    bincode::deserialize(bytes)
        .map_err(|e| EngineError::internal(format!("snapshot decode failed: {e}")))
}

impl GameStore for MemoryStore {
    fn create(&self, engine: &GameEngine) -> EngineResult<GameId> {
        let bytes = encode(engine)?;
        let id = GameId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let mut games = self
            .games
            .lock()
            .map_err(|_| EngineError::internal("store mutex poisoned"))?;
        games.insert(id, Arc::new(Mutex::new(bytes)));
        Ok(id)
    }

    fn load(&self, id: GameId) -> EngineResult<GameEngine> {
        let snapshot = self.snapshot(id)?;
        let bytes = snapshot
            .lock()
            .map_err(|_| EngineError::internal("game mutex poisoned"))?;
        decode(&bytes)
    }

    fn with_game<T>(
        &self,
        id: GameId,
        op: impl FnOnce(&mut GameEngine) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let snapshot = self.snapshot(id)?;
        let mut bytes = snapshot
            .lock()
            .map_err(|_| EngineError::internal("game mutex poisoned"))?;

        let mut engine = decode(&bytes)?;
        let result = op(&mut engine)?;
        *bytes = encode(&engine)?;
        Ok(result)
    }

    fn remove(&self, id: GameId) -> EngineResult<()> {
        let mut games = self
            .games
            .lock()
            .map_err(|_| EngineError::internal("store mutex poisoned"))?;
        games
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EngineError::not_found("game", id))
    }
}
