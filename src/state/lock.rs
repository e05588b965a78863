//! GameLock - shared read/write access to the state graph
//!
//! The graph is shared with subsystems that only read (rendering,
//! network sync). Battle resolution holds the write guard for the whole
//! of a fight; clone and translate callers hold at least the read guard
//! for the whole traversal. Guards release on every exit path,
//! including unwinding out of a fatal invariant violation.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::state::game::GameState;

/// Cloneable handle to a lock-guarded game state
#[derive(Clone)]
pub struct GameLock {
    inner: Arc<RwLock<GameState>>,
}

impl GameLock {
    pub fn new(game: GameState) -> Self {
        Self { inner: Arc::new(RwLock::new(game)) }
    }

    /// Acquire shared read access
    ///
    /// Panics when the lock is poisoned: a writer panicked mid-mutation
    /// and the graph can no longer be trusted.
    pub fn read(&self) -> RwLockReadGuard<'_, GameState> {
        self.inner.read().expect("game state lock poisoned")
    }

    /// Acquire exclusive write access
    ///
    /// Panics when the lock is poisoned, same as `read`.
    pub fn write(&self) -> RwLockWriteGuard<'_, GameState> {
        self.inner.write().expect("game state lock poisoned")
    }
}
