//! Deep-copy snapshots of the state graph

use crate::state::game::{DelegateState, GameState};

/// What a snapshot carries besides the core state graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotScope {
    /// Keep in-progress phase bookkeeping; for snapshots that resume
    /// mid-turn, such as rollback points
    WithDelegateState,
    /// Scrub phase bookkeeping; for distributable saves that start clean
    CleanStart,
}

/// Deep copy of the whole state graph
///
/// The copy shares nothing with the source: mutating either side never
/// changes a value reachable from the other. Callers that snapshot a
/// live game must hold at least a read lock on it for the duration of
/// this call.
pub fn clone_state(game: &GameState, scope: SnapshotScope) -> GameState {
    let mut copy = game.clone();
    if scope == SnapshotScope::CleanStart {
        copy.delegate_state = DelegateState::default();
    }
    copy
}
