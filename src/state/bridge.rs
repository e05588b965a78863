//! DelegateBridge - the single mutation funnel for battle resolution
//!
//! Battles never touch the state graph directly: every mutation is a
//! Change applied here, so the log and the graph cannot drift apart.

use crate::state::change::{Change, ChangeError, ChangeLog};
use crate::state::game::GameState;
use crate::state::history::HistoryWriter;

/// Borrowed access to the graph, the change log and the history sink
/// for the duration of one resolution pass
pub struct DelegateBridge<'a> {
    game: &'a mut GameState,
    log: &'a mut ChangeLog,
    history: &'a mut HistoryWriter,
}

impl<'a> DelegateBridge<'a> {
    pub fn new(
        game: &'a mut GameState,
        log: &'a mut ChangeLog,
        history: &'a mut HistoryWriter,
    ) -> Self {
        Self { game, log, history }
    }

    /// Apply a change and record it with its inverse in the log
    ///
    /// A failed application records nothing and leaves the graph as it
    /// was.
    pub fn add_change(
        &mut self,
        description: impl Into<String>,
        change: Change,
    ) -> Result<u64, ChangeError> {
        let description = description.into();
        let inverse = change.apply(self.game)?;
        tracing::debug!("change applied: {description}");
        Ok(self.log.record(description, change, inverse))
    }

    pub fn game(&self) -> &GameState {
        self.game
    }

    pub fn log(&self) -> &ChangeLog {
        self.log
    }

    /// Narration sink; best-effort and never allowed to mask a
    /// mutation failure
    pub fn history_mut(&mut self) -> &mut HistoryWriter {
        self.history
    }
}
