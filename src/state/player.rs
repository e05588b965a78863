//! Player - a faction with alliances and a resource stockpile

use serde::{Deserialize, Serialize};

use crate::core::types::PlayerId;
use crate::ledger::ResourceLedger;

/// A player faction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Stable display name, unique across the game
    pub name: String,
    /// Alliance labels; two players sharing any label are allied
    pub alliances: Vec<String>,
    /// Economy stockpile (production points and the like)
    pub resources: ResourceLedger<String>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, alliances: Vec<String>) -> Self {
        Self {
            id,
            name: name.into(),
            alliances,
            resources: ResourceLedger::new(),
        }
    }

    /// True when both players carry at least one common alliance label
    pub fn shares_alliance_with(&self, other: &Player) -> bool {
        self.alliances.iter().any(|label| other.alliances.contains(label))
    }
}
