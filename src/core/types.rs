//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single unit on the map
///
/// Stable across save/load and across state copies, which is what lets
/// a unit be matched up again after a snapshot round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for players (factions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for territories on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerritoryId(pub u32);

impl TerritoryId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for unit types in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(pub u32);

impl UnitTypeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Slot index of a battle in the tracker arena
///
/// Only meaningful within the tracker that issued it; never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BattleId(pub u32);

impl BattleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
