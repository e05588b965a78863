//! Change - invertible state mutations and the log that records them
//!
//! Every battle-time mutation of the state graph is expressed as a
//! Change applied through the delegate bridge. Application returns the
//! inverse change, which the log keeps so a turn can be unwound.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{PlayerId, TerritoryId, UnitId};
use crate::state::game::{GameState, PropertyValue};
use crate::state::unit::Unit;

#[derive(Error, Debug)]
pub enum ChangeError {
    #[error("unknown territory {0:?}")]
    UnknownTerritory(TerritoryId),

    #[error("unknown player {0:?}")]
    UnknownPlayer(PlayerId),

    #[error("unit {unit:?} is not in territory {territory:?}")]
    UnitNotInTerritory { unit: UnitId, territory: TerritoryId },

    #[error("unit {0:?} is already in play")]
    DuplicateUnit(UnitId),

    #[error("unit {0:?} appears twice in one change")]
    RepeatedUnit(UnitId),

    #[error("territory {0:?} is a sea zone and cannot be owned")]
    WaterOwnership(TerritoryId),
}

/// An invertible mutation of the state graph
///
/// Validation happens before any mutation, so a failed application
/// leaves the graph untouched. Composite changes apply left to right
/// and roll back already-applied parts when a later part fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    /// Put units, with their full records, into a territory
    AddUnits { territory: TerritoryId, units: Vec<Unit> },
    /// Remove units from a territory and from play
    RemoveUnits { territory: TerritoryId, units: Vec<UnitId> },
    /// Transfer territory ownership
    ChangeOwner { territory: TerritoryId, new_owner: Option<PlayerId> },
    /// Adjust one entry of a player's resource stockpile
    AdjustResource { player: PlayerId, resource: String, delta: i32 },
    /// Set a named game property
    SetProperty { key: String, value: PropertyValue },
    /// Remove a named game property
    ClearProperty { key: String },
    /// Apply several changes as one logical step
    Composite(Vec<Change>),
}

impl Change {
    /// Apply to the state graph, returning the inverse change
    pub fn apply(&self, game: &mut GameState) -> Result<Change, ChangeError> {
        match self {
            Change::AddUnits { territory, units } => {
                if game.territory(*territory).is_none() {
                    return Err(ChangeError::UnknownTerritory(*territory));
                }
                let mut listed: AHashSet<UnitId> = AHashSet::with_capacity(units.len());
                for unit in units {
                    if game.unit(unit.id).is_some() {
                        return Err(ChangeError::DuplicateUnit(unit.id));
                    }
                    if !listed.insert(unit.id) {
                        return Err(ChangeError::RepeatedUnit(unit.id));
                    }
                }
                for unit in units {
                    game.place_unit(unit.clone(), *territory)?;
                }
                Ok(Change::RemoveUnits {
                    territory: *territory,
                    units: units.iter().map(|u| u.id).collect(),
                })
            }

            Change::RemoveUnits { territory, units } => {
                let Some(site) = game.territory(*territory) else {
                    return Err(ChangeError::UnknownTerritory(*territory));
                };
                let mut listed: AHashSet<UnitId> = AHashSet::with_capacity(units.len());
                for id in units {
                    if !site.contains_unit(*id) {
                        return Err(ChangeError::UnitNotInTerritory {
                            unit: *id,
                            territory: *territory,
                        });
                    }
                    if !listed.insert(*id) {
                        return Err(ChangeError::RepeatedUnit(*id));
                    }
                }
                let mut removed = Vec::with_capacity(units.len());
                for id in units {
                    removed.push(game.displace_unit(*id, *territory)?);
                }
                Ok(Change::AddUnits { territory: *territory, units: removed })
            }

            Change::ChangeOwner { territory, new_owner } => {
                let Some(site) = game.territory(*territory) else {
                    return Err(ChangeError::UnknownTerritory(*territory));
                };
                if site.is_water && new_owner.is_some() {
                    return Err(ChangeError::WaterOwnership(*territory));
                }
                if let Some(owner) = new_owner {
                    if game.player(*owner).is_none() {
                        return Err(ChangeError::UnknownPlayer(*owner));
                    }
                }
                let old_owner = site.owner;
                if let Some(site) = game.territory_mut(*territory) {
                    site.owner = *new_owner;
                }
                Ok(Change::ChangeOwner { territory: *territory, new_owner: old_owner })
            }

            Change::AdjustResource { player, resource, delta } => {
                let Some(target) = game.player_mut(*player) else {
                    return Err(ChangeError::UnknownPlayer(*player));
                };
                target.resources.add(resource.clone(), *delta);
                Ok(Change::AdjustResource {
                    player: *player,
                    resource: resource.clone(),
                    delta: -delta,
                })
            }

            Change::SetProperty { key, value } => {
                let inverse = match game.property(key) {
                    Some(old) => Change::SetProperty { key: key.clone(), value: old.clone() },
                    None => Change::ClearProperty { key: key.clone() },
                };
                game.set_property(key.clone(), value.clone());
                Ok(inverse)
            }

            Change::ClearProperty { key } => {
                let inverse = match game.properties.remove(key) {
                    Some(old) => Change::SetProperty { key: key.clone(), value: old },
                    // Clearing an absent property is a no-op both ways
                    None => Change::ClearProperty { key: key.clone() },
                };
                Ok(inverse)
            }

            Change::Composite(parts) => {
                let mut inverses = Vec::with_capacity(parts.len());
                for part in parts {
                    match part.apply(game) {
                        Ok(inverse) => inverses.push(inverse),
                        Err(err) => {
                            // Unwind what already landed. The inverses were
                            // produced by successful applications, so a
                            // failure here means the graph is corrupt.
                            for inverse in inverses.iter().rev() {
                                if let Err(rollback) = inverse.apply(game) {
                                    panic!(
                                        "composite rollback failed, state graph is inconsistent: {rollback}"
                                    );
                                }
                            }
                            return Err(err);
                        }
                    }
                }
                inverses.reverse();
                Ok(Change::Composite(inverses))
            }
        }
    }
}

/// One applied change with its recorded inverse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub seq: u64,
    pub description: String,
    pub change: Change,
    pub inverse: Change,
}

/// Append-only log of applied changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLog {
    records: Vec<ChangeRecord>,
    next_seq: u64,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an already-applied change and its inverse
    pub fn record(&mut self, description: String, change: Change, inverse: Change) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.push(ChangeRecord { seq, description, change, inverse });
        seq
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Undo the most recent change, returning whether one was undone
    pub fn rollback_last(&mut self, game: &mut GameState) -> Result<bool, ChangeError> {
        match self.records.pop() {
            Some(record) => {
                record.inverse.apply(game)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Undo every change with sequence number >= `seq`, newest first
    pub fn rollback_to(&mut self, seq: u64, game: &mut GameState) -> Result<(), ChangeError> {
        while self.records.last().map(|r| r.seq >= seq).unwrap_or(false) {
            self.rollback_last(game)?;
        }
        Ok(())
    }
}
