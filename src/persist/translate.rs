//! Translating references between two copies of a game
//!
//! Ids are only meaningful within the state graph that issued them.
//! Anything computed against one copy (a route found in a hypothetical,
//! a unit list chosen against a snapshot) must be translated into the
//! target graph's own references before it can be used there. Shared
//! entities resolve by stable name, so two references to the same key
//! within one pass always land on the same target object. A key absent
//! from the target fails the whole translation, never silently maps to
//! a default.

use std::hash::Hash;

use ahash::AHashMap;

use crate::core::types::{PlayerId, TerritoryId, UnitId, UnitTypeId};
use crate::ledger::ResourceLedger;
use crate::state::game::{GameState, Route};
use crate::state::unit::Unit;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("territory {0:?} has no counterpart in the target state")]
    UnknownTerritory(TerritoryId),
    #[error("player {0:?} has no counterpart in the target state")]
    UnknownPlayer(PlayerId),
    #[error("unit type {0:?} has no counterpart in the target state")]
    UnknownUnitType(UnitTypeId),
    #[error("unit {0:?} does not exist in the target state")]
    UnknownUnit(UnitId),
}

/// One translation pass from a source graph into a target graph
///
/// Name lookups are memoized for the life of the pass, so repeated
/// references to the same entity resolve once and identically.
pub struct Translator<'a> {
    source: &'a GameState,
    target: &'a GameState,
    territories: AHashMap<TerritoryId, TerritoryId>,
    players: AHashMap<PlayerId, PlayerId>,
    unit_types: AHashMap<UnitTypeId, UnitTypeId>,
}

impl<'a> Translator<'a> {
    pub fn new(source: &'a GameState, target: &'a GameState) -> Self {
        Self {
            source,
            target,
            territories: AHashMap::new(),
            players: AHashMap::new(),
            unit_types: AHashMap::new(),
        }
    }

    pub fn territory(&mut self, id: TerritoryId) -> Result<TerritoryId, TranslateError> {
        if let Some(found) = self.territories.get(&id) {
            return Ok(*found);
        }
        let found = self
            .source
            .territory(id)
            .and_then(|t| self.target.territory_by_name(&t.name))
            .ok_or(TranslateError::UnknownTerritory(id))?;
        self.territories.insert(id, found);
        Ok(found)
    }

    pub fn player(&mut self, id: PlayerId) -> Result<PlayerId, TranslateError> {
        if let Some(found) = self.players.get(&id) {
            return Ok(*found);
        }
        let found = self
            .source
            .player(id)
            .and_then(|p| self.target.player_by_name(&p.name))
            .ok_or(TranslateError::UnknownPlayer(id))?;
        self.players.insert(id, found);
        Ok(found)
    }

    pub fn unit_type(&mut self, id: UnitTypeId) -> Result<UnitTypeId, TranslateError> {
        if let Some(found) = self.unit_types.get(&id) {
            return Ok(*found);
        }
        let found = self
            .source
            .catalog
            .get(id)
            .and_then(|ty| self.target.catalog.id_of(&ty.name))
            .ok_or(TranslateError::UnknownUnitType(id))?;
        self.unit_types.insert(id, found);
        Ok(found)
    }

    /// Unit ids are stable across copies, so translation is a presence
    /// check against the target
    pub fn unit(&self, id: UnitId) -> Result<UnitId, TranslateError> {
        if self.target.unit(id).is_some() {
            Ok(id)
        } else {
            Err(TranslateError::UnknownUnit(id))
        }
    }
}

/// A value that can be re-expressed in terms of another state graph
pub trait Translate: Sized {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError>;
}

impl Translate for TerritoryId {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        cx.territory(*self)
    }
}

impl Translate for PlayerId {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        cx.player(*self)
    }
}

impl Translate for UnitTypeId {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        cx.unit_type(*self)
    }
}

impl Translate for UnitId {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        cx.unit(*self)
    }
}

impl Translate for Unit {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        Ok(Unit {
            id: cx.unit(self.id)?,
            unit_type: cx.unit_type(self.unit_type)?,
            owner: cx.player(self.owner)?,
        })
    }
}

impl Translate for Route {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        Ok(Route {
            start: cx.territory(self.start)?,
            steps: self.steps.translate(cx)?,
        })
    }
}

impl<T: Translate> Translate for Vec<T> {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        self.iter().map(|item| item.translate(cx)).collect()
    }
}

impl<T: Translate> Translate for Option<T> {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        self.as_ref().map(|item| item.translate(cx)).transpose()
    }
}

impl<K: Translate + Eq + Hash + Clone> Translate for ResourceLedger<K> {
    fn translate(&self, cx: &mut Translator<'_>) -> Result<Self, TranslateError> {
        let mut out = ResourceLedger::new();
        for (key, value) in self.iter() {
            out.add(key.translate(cx)?, value);
        }
        Ok(out)
    }
}
