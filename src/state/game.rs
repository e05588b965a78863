//! GameState - the authoritative state graph for one game instance
//!
//! Everything reachable from here is plain owned data, so a derived
//! clone is a fully independent deep copy. Shared entities (players,
//! territories, unit types) are addressed by stable name or id so that
//! references survive save/load and cross-copy translation.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, TerritoryId, UnitId, UnitTypeId};
use crate::ledger::ResourceLedger;
use crate::state::change::ChangeError;
use crate::state::player::Player;
use crate::state::territory::Territory;
use crate::state::unit::{Unit, UnitCatalog, UnitDomain, UnitType};

/// Free-form named game property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Mid-phase bookkeeping carried by turn-rollback snapshots but dropped
/// from distributable save files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegateState {
    /// Name of the phase currently executing, if any
    pub phase: Option<String>,
    /// Player whose turn is in progress
    pub current_player: Option<PlayerId>,
    /// Phase-private scratch values
    pub scratch: AHashMap<String, PropertyValue>,
}

/// A movement path: a starting territory plus the territories stepped through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub start: TerritoryId,
    pub steps: Vec<TerritoryId>,
}

impl Route {
    pub fn new(start: TerritoryId) -> Self {
        Self { start, steps: Vec::new() }
    }

    pub fn push(&mut self, step: TerritoryId) {
        self.steps.push(step);
    }

    /// Final territory of the path, the start if there are no steps
    pub fn end(&self) -> TerritoryId {
        self.steps.last().copied().unwrap_or(self.start)
    }
}

/// The full state graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Display name of the scenario or map
    pub game_name: String,
    /// Current game round (one full cycle of player turns)
    pub round: u32,
    pub players: Vec<Player>,
    pub territories: Vec<Territory>,
    /// Every unit in play, keyed by its stable id
    pub units: AHashMap<UnitId, Unit>,
    pub catalog: UnitCatalog,
    /// Named scenario options and flags
    pub properties: AHashMap<String, PropertyValue>,
    /// Mid-phase bookkeeping, reset for clean-start saves
    pub delegate_state: DelegateState,
    territory_by_name: AHashMap<String, TerritoryId>,
    player_by_name: AHashMap<String, PlayerId>,
}

impl GameState {
    pub fn new(game_name: impl Into<String>, catalog: UnitCatalog) -> Self {
        Self {
            game_name: game_name.into(),
            round: 1,
            players: Vec::new(),
            territories: Vec::new(),
            units: AHashMap::new(),
            catalog,
            properties: AHashMap::new(),
            delegate_state: DelegateState::default(),
            territory_by_name: AHashMap::new(),
            player_by_name: AHashMap::new(),
        }
    }

    // === SETUP ===

    pub fn add_player(&mut self, name: impl Into<String>, alliances: &[&str]) -> PlayerId {
        let id = PlayerId(self.players.len() as u32);
        let name = name.into();
        self.player_by_name.insert(name.clone(), id);
        let alliances = alliances.iter().map(|s| s.to_string()).collect();
        self.players.push(Player::new(id, name, alliances));
        id
    }

    pub fn add_territory(
        &mut self,
        name: impl Into<String>,
        is_water: bool,
        owner: Option<PlayerId>,
    ) -> TerritoryId {
        let id = TerritoryId(self.territories.len() as u32);
        let name = name.into();
        self.territory_by_name.insert(name.clone(), id);
        self.territories.push(Territory::new(id, name, is_water, owner));
        id
    }

    /// Create `count` fresh units of one type and place them in a territory
    pub fn place_new_units(
        &mut self,
        unit_type: UnitTypeId,
        owner: PlayerId,
        count: usize,
        territory: TerritoryId,
    ) -> Result<Vec<UnitId>, ChangeError> {
        if self.player(owner).is_none() {
            return Err(ChangeError::UnknownPlayer(owner));
        }
        let mut placed = Vec::with_capacity(count);
        for _ in 0..count {
            let unit = Unit::new(unit_type, owner);
            placed.push(unit.id);
            self.place_unit(unit, territory)?;
        }
        Ok(placed)
    }

    // === LOOKUPS ===

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0 as usize)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.0 as usize)
    }

    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.player_by_name.get(name).copied()
    }

    pub fn territory(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(id.0 as usize)
    }

    pub fn territory_mut(&mut self, id: TerritoryId) -> Option<&mut Territory> {
        self.territories.get_mut(id.0 as usize)
    }

    pub fn territory_by_name(&self, name: &str) -> Option<TerritoryId> {
        self.territory_by_name.get(name).copied()
    }

    /// Display name for a territory, used in narration
    pub fn territory_name(&self, id: TerritoryId) -> &str {
        self.territory(id).map(|t| t.name.as_str()).unwrap_or("unknown territory")
    }

    /// Display name for a player, used in narration
    pub fn player_name(&self, id: PlayerId) -> &str {
        self.player(id).map(|p| p.name.as_str()).unwrap_or("unknown player")
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_type_of(&self, id: UnitId) -> Option<&UnitType> {
        self.unit(id).and_then(|u| self.catalog.get(u.unit_type))
    }

    // === RELATIONSHIP QUERIES ===

    /// True when the two players are the same or share an alliance label
    pub fn are_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        if a == b {
            return true;
        }
        match (self.player(a), self.player(b)) {
            (Some(pa), Some(pb)) => pa.shares_alliance_with(pb),
            _ => false,
        }
    }

    /// Units in a territory owned by the player or one of its allies
    pub fn allied_units_in(&self, territory: TerritoryId, player: PlayerId) -> Vec<UnitId> {
        self.units_in_matching(territory, |unit| self.are_allied(unit.owner, player))
    }

    /// Units in a territory owned by neither the player nor an ally
    pub fn enemy_units_in(&self, territory: TerritoryId, player: PlayerId) -> Vec<UnitId> {
        self.units_in_matching(territory, |unit| !self.are_allied(unit.owner, player))
    }

    /// True when the territory holds at least one land unit owned by the
    /// player or an ally. Always evaluated against the live graph.
    pub fn has_allied_land_unit(&self, territory: TerritoryId, player: PlayerId) -> bool {
        let Some(territory) = self.territory(territory) else {
            return false;
        };
        territory.units.iter().any(|id| {
            let Some(unit) = self.unit(*id) else {
                return false;
            };
            self.are_allied(unit.owner, player)
                && self
                    .catalog
                    .get(unit.unit_type)
                    .map(|ty| ty.domain == UnitDomain::Land)
                    .unwrap_or(false)
        })
    }

    fn units_in_matching(
        &self,
        territory: TerritoryId,
        mut predicate: impl FnMut(&Unit) -> bool,
    ) -> Vec<UnitId> {
        let Some(territory) = self.territory(territory) else {
            return Vec::new();
        };
        territory
            .units
            .iter()
            .filter(|id| self.unit(**id).map(&mut predicate).unwrap_or(false))
            .copied()
            .collect()
    }

    /// Render a unit collection as "2 infantry and 1 transport"
    pub fn describe_units(&self, units: &[UnitId]) -> String {
        let mut counts: ResourceLedger<UnitTypeId> = ResourceLedger::new();
        for id in units {
            if let Some(unit) = self.unit(*id) {
                counts.add(unit.unit_type, 1);
            }
        }
        let mut parts: Vec<(String, i32)> = counts
            .iter()
            .map(|(type_id, count)| {
                let name = self
                    .catalog
                    .get(*type_id)
                    .map(|ty| ty.name.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                (name, count)
            })
            .collect();
        parts.sort();

        match parts.len() {
            0 => "no units".to_string(),
            1 => format!("{} {}", parts[0].1, parts[0].0),
            _ => {
                let (last, rest) = parts.split_last().unwrap_or((&parts[0], &[]));
                let head = rest
                    .iter()
                    .map(|(name, count)| format!("{count} {name}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} and {} {}", head, last.1, last.0)
            }
        }
    }

    // === PROPERTIES ===

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.properties.insert(key.into(), value);
    }

    // === MUTATION PRIMITIVES ===
    // Used by Change application and scenario setup. During battle
    // resolution all mutation goes through Changes on the bridge.

    pub(crate) fn place_unit(&mut self, unit: Unit, territory: TerritoryId) -> Result<(), ChangeError> {
        if self.territory(territory).is_none() {
            return Err(ChangeError::UnknownTerritory(territory));
        }
        if self.units.contains_key(&unit.id) {
            return Err(ChangeError::DuplicateUnit(unit.id));
        }
        let id = unit.id;
        self.units.insert(id, unit);
        if let Some(territory) = self.territory_mut(territory) {
            territory.units.push(id);
        }
        Ok(())
    }

    pub(crate) fn displace_unit(&mut self, id: UnitId, territory: TerritoryId) -> Result<Unit, ChangeError> {
        let Some(slot) = self.territory_mut(territory) else {
            return Err(ChangeError::UnknownTerritory(territory));
        };
        if !slot.remove_unit(id) {
            return Err(ChangeError::UnitNotInTerritory { unit: id, territory });
        }
        self.units
            .remove(&id)
            .ok_or(ChangeError::UnitNotInTerritory { unit: id, territory })
    }
}
