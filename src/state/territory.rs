//! Territory - a named map region that units occupy

use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, TerritoryId, UnitId};

/// A single territory on the game map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    /// Stable display name, unique across the map
    pub name: String,
    /// Sea zones have no owner and cannot be conquered
    pub is_water: bool,
    /// Current owner, None for sea zones and unclaimed neutrals
    pub owner: Option<PlayerId>,
    /// Units physically present, in placement order
    pub units: Vec<UnitId>,
}

impl Territory {
    pub fn new(id: TerritoryId, name: impl Into<String>, is_water: bool, owner: Option<PlayerId>) -> Self {
        Self {
            id,
            name: name.into(),
            is_water,
            owner,
            units: Vec::new(),
        }
    }

    pub fn contains_unit(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    /// Remove a unit from this territory, returning whether it was present
    pub fn remove_unit(&mut self, unit: UnitId) -> bool {
        match self.units.iter().position(|u| *u == unit) {
            Some(index) => {
                self.units.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_unit_reports_presence() {
        let mut territory = Territory::new(TerritoryId(0), "Normandy", false, None);
        let unit = UnitId::new();
        territory.units.push(unit);

        assert!(territory.contains_unit(unit));
        assert!(territory.remove_unit(unit));
        assert!(!territory.contains_unit(unit));
        assert!(!territory.remove_unit(unit));
    }
}
