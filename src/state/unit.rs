//! Units and the unit-type catalog
//!
//! Unit types are shared catalog entries referenced by id; units are
//! individual pieces on the map. Catalogs can be loaded from TOML so
//! scenarios can bring their own rosters.

use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{PlayerId, UnitId, UnitTypeId};

/// Where a unit can fight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitDomain {
    Land,
    Sea,
    Air,
}

/// A catalog entry describing one kind of unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    pub name: String,
    pub domain: UnitDomain,
    /// Combat value when attacking
    pub attack: i32,
    /// Combat value when defending
    pub defense: i32,
    /// Number of land units this unit can carry, zero for non-carriers
    pub transport_capacity: u32,
    /// Production damage inflicted per strategic raid, zero for non-raiders
    pub raid: i32,
}

impl UnitType {
    pub fn is_transport(&self) -> bool {
        self.transport_capacity > 0
    }
}

/// A single unit in play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,
}

impl Unit {
    pub fn new(unit_type: UnitTypeId, owner: PlayerId) -> Self {
        Self {
            id: UnitId::new(),
            unit_type,
            owner,
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("unit type '{name}' has unknown domain '{domain}'")]
    UnknownDomain { name: String, domain: String },

    #[error("unit type '{name}' has a negative combat value")]
    NegativeCombatValue { name: String },

    #[error("duplicate unit type '{0}'")]
    DuplicateType(String),

    #[error("failed to parse unit catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read unit catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// The roster of unit types available to a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCatalog {
    types: Vec<UnitType>,
    by_name: AHashMap<String, UnitTypeId>,
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            by_name: AHashMap::new(),
        }
    }

    /// Built-in roster used by tests and the demo scenario
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        let defaults = [
            ("infantry", UnitDomain::Land, 1, 2, 0, 0),
            ("armour", UnitDomain::Land, 3, 3, 0, 0),
            ("fighter", UnitDomain::Air, 3, 4, 0, 0),
            ("bomber", UnitDomain::Air, 4, 1, 0, 3),
            ("transport", UnitDomain::Sea, 0, 0, 2, 0),
            ("destroyer", UnitDomain::Sea, 2, 2, 0, 0),
            ("battleship", UnitDomain::Sea, 4, 4, 0, 0),
        ];
        for (name, domain, attack, defense, transport_capacity, raid) in defaults {
            let id = UnitTypeId(catalog.types.len() as u32);
            catalog.by_name.insert(name.to_string(), id);
            catalog.types.push(UnitType {
                name: name.to_string(),
                domain,
                attack,
                defense,
                transport_capacity,
                raid,
            });
        }
        catalog
    }

    /// Register a new unit type, rejecting duplicate names
    pub fn register(&mut self, unit_type: UnitType) -> Result<UnitTypeId, CatalogError> {
        if self.by_name.contains_key(&unit_type.name) {
            return Err(CatalogError::DuplicateType(unit_type.name));
        }
        let id = UnitTypeId(self.types.len() as u32);
        self.by_name.insert(unit_type.name.clone(), id);
        self.types.push(unit_type);
        Ok(id)
    }

    pub fn get(&self, id: UnitTypeId) -> Option<&UnitType> {
        self.types.get(id.0 as usize)
    }

    pub fn id_of(&self, name: &str) -> Option<UnitTypeId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitTypeId, &UnitType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, ty)| (UnitTypeId(index as u32), ty))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Parse a catalog from TOML text
    pub fn parse_toml(text: &str) -> Result<Self, CatalogError> {
        let file: TomlCatalogFile = toml::from_str(text)?;
        let mut catalog = Self::new();
        for entry in file.unit_types {
            catalog.register(entry.into_unit_type()?)?;
        }
        Ok(catalog)
    }

    /// Load a catalog from a TOML file on disk
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_toml(&text)
    }
}

/// Raw TOML schema before validation
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    unit_types: Vec<TomlUnitType>,
}

#[derive(Debug, Deserialize)]
struct TomlUnitType {
    name: String,
    domain: String,
    attack: i32,
    defense: i32,
    #[serde(default)]
    transport_capacity: u32,
    #[serde(default)]
    raid: i32,
}

impl TomlUnitType {
    fn into_unit_type(self) -> Result<UnitType, CatalogError> {
        let domain = match self.domain.as_str() {
            "land" => UnitDomain::Land,
            "sea" => UnitDomain::Sea,
            "air" => UnitDomain::Air,
            _ => {
                return Err(CatalogError::UnknownDomain {
                    name: self.name,
                    domain: self.domain,
                })
            }
        };
        if self.attack < 0 || self.defense < 0 || self.raid < 0 {
            return Err(CatalogError::NegativeCombatValue { name: self.name });
        }
        Ok(UnitType {
            name: self.name,
            domain,
            attack: self.attack,
            defense: self.defense,
            transport_capacity: self.transport_capacity,
            raid: self.raid,
        })
    }
}
