//! Engine configuration with documented constants
//!
//! All tunable combat numbers are collected here with explanations of
//! their purpose and how they interact with each other.

/// Configuration for the combat engine
///
/// These values have been tuned to produce plausible battle outcomes.
/// Changing them will affect casualty rates and battle length.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === DICE COMBAT ===
    /// Maximum number of fire exchanges in a single dice-resolved battle
    ///
    /// A battle that is still undecided after this many rounds ends with
    /// the attacker withdrawing. Prevents two low-power forces from
    /// rolling forever without a decision.
    pub max_combat_rounds: u32,

    /// Number of faces on the combat die
    ///
    /// A unit hits when its roll is strictly less than its attack (or
    /// defense) value, so larger dice make every unit proportionally
    /// weaker. Classic board-game balance assumes 6.
    pub dice_sides: u32,

    // === DETERMINISTIC COMBAT ===
    /// Fraction of the losing side's power the winner pays in casualties
    ///
    /// At 0.5, a winner facing 10 power of opposition loses up to 5 power
    /// of its own units, removed weakest-first. Raising this makes even
    /// one-sided victories expensive.
    pub winner_attrition: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_combat_rounds: 20,
            dice_sides: 6,
            winner_attrition: 0.5,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.max_combat_rounds == 0 {
            return Err("max_combat_rounds must be at least 1".into());
        }

        if self.dice_sides < 2 {
            return Err(format!("dice_sides ({}) must be at least 2", self.dice_sides));
        }

        if !(0.0..=1.0).contains(&self.winner_attrition) {
            return Err(format!(
                "winner_attrition ({}) must be between 0.0 and 1.0",
                self.winner_attrition
            ));
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Get the global engine config (initializes with defaults if not set)
pub fn config() -> &'static EngineConfig {
    CONFIG.get_or_init(EngineConfig::default)
}

/// Set the global engine config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: EngineConfig) -> Result<(), EngineConfig> {
    CONFIG.set(config)
}
