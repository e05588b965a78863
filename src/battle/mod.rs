//! Battle system - pending fights, their dependency DAG and resolution
//!
//! Battles are created during movement and resolved later, in an order
//! constrained by what depends on what:
//! - An amphibious landing depends on the naval fight in the sea zone it
//!   staged from
//! - Casualties in a preceding fight cascade into dependents (cargo dies
//!   with its transport)
//! - Resolution is strictly sequential per turn; there is no concurrent
//!   combat

pub mod combat;
pub mod resolver;
pub mod tracker;

// Re-exports for convenient access
pub use combat::{Battle, BattleClass, BattleKind, BattleOutcome};
pub use resolver::{CombatResolver, CombatResult, DiceResolver, StrengthResolver};
pub use tracker::BattleTracker;
