//! Salient - Combat Resolution and State Persistence Core

pub mod battle;
pub mod core;
pub mod ledger;
pub mod persist;
pub mod post;
pub mod state;
