//! Combat resolvers - pluggable resolution of fought battles
//!
//! A resolver decides who dies; it never mutates the state graph. The
//! battle turns the returned result into Changes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::config;
use crate::core::types::{PlayerId, TerritoryId, UnitId};
use crate::state::game::GameState;

/// Casualties and verdict for one fought battle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatResult {
    pub attacker_losses: Vec<UnitId>,
    pub defender_losses: Vec<UnitId>,
    pub attacker_won: bool,
    /// Fire exchanges it took to reach a decision
    pub rounds: u32,
}

/// Strategy for deciding a fought battle
pub trait CombatResolver {
    fn name(&self) -> &str;

    fn resolve(
        &mut self,
        game: &GameState,
        site: TerritoryId,
        attacker: PlayerId,
        attackers: &[UnitId],
        defenders: &[UnitId],
    ) -> CombatResult;
}

fn strength(game: &GameState, unit: UnitId, attacking: bool) -> i32 {
    game.unit_type_of(unit)
        .map(|ty| if attacking { ty.attack } else { ty.defense })
        .unwrap_or(0)
}

fn total_strength(game: &GameState, units: &[UnitId], attacking: bool) -> i32 {
    units.iter().map(|id| strength(game, *id, attacking)).sum()
}

/// Casualty order: weakest units die first. The sort is stable, so
/// equal-strength units keep their placement order and outcomes stay
/// reproducible.
fn weakest_first(game: &GameState, units: &[UnitId], attacking: bool) -> Vec<UnitId> {
    let mut sorted = units.to_vec();
    sorted.sort_by_key(|id| strength(game, *id, attacking));
    sorted
}

/// Deterministic resolver comparing total attack to total defense
///
/// The weaker side is eliminated; the winner pays attrition worth a
/// configured share of the loser's power, weakest units first. Ties go
/// to the defender.
#[derive(Debug, Default)]
pub struct StrengthResolver;

impl StrengthResolver {
    pub fn new() -> Self {
        Self
    }
}

impl CombatResolver for StrengthResolver {
    fn name(&self) -> &str {
        "strength"
    }

    fn resolve(
        &mut self,
        game: &GameState,
        _site: TerritoryId,
        _attacker: PlayerId,
        attackers: &[UnitId],
        defenders: &[UnitId],
    ) -> CombatResult {
        if defenders.is_empty() {
            return CombatResult { attacker_won: true, ..Default::default() };
        }

        let attack = total_strength(game, attackers, true);
        let defense = total_strength(game, defenders, false);
        let attacker_won = attack > defense;

        let (winner, winner_attacking, loser, loser_power) = if attacker_won {
            (attackers, true, defenders, defense)
        } else {
            (defenders, false, attackers, attack)
        };

        let mut budget = (loser_power as f32 * config().winner_attrition).round() as i32;
        let mut winner_losses = Vec::new();
        for unit in weakest_first(game, winner, winner_attacking) {
            if budget <= 0 {
                break;
            }
            budget -= strength(game, unit, winner_attacking).max(1);
            winner_losses.push(unit);
        }

        let mut result = CombatResult { attacker_won, rounds: 1, ..Default::default() };
        if attacker_won {
            result.attacker_losses = winner_losses;
            result.defender_losses = loser.to_vec();
        } else {
            result.attacker_losses = loser.to_vec();
            result.defender_losses = winner_losses;
        }
        result
    }
}

/// Dice-based resolver: rounds of simultaneous fire
///
/// Each unit rolls once per round and hits when the roll comes up under
/// its combat value. Hits remove opposing units weakest-first. A fixed
/// seed replays identically.
#[derive(Debug)]
pub struct DiceResolver {
    rng: ChaCha8Rng,
}

impl DiceResolver {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    fn count_hits(
        &mut self,
        game: &GameState,
        units: &[UnitId],
        attacking: bool,
        dice_sides: u32,
    ) -> usize {
        units
            .iter()
            .filter(|id| {
                let power = strength(game, **id, attacking);
                power > 0 && (self.rng.gen_range(0..dice_sides) as i32) < power
            })
            .count()
    }
}

impl CombatResolver for DiceResolver {
    fn name(&self) -> &str {
        "dice"
    }

    fn resolve(
        &mut self,
        game: &GameState,
        site: TerritoryId,
        _attacker: PlayerId,
        attackers: &[UnitId],
        defenders: &[UnitId],
    ) -> CombatResult {
        let cfg = config();
        let mut alive_attackers = weakest_first(game, attackers, true);
        let mut alive_defenders = weakest_first(game, defenders, false);
        let mut result = CombatResult::default();

        while !alive_attackers.is_empty()
            && !alive_defenders.is_empty()
            && result.rounds < cfg.max_combat_rounds
        {
            result.rounds += 1;
            // Fire is simultaneous: both sides roll before anything dies
            let attacker_hits = self.count_hits(game, &alive_attackers, true, cfg.dice_sides);
            let defender_hits = self.count_hits(game, &alive_defenders, false, cfg.dice_sides);

            let defender_dead = attacker_hits.min(alive_defenders.len());
            let attacker_dead = defender_hits.min(alive_attackers.len());
            result.defender_losses.extend(alive_defenders.drain(..defender_dead));
            result.attacker_losses.extend(alive_attackers.drain(..attacker_dead));
        }

        result.attacker_won = alive_defenders.is_empty() && !alive_attackers.is_empty();
        tracing::trace!("dice battle at {:?} decided in {} rounds", site, result.rounds);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::unit::UnitCatalog;

    struct Fixture {
        game: GameState,
        blue: PlayerId,
        red: PlayerId,
        field: TerritoryId,
    }

    fn fixture() -> Fixture {
        let mut game = GameState::new("test", UnitCatalog::with_defaults());
        let blue = game.add_player("Blue", &["Allies"]);
        let red = game.add_player("Red", &["Axis"]);
        let field = game.add_territory("Flanders", false, Some(red));
        Fixture { game, blue, red, field }
    }

    #[test]
    fn test_strength_resolver_walkover() {
        let mut f = fixture();
        let infantry = f.game.catalog.id_of("infantry").unwrap();
        let attackers = f.game.place_new_units(infantry, f.blue, 2, f.field).unwrap();

        let mut resolver = StrengthResolver::new();
        let result = resolver.resolve(&f.game, f.field, f.blue, &attackers, &[]);
        assert!(result.attacker_won);
        assert!(result.attacker_losses.is_empty());
        assert!(result.defender_losses.is_empty());
    }

    #[test]
    fn test_strength_resolver_eliminates_weaker_side() {
        let mut f = fixture();
        let armour = f.game.catalog.id_of("armour").unwrap();
        let infantry = f.game.catalog.id_of("infantry").unwrap();
        // 9 attack vs 4 defense
        let attackers = f.game.place_new_units(armour, f.blue, 3, f.field).unwrap();
        let defenders = f.game.place_new_units(infantry, f.red, 2, f.field).unwrap();

        let mut resolver = StrengthResolver::new();
        let result = resolver.resolve(&f.game, f.field, f.blue, &attackers, &defenders);

        assert!(result.attacker_won);
        assert_eq!(result.defender_losses.len(), 2);
        // Attrition budget round(4 * 0.5) = 2 buys exactly one armour
        assert_eq!(result.attacker_losses.len(), 1);
        assert!(defenders.contains(&result.defender_losses[0]));
        assert!(attackers.contains(&result.attacker_losses[0]));
    }

    #[test]
    fn test_strength_resolver_tie_goes_to_defender() {
        let mut f = fixture();
        let infantry = f.game.catalog.id_of("infantry").unwrap();
        // 2 attack vs 2 defense
        let attackers = f.game.place_new_units(infantry, f.blue, 2, f.field).unwrap();
        let defenders = f.game.place_new_units(infantry, f.red, 1, f.field).unwrap();

        let mut resolver = StrengthResolver::new();
        let result = resolver.resolve(&f.game, f.field, f.blue, &attackers, &defenders);

        assert!(!result.attacker_won);
        assert_eq!(result.attacker_losses.len(), 2);
    }

    #[test]
    fn test_dice_resolver_is_deterministic_per_seed() {
        let mut f = fixture();
        let infantry = f.game.catalog.id_of("infantry").unwrap();
        let armour = f.game.catalog.id_of("armour").unwrap();
        let attackers = f.game.place_new_units(armour, f.blue, 3, f.field).unwrap();
        let defenders = f.game.place_new_units(infantry, f.red, 3, f.field).unwrap();

        let mut first = DiceResolver::new(42);
        let mut second = DiceResolver::new(42);
        let a = first.resolve(&f.game, f.field, f.blue, &attackers, &defenders);
        let b = second.resolve(&f.game, f.field, f.blue, &attackers, &defenders);
        assert_eq!(a, b);
    }

    #[test]
    fn test_dice_resolver_conserves_units() {
        let mut f = fixture();
        let infantry = f.game.catalog.id_of("infantry").unwrap();
        let attackers = f.game.place_new_units(infantry, f.blue, 4, f.field).unwrap();
        let defenders = f.game.place_new_units(infantry, f.red, 4, f.field).unwrap();

        let mut resolver = DiceResolver::new(7);
        let result = resolver.resolve(&f.game, f.field, f.blue, &attackers, &defenders);

        assert!(result.attacker_losses.iter().all(|id| attackers.contains(id)));
        assert!(result.defender_losses.iter().all(|id| defenders.contains(id)));
        assert!(result.attacker_losses.len() <= attackers.len());
        assert!(result.defender_losses.len() <= defenders.len());
    }

    #[test]
    fn test_dice_resolver_walkover_needs_no_rolls() {
        let mut f = fixture();
        let infantry = f.game.catalog.id_of("infantry").unwrap();
        let attackers = f.game.place_new_units(infantry, f.blue, 1, f.field).unwrap();

        let mut resolver = DiceResolver::new(3);
        let result = resolver.resolve(&f.game, f.field, f.blue, &attackers, &[]);
        assert!(result.attacker_won);
        assert_eq!(result.rounds, 0);
        assert!(result.attacker_losses.is_empty());
    }

    #[test]
    fn test_dice_resolver_stalls_at_round_cap() {
        let mut f = fixture();
        let transport = f.game.catalog.id_of("transport").unwrap();
        // Zero-power forces can never score a hit
        let attackers = f.game.place_new_units(transport, f.blue, 1, f.field).unwrap();
        let defenders = f.game.place_new_units(transport, f.red, 1, f.field).unwrap();

        let mut resolver = DiceResolver::new(11);
        let result = resolver.resolve(&f.game, f.field, f.blue, &attackers, &defenders);

        assert_eq!(result.rounds, config().max_combat_rounds);
        assert!(!result.attacker_won);
        assert!(result.attacker_losses.is_empty());
        assert!(result.defender_losses.is_empty());
    }
}
