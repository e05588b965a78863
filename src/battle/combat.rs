//! Battle - one unresolved fight at a territory
//!
//! A battle is PENDING from creation until `fight` (or an empty-battle
//! discard) marks it OVER. Kind-specific behavior lives in the
//! `BattleKind` match arms; shared bookkeeping (site, attacker,
//! dependent units) lives here.

use ahash::{AHashMap, AHashSet};

use crate::battle::resolver::CombatResolver;
use crate::battle::tracker::BattleTracker;
use crate::core::types::{PlayerId, TerritoryId, UnitId};
use crate::state::bridge::DelegateBridge;
use crate::state::change::{Change, ChangeError};
use crate::state::game::{GameState, Route};

/// Broad class of a battle; at most one battle of each class can be
/// pending per territory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattleClass {
    Normal,
    Bombing,
}

/// How a battle resolves when fought
#[derive(Debug, Clone)]
pub enum BattleKind {
    /// Unopposed occupation: no combat, the site changes hands when a
    /// qualifying land force is present
    NonFighting,
    /// Opposed combat decided by a CombatResolver
    Fought,
    /// Strategic raid against the owner's production; never conquers
    Bombing,
}

/// What happened when a battle was fought
#[derive(Debug, Clone, Default)]
pub struct BattleOutcome {
    /// Every unit removed from play, both sides
    pub casualties: Vec<UnitId>,
    pub attacker_won: bool,
    pub conquered: bool,
    pub raid_damage: i32,
}

/// A pending or concluded battle at a single site
#[derive(Debug)]
pub struct Battle {
    pub site: TerritoryId,
    pub class: BattleClass,
    pub kind: BattleKind,
    pub attacker: PlayerId,
    /// True when the site had no owner at creation time
    pub neutral: bool,
    over: bool,
    /// Carrier unit -> units that ride with it and die with it
    dependent_units: AHashMap<UnitId, Vec<UnitId>>,
}

impl Battle {
    pub fn new(
        site: TerritoryId,
        class: BattleClass,
        kind: BattleKind,
        attacker: PlayerId,
        neutral: bool,
    ) -> Self {
        Self {
            site,
            class,
            kind,
            attacker,
            neutral,
            over: false,
            dependent_units: AHashMap::new(),
        }
    }

    pub fn key(&self) -> (TerritoryId, BattleClass) {
        (self.site, self.class)
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub(crate) fn mark_over(&mut self) {
        self.over = true;
    }

    /// Record units that ride with a carrier through this battle.
    /// Registering a rider again keeps the one entry.
    pub fn add_dependent_units(&mut self, carrier: UnitId, dependents: Vec<UnitId>) {
        let riders = self.dependent_units.entry(carrier).or_default();
        for dependent in dependents {
            if !riders.contains(&dependent) {
                riders.push(dependent);
            }
        }
    }

    pub fn dependent_units_of(&self, carrier: UnitId) -> &[UnitId] {
        self.dependent_units
            .get(&carrier)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Withdraw units from the attack: strip them from every dependent
    /// set. A no-op for units that appear nowhere.
    pub fn remove_attack(&mut self, route: Option<&Route>, units: &[UnitId]) {
        if let Some(route) = route {
            tracing::debug!(
                "attack on {:?} withdrawn along route ending at {:?}",
                self.site,
                route.end()
            );
        }
        for dependents in self.dependent_units.values_mut() {
            dependents.retain(|id| !units.contains(id));
        }
    }

    /// True when no qualifying attacking force is present
    ///
    /// Always evaluated against the live graph, never cached: units may
    /// have been added or removed while the battle was pending.
    pub fn is_empty(&self, game: &GameState) -> bool {
        match self.kind {
            BattleKind::NonFighting => !game.has_allied_land_unit(self.site, self.attacker),
            BattleKind::Fought => game.allied_units_in(self.site, self.attacker).is_empty(),
            BattleKind::Bombing => self.raiders(game).is_empty(),
        }
    }

    /// Resolve this battle. The tracker enforces dependency order before
    /// calling in; by the time we run, every battle this one waited on
    /// is OVER.
    pub(crate) fn fight(
        &mut self,
        tracker: &mut BattleTracker,
        bridge: &mut DelegateBridge<'_>,
        resolver: &mut dyn CombatResolver,
    ) -> Result<BattleOutcome, ChangeError> {
        let mut outcome = BattleOutcome::default();
        match self.kind {
            BattleKind::NonFighting => {
                if !self.is_empty(bridge.game()) {
                    let occupiers = bridge.game().allied_units_in(self.site, self.attacker);
                    tracker.take_over(self.site, self.attacker, bridge, &occupiers)?;
                    tracker.add_to_conquered(self.site);
                    outcome.attacker_won = true;
                    outcome.conquered = true;
                }
            }

            BattleKind::Fought => {
                let (attackers, defenders, site_name, attacker_name) = {
                    let game = bridge.game();
                    (
                        game.allied_units_in(self.site, self.attacker),
                        game.enemy_units_in(self.site, self.attacker),
                        game.territory_name(self.site).to_string(),
                        game.player_name(self.attacker).to_string(),
                    )
                };
                let opening = format!(
                    "{attacker_name} attacks {site_name} with {}",
                    bridge.game().describe_units(&attackers)
                );
                bridge.history_mut().start_event(opening);

                let result =
                    resolver.resolve(bridge.game(), self.site, self.attacker, &attackers, &defenders);
                tracing::debug!(
                    "battle at {site_name} resolved by {} in {} rounds",
                    resolver.name(),
                    result.rounds
                );

                for (losses, loser) in [
                    (&result.attacker_losses, attacker_name.clone()),
                    (&result.defender_losses, format!("defenders of {site_name}")),
                ] {
                    if losses.is_empty() {
                        continue;
                    }
                    let text = format!(
                        "{loser} lose {} in {site_name}",
                        bridge.game().describe_units(losses)
                    );
                    bridge.add_change(
                        text.clone(),
                        Change::RemoveUnits { territory: self.site, units: losses.clone() },
                    )?;
                    bridge.history_mut().start_event(text);
                    outcome.casualties.extend_from_slice(losses);
                }

                outcome.attacker_won = result.attacker_won;
                if result.attacker_won {
                    let can_occupy = {
                        let game = bridge.game();
                        let land = game.territory(self.site).map(|t| !t.is_water).unwrap_or(false);
                        land && game.has_allied_land_unit(self.site, self.attacker)
                    };
                    if can_occupy {
                        let occupiers = bridge.game().allied_units_in(self.site, self.attacker);
                        tracker.take_over(self.site, self.attacker, bridge, &occupiers)?;
                        tracker.add_to_conquered(self.site);
                        outcome.conquered = true;
                    }
                }
            }

            BattleKind::Bombing => {
                let (raiders, owner) = {
                    let game = bridge.game();
                    (self.raiders(game), game.territory(self.site).and_then(|t| t.owner))
                };
                let damage: i32 = {
                    let game = bridge.game();
                    raiders
                        .iter()
                        .filter_map(|id| game.unit_type_of(*id))
                        .map(|ty| ty.raid)
                        .sum()
                };
                if let Some(owner) = owner {
                    if damage > 0 && !bridge.game().are_allied(owner, self.attacker) {
                        let text = format!(
                            "Bombing raid in {} costs {} {damage} production",
                            bridge.game().territory_name(self.site),
                            bridge.game().player_name(owner),
                        );
                        bridge.add_change(
                            text.clone(),
                            Change::AdjustResource {
                                player: owner,
                                resource: "production".to_string(),
                                delta: -damage,
                            },
                        )?;
                        bridge.history_mut().start_event(text);
                        outcome.raid_damage = damage;
                    }
                }
            }
        }
        self.over = true;
        Ok(outcome)
    }

    /// Called by the tracker when a battle this one depended on ends
    /// with casualties. Dependents of the lost units that are still in
    /// our site are removed; nothing is narrated when there are none.
    /// A unit that rode with more than one lost carrier dies once.
    pub(crate) fn units_lost_in_preceding_battle(
        &mut self,
        preceding_site: TerritoryId,
        lost: &[UnitId],
        bridge: &mut DelegateBridge<'_>,
    ) -> Result<(), ChangeError> {
        let mut dependents_lost: Vec<UnitId> = Vec::new();
        let mut seen: AHashSet<UnitId> = AHashSet::new();
        for carrier in lost {
            if let Some(riders) = self.dependent_units.remove(carrier) {
                dependents_lost.extend(riders.into_iter().filter(|id| seen.insert(*id)));
            }
        }

        let text = {
            let game = bridge.game();
            let site = game.territory(self.site);
            dependents_lost.retain(|id| site.map(|t| t.contains_unit(*id)).unwrap_or(false));
            if dependents_lost.is_empty() {
                return Ok(());
            }
            tracing::debug!(
                "casualties at {:?} cascade into {}",
                preceding_site,
                game.territory_name(self.site)
            );
            format!(
                "{} lost in {}",
                game.describe_units(&dependents_lost),
                game.territory_name(self.site)
            )
        };

        bridge.add_change(
            text.clone(),
            Change::RemoveUnits { territory: self.site, units: dependents_lost },
        )?;
        bridge.history_mut().start_event(text);
        Ok(())
    }

    fn raiders(&self, game: &GameState) -> Vec<UnitId> {
        game.allied_units_in(self.site, self.attacker)
            .into_iter()
            .filter(|id| game.unit_type_of(*id).map(|ty| ty.raid > 0).unwrap_or(false))
            .collect()
    }
}
