//! BattleTracker - registry and dependency DAG of pending battles
//!
//! Battles live in an arena indexed by `BattleId`; dependency edges are
//! index-based sets kept in both directions so concluding a battle
//! unblocks its waiters in time proportional to the edges touched.
//! Fighting out of dependency order is a defect in the calling
//! orchestration and panics rather than reordering silently.

use ahash::{AHashMap, AHashSet};

use crate::battle::combat::{Battle, BattleClass, BattleOutcome};
use crate::battle::resolver::CombatResolver;
use crate::core::types::{BattleId, PlayerId, TerritoryId, UnitId};
use crate::state::bridge::DelegateBridge;
use crate::state::change::{Change, ChangeError};
use crate::state::game::Route;

/// Registry of all pending battles for the current turn
#[derive(Debug, Default)]
pub struct BattleTracker {
    battles: Vec<Option<Battle>>,
    /// battles\[i\] waits on every battle in deps\[i\]
    deps: Vec<AHashSet<BattleId>>,
    /// battles in rdeps\[i\] wait on battles\[i\]
    rdeps: Vec<AHashSet<BattleId>>,
    by_key: AHashMap<(TerritoryId, BattleClass), BattleId>,
    conquered: AHashSet<TerritoryId>,
    blitzed: AHashSet<TerritoryId>,
}

impl BattleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending battle
    ///
    /// Panics when a battle of the same class is already pending at the
    /// site; the dispatcher must merge attacks into the existing battle
    /// instead of creating a second one.
    pub fn add_battle(&mut self, battle: Battle) -> BattleId {
        if self.by_key.contains_key(&battle.key()) {
            panic!(
                "a {:?} battle is already pending at {:?}",
                battle.class, battle.site
            );
        }
        let id = BattleId(self.battles.len() as u32);
        self.by_key.insert(battle.key(), id);
        self.battles.push(Some(battle));
        self.deps.push(AHashSet::new());
        self.rdeps.push(AHashSet::new());
        id
    }

    pub fn pending_battle(&self, site: TerritoryId, class: BattleClass) -> Option<BattleId> {
        self.by_key.get(&(site, class)).copied()
    }

    pub fn get_battle(&self, id: BattleId) -> Option<&Battle> {
        self.battles.get(id.index()).and_then(|slot| slot.as_ref())
    }

    pub fn get_battle_mut(&mut self, id: BattleId) -> Option<&mut Battle> {
        self.battles.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }

    /// Ids of every still-pending battle, in creation order
    pub fn pending_ids(&self) -> Vec<BattleId> {
        self.battles
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| BattleId(index as u32))
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.battles.iter().any(|slot| slot.is_some())
    }

    /// The set of battles `id` must wait on; empty means immediately
    /// resolvable
    pub fn get_dependent_on(&self, id: BattleId) -> &AHashSet<BattleId> {
        &self.deps[id.index()]
    }

    /// Record that `battle` must wait for `depends_on` to conclude
    ///
    /// Panics on self-dependencies and on edges that would close a
    /// cycle; both are defects in the calling orchestration.
    pub fn add_dependency(&mut self, battle: BattleId, depends_on: BattleId) {
        if self.get_battle(battle).is_none() {
            panic!("no pending battle {battle:?}");
        }
        if self.get_battle(depends_on).is_none() {
            panic!("no pending battle {depends_on:?}");
        }
        if battle == depends_on {
            panic!("battle {battle:?} cannot depend on itself");
        }
        if self.depends_transitively(depends_on, battle) {
            panic!(
                "dependency cycle: battle {depends_on:?} already waits on {battle:?}"
            );
        }
        self.deps[battle.index()].insert(depends_on);
        self.rdeps[depends_on.index()].insert(battle);
    }

    fn depends_transitively(&self, from: BattleId, target: BattleId) -> bool {
        let mut stack = vec![from];
        let mut seen: AHashSet<BattleId> = AHashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if seen.insert(id) {
                stack.extend(self.deps[id.index()].iter().copied());
            }
        }
        false
    }

    /// Deregister a battle and unblock everything that waited on it
    pub fn remove_battle(&mut self, id: BattleId) -> Option<Battle> {
        let battle = self.battles.get_mut(id.index()).and_then(|slot| slot.take())?;
        self.by_key.remove(&battle.key());
        self.unlink(id);
        Some(battle)
    }

    fn unlink(&mut self, id: BattleId) {
        let idx = id.index();
        let waiters: Vec<BattleId> = self.rdeps[idx].drain().collect();
        for waiter in waiters {
            self.deps[waiter.index()].remove(&id);
        }
        let upstream: Vec<BattleId> = self.deps[idx].drain().collect();
        for dependency in upstream {
            self.rdeps[dependency.index()].remove(&id);
        }
    }

    // === CONQUEST BOOKKEEPING ===

    pub fn add_to_conquered(&mut self, territory: TerritoryId) {
        self.conquered.insert(territory);
    }

    /// True when the territory was taken over earlier this turn
    pub fn was_conquered(&self, territory: TerritoryId) -> bool {
        self.conquered.contains(&territory)
    }

    pub fn conquered(&self) -> &AHashSet<TerritoryId> {
        &self.conquered
    }

    pub fn add_to_blitzed(&mut self, territory: TerritoryId) {
        self.blitzed.insert(territory);
    }

    pub fn was_blitzed(&self, territory: TerritoryId) -> bool {
        self.blitzed.contains(&territory)
    }

    /// Apply the ownership change for a conquest, narrate it and clear
    /// prior-owner flags. Sea zones cannot be owned, so a take-over of
    /// one is a no-op.
    pub fn take_over(
        &mut self,
        territory: TerritoryId,
        new_owner: PlayerId,
        bridge: &mut DelegateBridge<'_>,
        occupiers: &[UnitId],
    ) -> Result<(), ChangeError> {
        let (is_water, old_owner, text) = {
            let game = bridge.game();
            let is_water = game.territory(territory).map(|t| t.is_water).unwrap_or(false);
            let old_owner = game.territory(territory).and_then(|t| t.owner);
            let site_name = game.territory_name(territory);
            let player_name = game.player_name(new_owner);
            let mut text = match old_owner {
                Some(prev) => format!(
                    "{player_name} takes {site_name} from {}",
                    game.player_name(prev)
                ),
                None => format!("{player_name} takes neutral territory {site_name}"),
            };
            if !occupiers.is_empty() {
                text = format!("{text} with {}", game.describe_units(occupiers));
            }
            (is_water, old_owner, text)
        };

        if is_water {
            tracing::debug!("take-over of sea zone {:?} skipped", territory);
            return Ok(());
        }
        if old_owner == Some(new_owner) {
            return Ok(());
        }

        bridge.add_change(
            text.clone(),
            Change::ChangeOwner { territory, new_owner: Some(new_owner) },
        )?;
        bridge.history_mut().start_event(text);
        self.blitzed.remove(&territory);
        Ok(())
    }

    /// Withdraw units from the attack in every pending battle
    ///
    /// A unit pulled out of an attack must vanish from every dependent
    /// table, not just the battle it was pulled from.
    pub fn remove_attack(&mut self, route: Option<&Route>, units: &[UnitId]) {
        for slot in self.battles.iter_mut() {
            if let Some(battle) = slot.as_mut() {
                battle.remove_attack(route, units);
            }
        }
    }

    // === RESOLUTION ===

    /// Fight one battle now
    ///
    /// Panics when the battle still waits on unresolved dependencies or
    /// does not exist; both indicate broken orchestration. On a Change
    /// failure the battle is put back as pending and the error returned.
    pub fn fight(
        &mut self,
        id: BattleId,
        bridge: &mut DelegateBridge<'_>,
        resolver: &mut dyn CombatResolver,
    ) -> Result<(Battle, BattleOutcome), ChangeError> {
        let waiting_on = self.deps.get(id.index()).map(|s| s.len()).unwrap_or(0);
        if waiting_on > 0 {
            let site = self.get_battle(id).map(|b| b.site);
            panic!(
                "must fight battles that this battle depends on first: battle at {site:?} \
                 still waits on {waiting_on} unresolved"
            );
        }
        let mut battle = self
            .battles
            .get_mut(id.index())
            .and_then(|slot| slot.take())
            .unwrap_or_else(|| panic!("no pending battle {id:?}"));

        let outcome = match battle.fight(self, bridge, resolver) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.battles[id.index()] = Some(battle);
                return Err(err);
            }
        };

        let mut waiters: Vec<BattleId> = self.rdeps[id.index()].iter().copied().collect();
        waiters.sort_by_key(|w| w.0);
        self.by_key.remove(&battle.key());
        self.unlink(id);

        if !outcome.casualties.is_empty() {
            for waiter in waiters {
                if let Some(dependent) = self.battles.get_mut(waiter.index()).and_then(|s| s.as_mut()) {
                    if let Err(err) =
                        dependent.units_lost_in_preceding_battle(battle.site, &outcome.casualties, bridge)
                    {
                        tracing::warn!("cascade removal into {:?} failed: {err}", dependent.site);
                        return Err(err);
                    }
                }
            }
        }

        Ok((battle, outcome))
    }

    /// Resolve every pending battle in topological order
    ///
    /// Ties among simultaneously unblocked battles go to the earliest
    /// site in `priority`, then to creation order. Empty battles are
    /// discarded without fighting. Panics when pending battles remain
    /// but none ever becomes unblocked, which means the dependency
    /// graph holds a cycle.
    pub fn resolve_pending(
        &mut self,
        bridge: &mut DelegateBridge<'_>,
        resolver: &mut dyn CombatResolver,
        priority: &[TerritoryId],
    ) -> Result<Vec<(Battle, BattleOutcome)>, ChangeError> {
        let mut concluded = Vec::new();
        loop {
            let pending = self.pending_ids();
            if pending.is_empty() {
                break;
            }
            let mut unblocked: Vec<BattleId> = pending
                .iter()
                .copied()
                .filter(|id| self.deps[id.index()].is_empty())
                .collect();
            if unblocked.is_empty() {
                let sites: Vec<TerritoryId> = pending
                    .iter()
                    .filter_map(|id| self.get_battle(*id))
                    .map(|b| b.site)
                    .collect();
                panic!("dependency cycle among pending battles at {sites:?}");
            }
            unblocked.sort_by_key(|id| {
                let rank = self
                    .get_battle(*id)
                    .and_then(|b| priority.iter().position(|p| *p == b.site))
                    .unwrap_or(usize::MAX);
                (rank, id.0)
            });
            let next = unblocked[0];

            let next_is_empty = self
                .get_battle(next)
                .map(|b| b.is_empty(bridge.game()))
                .unwrap_or(true);
            if next_is_empty {
                if let Some(battle) = self.discard(next) {
                    concluded.push((battle, BattleOutcome::default()));
                }
            } else {
                concluded.push(self.fight(next, bridge, resolver)?);
            }
        }
        Ok(concluded)
    }

    /// Silently drop an empty battle, marking it OVER so the two-state
    /// contract holds for observers that kept the id
    fn discard(&mut self, id: BattleId) -> Option<Battle> {
        let mut battle = self.remove_battle(id)?;
        battle.mark_over();
        tracing::debug!("discarding empty battle at {:?}", battle.site);
        Some(battle)
    }
}
