//! Battle resolution integration tests
//!
//! These tests drive the tracker, battles, resolvers and the change
//! bridge together over full invasion scenarios, checking ordering,
//! cascades, conquest and narration end-to-end.

use salient::battle::{
    Battle, BattleClass, BattleKind, BattleTracker, DiceResolver, StrengthResolver,
};
use salient::core::types::{PlayerId, TerritoryId};
use salient::persist::{clone_state, SnapshotScope};
use salient::state::unit::UnitCatalog;
use salient::state::{ChangeLog, DelegateBridge, GameState, HistoryWriter, Route};

struct Invasion {
    game: GameState,
    log: ChangeLog,
    history: HistoryWriter,
    blue: PlayerId,
    red: PlayerId,
    sea: TerritoryId,
    beach: TerritoryId,
    inland: TerritoryId,
}

/// The standard position: Blue offshore in the Western Approaches with
/// troops already landed in Red-held Normandy, Caen further inland.
fn invasion() -> Invasion {
    let mut game = GameState::new("overlord", UnitCatalog::with_defaults());
    let blue = game.add_player("Blue", &["Allies"]);
    let red = game.add_player("Red", &["Axis"]);
    let sea = game.add_territory("Western Approaches", true, None);
    let beach = game.add_territory("Normandy", false, Some(red));
    let inland = game.add_territory("Caen", false, Some(red));
    Invasion {
        game,
        log: ChangeLog::new(),
        history: HistoryWriter::new(),
        blue,
        red,
        sea,
        beach,
        inland,
    }
}

fn type_id(game: &GameState, name: &str) -> salient::core::types::UnitTypeId {
    game.catalog.id_of(name).unwrap()
}

/// The canonical cascade: the naval battle gating the landing sinks the
/// only transport, which takes the landed infantry with it, emptying
/// the landing battle so Normandy never changes hands.
#[test]
fn test_lost_naval_battle_cascades_into_the_landing() {
    let mut f = invasion();
    let transport = type_id(&f.game, "transport");
    let infantry = type_id(&f.game, "infantry");
    let destroyer = type_id(&f.game, "destroyer");

    // An unescorted transport against a destroyer: the naval battle is lost
    let transports = f.game.place_new_units(transport, f.blue, 1, f.sea).unwrap();
    let landed = f.game.place_new_units(infantry, f.blue, 2, f.beach).unwrap();
    f.game.place_new_units(destroyer, f.red, 1, f.sea).unwrap();

    let mut tracker = BattleTracker::new();
    let naval = tracker.add_battle(Battle::new(
        f.sea,
        BattleClass::Normal,
        BattleKind::Fought,
        f.blue,
        true,
    ));
    let landing = tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Normal,
        BattleKind::NonFighting,
        f.blue,
        false,
    ));
    tracker.add_dependency(landing, naval);
    tracker
        .get_battle_mut(landing)
        .unwrap()
        .add_dependent_units(transports[0], landed.clone());

    let mut bridge = DelegateBridge::new(&mut f.game, &mut f.log, &mut f.history);
    let mut resolver = StrengthResolver::new();
    let concluded = tracker
        .resolve_pending(&mut bridge, &mut resolver, &[f.sea, f.beach])
        .unwrap();

    // Both battles concluded, the naval one first
    assert_eq!(concluded.len(), 2);
    assert_eq!(concluded[0].0.site, f.sea);
    assert!(!concluded[0].1.attacker_won);

    // The transport and its riders are gone
    assert!(f.game.unit(transports[0]).is_none());
    assert!(f.game.unit(landed[0]).is_none());
    assert!(f.game.unit(landed[1]).is_none());

    // Normandy never changed hands
    assert_eq!(f.game.territory(f.beach).unwrap().owner, Some(f.red));
    assert!(!tracker.was_conquered(f.beach));

    let story = f.history.render();
    assert!(story.contains("2 infantry lost in Normandy"), "story was:\n{story}");
    assert!(!story.contains("takes Normandy"), "story was:\n{story}");
}

/// Riders registered with their carrier more than once still die
/// exactly once when it sinks, and every removal lands in the log.
#[test]
fn test_doubly_registered_riders_die_once_in_the_cascade() {
    let mut f = invasion();
    let transport = type_id(&f.game, "transport");
    let infantry = type_id(&f.game, "infantry");
    let destroyer = type_id(&f.game, "destroyer");

    let transports = f.game.place_new_units(transport, f.blue, 1, f.sea).unwrap();
    let landed = f.game.place_new_units(infantry, f.blue, 2, f.beach).unwrap();
    f.game.place_new_units(destroyer, f.red, 1, f.sea).unwrap();

    let mut tracker = BattleTracker::new();
    let naval = tracker.add_battle(Battle::new(
        f.sea,
        BattleClass::Normal,
        BattleKind::Fought,
        f.blue,
        true,
    ));
    let landing = tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Normal,
        BattleKind::NonFighting,
        f.blue,
        false,
    ));
    tracker.add_dependency(landing, naval);
    // The dispatcher loads the same riders again on a second pass
    let battle = tracker.get_battle_mut(landing).unwrap();
    battle.add_dependent_units(transports[0], landed.clone());
    battle.add_dependent_units(transports[0], landed.clone());

    let mut bridge = DelegateBridge::new(&mut f.game, &mut f.log, &mut f.history);
    let mut resolver = StrengthResolver::new();
    let concluded = tracker
        .resolve_pending(&mut bridge, &mut resolver, &[f.sea, f.beach])
        .unwrap();

    assert_eq!(concluded.len(), 2);
    assert!(f.game.unit(landed[0]).is_none());
    assert!(f.game.unit(landed[1]).is_none());

    let story = f.history.render();
    assert!(story.contains("2 infantry lost in Normandy"), "story was:\n{story}");
    assert!(!story.contains("4 infantry"), "story was:\n{story}");
    assert!(f
        .log
        .records()
        .iter()
        .any(|r| r.description.contains("lost in Normandy")));
}

/// When the approach is clear the landing resolves after the naval
/// sweep and the beach changes hands.
#[test]
fn test_unopposed_approach_lets_the_landing_conquer() {
    let mut f = invasion();
    let transport = type_id(&f.game, "transport");
    let infantry = type_id(&f.game, "infantry");
    let battleship = type_id(&f.game, "battleship");

    let transports = f.game.place_new_units(transport, f.blue, 1, f.sea).unwrap();
    f.game.place_new_units(battleship, f.blue, 1, f.sea).unwrap();
    let landed = f.game.place_new_units(infantry, f.blue, 2, f.beach).unwrap();

    let mut tracker = BattleTracker::new();
    // Nobody defends the sea zone; the naval battle is an empty walkover
    let naval = tracker.add_battle(Battle::new(
        f.sea,
        BattleClass::Normal,
        BattleKind::Fought,
        f.blue,
        true,
    ));
    let landing = tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Normal,
        BattleKind::NonFighting,
        f.blue,
        false,
    ));
    tracker.add_dependency(landing, naval);
    tracker
        .get_battle_mut(landing)
        .unwrap()
        .add_dependent_units(transports[0], landed.clone());

    let mut bridge = DelegateBridge::new(&mut f.game, &mut f.log, &mut f.history);
    let mut resolver = StrengthResolver::new();
    let concluded = tracker
        .resolve_pending(&mut bridge, &mut resolver, &[f.sea, f.beach])
        .unwrap();

    assert_eq!(concluded.len(), 2);
    assert!(concluded[1].1.conquered);
    assert_eq!(f.game.territory(f.beach).unwrap().owner, Some(f.blue));
    assert!(tracker.was_conquered(f.beach));
    assert!(f.game.unit(landed[0]).is_some());

    let story = f.history.render();
    assert!(story.contains("Blue takes Normandy from Red"), "story was:\n{story}");
}

/// A defended beach is a fought battle: the defenders are wiped out,
/// the winner pays attrition and the territory still falls.
#[test]
fn test_defended_landing_conquers_with_attrition() {
    let mut f = invasion();
    let armour = type_id(&f.game, "armour");
    let infantry = type_id(&f.game, "infantry");

    let attackers = f.game.place_new_units(armour, f.blue, 3, f.beach).unwrap();
    let defenders = f.game.place_new_units(infantry, f.red, 1, f.beach).unwrap();

    let mut tracker = BattleTracker::new();
    let landing = tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Normal,
        BattleKind::Fought,
        f.blue,
        false,
    ));

    let mut bridge = DelegateBridge::new(&mut f.game, &mut f.log, &mut f.history);
    let mut resolver = StrengthResolver::new();
    let (battle, outcome) = tracker.fight(landing, &mut bridge, &mut resolver).unwrap();

    assert!(battle.is_over());
    assert!(outcome.attacker_won);
    assert!(outcome.conquered);

    // The defender is gone and one attacker was paid as attrition
    assert!(f.game.unit(defenders[0]).is_none());
    let survivors: Vec<_> = attackers.iter().filter(|id| f.game.unit(**id).is_some()).collect();
    assert_eq!(survivors.len(), 2);
    assert_eq!(f.game.territory(f.beach).unwrap().owner, Some(f.blue));

    let story = f.history.render();
    assert!(story.contains("Blue attacks Normandy with 3 armour"), "story was:\n{story}");
    assert!(story.contains("takes Normandy from Red"), "story was:\n{story}");
}

/// Bombing raids drain the owner's production and conquer nothing.
#[test]
fn test_bombing_raid_drains_production() {
    let mut f = invasion();
    let bomber = type_id(&f.game, "bomber");

    let raiders = f.game.place_new_units(bomber, f.blue, 1, f.inland).unwrap();
    if let Some(player) = f.game.player_mut(f.red) {
        player.resources.set("production".to_string(), 12);
    }

    let mut tracker = BattleTracker::new();
    tracker.add_battle(Battle::new(
        f.inland,
        BattleClass::Bombing,
        BattleKind::Bombing,
        f.blue,
        false,
    ));

    let mut bridge = DelegateBridge::new(&mut f.game, &mut f.log, &mut f.history);
    let mut resolver = StrengthResolver::new();
    let concluded = tracker
        .resolve_pending(&mut bridge, &mut resolver, &[f.inland])
        .unwrap();

    assert_eq!(concluded[0].1.raid_damage, 3);
    assert!(!concluded[0].1.conquered);
    assert_eq!(
        f.game.player(f.red).unwrap().resources.get(&"production".to_string()),
        9
    );
    assert_eq!(f.game.territory(f.inland).unwrap().owner, Some(f.red));
    // The raiders fly home
    assert!(f.game.unit(raiders[0]).is_some());

    let story = f.history.render();
    assert!(story.contains("Bombing raid in Caen costs Red 3 production"), "story was:\n{story}");
}

/// Fighting the landing before the naval battle it waits on is a defect
/// in the orchestration and must abort loudly.
#[test]
#[should_panic(expected = "must fight battles that this battle depends on first")]
fn test_fighting_out_of_dependency_order_is_fatal() {
    let mut f = invasion();
    let infantry = type_id(&f.game, "infantry");
    let destroyer = type_id(&f.game, "destroyer");

    f.game.place_new_units(infantry, f.blue, 2, f.beach).unwrap();
    f.game.place_new_units(destroyer, f.red, 1, f.sea).unwrap();

    let mut tracker = BattleTracker::new();
    let naval = tracker.add_battle(Battle::new(
        f.sea,
        BattleClass::Normal,
        BattleKind::Fought,
        f.blue,
        true,
    ));
    let landing = tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Normal,
        BattleKind::NonFighting,
        f.blue,
        false,
    ));
    tracker.add_dependency(landing, naval);

    let mut bridge = DelegateBridge::new(&mut f.game, &mut f.log, &mut f.history);
    let mut resolver = StrengthResolver::new();
    let _ = tracker.fight(landing, &mut bridge, &mut resolver);
}

/// Dice combat is reproducible: the same seed over a cloned position
/// produces byte-for-byte the same final state and the same story.
#[test]
fn test_same_seed_same_outcome_over_a_clone() {
    let mut f = invasion();
    let infantry = type_id(&f.game, "infantry");
    let armour = type_id(&f.game, "armour");

    f.game.place_new_units(armour, f.blue, 2, f.beach).unwrap();
    f.game.place_new_units(infantry, f.blue, 2, f.beach).unwrap();
    f.game.place_new_units(infantry, f.red, 3, f.beach).unwrap();

    let mut twin = clone_state(&f.game, SnapshotScope::WithDelegateState);

    let run = |game: &mut GameState,
               blue: PlayerId,
               beach: TerritoryId|
     -> (String, ChangeLog) {
        let mut log = ChangeLog::new();
        let mut history = HistoryWriter::new();
        let mut tracker = BattleTracker::new();
        tracker.add_battle(Battle::new(
            beach,
            BattleClass::Normal,
            BattleKind::Fought,
            blue,
            false,
        ));
        let mut bridge = DelegateBridge::new(game, &mut log, &mut history);
        let mut resolver = DiceResolver::new(99);
        tracker.resolve_pending(&mut bridge, &mut resolver, &[]).unwrap();
        (history.render(), log)
    };

    let (story_a, log_a) = run(&mut f.game, f.blue, f.beach);
    let (story_b, log_b) = run(&mut twin, f.blue, f.beach);

    assert_eq!(story_a, story_b);
    assert_eq!(log_a, log_b);
    assert_eq!(f.game, twin);
}

/// Calling off a landing strips the withdrawn units from dependent
/// tables in every pending battle, and the drained battle is discarded
/// without narration.
#[test]
fn test_withdrawn_attack_is_discarded_silently() {
    let mut f = invasion();
    let infantry = type_id(&f.game, "infantry");
    let transport = type_id(&f.game, "transport");

    // The infantry stay aboard; the landing never materializes
    let transports = f.game.place_new_units(transport, f.blue, 1, f.sea).unwrap();
    let aboard = f.game.place_new_units(infantry, f.blue, 1, f.sea).unwrap();

    let mut tracker = BattleTracker::new();
    let landing = tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Normal,
        BattleKind::NonFighting,
        f.blue,
        false,
    ));
    tracker
        .get_battle_mut(landing)
        .unwrap()
        .add_dependent_units(transports[0], aboard.clone());

    let mut approach = Route::new(f.sea);
    approach.push(f.beach);
    tracker.remove_attack(Some(&approach), &aboard);

    assert!(tracker
        .get_battle(landing)
        .unwrap()
        .dependent_units_of(transports[0])
        .is_empty());

    let mut bridge = DelegateBridge::new(&mut f.game, &mut f.log, &mut f.history);
    let mut resolver = StrengthResolver::new();
    let concluded = tracker
        .resolve_pending(&mut bridge, &mut resolver, &[])
        .unwrap();

    assert_eq!(concluded.len(), 1);
    assert!(concluded[0].0.is_over());
    assert!(!concluded[0].1.conquered);
    assert_eq!(f.game.territory(f.beach).unwrap().owner, Some(f.red));
    assert!(f.history.is_empty());
    assert!(f.log.is_empty());
}

/// An unopposed conquest can be unwound through the change log.
#[test]
fn test_rollback_unwinds_a_conquest() {
    let mut f = invasion();
    let infantry = type_id(&f.game, "infantry");
    f.game.place_new_units(infantry, f.blue, 1, f.beach).unwrap();

    let before = clone_state(&f.game, SnapshotScope::WithDelegateState);

    let mut tracker = BattleTracker::new();
    tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Normal,
        BattleKind::NonFighting,
        f.blue,
        false,
    ));
    {
        let mut bridge = DelegateBridge::new(&mut f.game, &mut f.log, &mut f.history);
        let mut resolver = StrengthResolver::new();
        tracker.resolve_pending(&mut bridge, &mut resolver, &[]).unwrap();
    }
    assert_eq!(f.game.territory(f.beach).unwrap().owner, Some(f.blue));

    f.log.rollback_to(0, &mut f.game).unwrap();
    assert_eq!(f.game.territory(f.beach).unwrap().owner, Some(f.red));
    assert_eq!(f.game, before);
    assert!(f.log.is_empty());
}

/// A bombing battle and a normal battle can be pending at the same site
/// at the same time; they are distinct tracker entries.
#[test]
fn test_bombing_and_normal_battles_coexist_at_one_site() {
    let mut f = invasion();
    let infantry = type_id(&f.game, "infantry");
    let bomber = type_id(&f.game, "bomber");

    f.game.place_new_units(infantry, f.blue, 1, f.beach).unwrap();
    f.game.place_new_units(bomber, f.blue, 1, f.beach).unwrap();

    let mut tracker = BattleTracker::new();
    let ground = tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Normal,
        BattleKind::NonFighting,
        f.blue,
        false,
    ));
    let raid = tracker.add_battle(Battle::new(
        f.beach,
        BattleClass::Bombing,
        BattleKind::Bombing,
        f.blue,
        false,
    ));

    assert_ne!(ground, raid);
    assert_eq!(tracker.pending_battle(f.beach, BattleClass::Normal), Some(ground));
    assert_eq!(tracker.pending_battle(f.beach, BattleClass::Bombing), Some(raid));
}
