//! Salient - Entry Point
//!
//! Runs a demonstration turn: an amphibious invasion of Normandy gated
//! on a naval battle in the Western Approaches, with a bombing raid on
//! Caen resolved alongside. Shows battle ordering, the cascade from a
//! lost transport, narration, saving and posting.

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;

use salient::battle::{
    Battle, BattleClass, BattleKind, BattleTracker, CombatResolver, DiceResolver, StrengthResolver,
};
use salient::core::config::{self, EngineConfig};
use salient::core::error::EngineError;
use salient::core::types::UnitTypeId;
use salient::core::Result;
use salient::persist::{write_save, SnapshotScope};
use salient::post::{LogChannel, SaveAttachment, TurnPoster};
use salient::state::unit::UnitCatalog;
use salient::state::{ChangeLog, DelegateBridge, GameLock, GameState, HistoryWriter};

#[derive(Parser)]
#[command(name = "salient", about = "Combat resolution demo turn")]
struct Args {
    /// Seed for the dice resolver
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Resolve combat by raw strength totals instead of dice
    #[arg(long)]
    deterministic: bool,

    /// Cap on fire exchanges per dice battle
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Unit type catalog in TOML, replacing the built-in types
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Write a clean-start save of the final position here
    #[arg(long)]
    save: Option<PathBuf>,

    /// Post the turn summary when the battles are done
    #[arg(long)]
    post: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("salient=debug")
        .init();

    let args = Args::parse();

    let mut cfg = EngineConfig::default();
    if let Some(max_rounds) = args.max_rounds {
        cfg.max_combat_rounds = max_rounds;
    }
    cfg.validate().map_err(EngineError::Config)?;
    if config::set_config(cfg).is_err() {
        tracing::warn!("engine config was already initialized");
    }

    let catalog = match &args.catalog {
        Some(path) => UnitCatalog::load_toml(path)?,
        None => UnitCatalog::with_defaults(),
    };

    tracing::info!("Salient starting...");
    let lock = GameLock::new(build_invasion_turn(catalog)?);

    let mut log = ChangeLog::new();
    let mut history = HistoryWriter::new();
    let mut resolver: Box<dyn CombatResolver> = if args.deterministic {
        Box::new(StrengthResolver::new())
    } else {
        Box::new(DiceResolver::new(args.seed))
    };

    println!("\n=== SALIENT DEMO TURN ===");
    println!("Blue invades Normandy through the Western Approaches");
    println!("while bombers raid Caen. Resolver: {}.", resolver.name());
    println!();

    // The write lock is held for the whole resolution pass; saving and
    // posting below only need reads.
    {
        let mut game = lock.write();
        let blue = game
            .player_by_name("Blue")
            .ok_or_else(|| EngineError::Config("demo scenario is missing Blue".into()))?;
        let sea = game
            .territory_by_name("Western Approaches")
            .ok_or_else(|| EngineError::Config("demo scenario is missing the sea zone".into()))?;
        let beach = game
            .territory_by_name("Normandy")
            .ok_or_else(|| EngineError::Config("demo scenario is missing Normandy".into()))?;
        let inland = game
            .territory_by_name("Caen")
            .ok_or_else(|| EngineError::Config("demo scenario is missing Caen".into()))?;

        let mut tracker = BattleTracker::new();
        let naval =
            tracker.add_battle(Battle::new(sea, BattleClass::Normal, BattleKind::Fought, blue, true));
        let landing =
            tracker.add_battle(Battle::new(beach, BattleClass::Normal, BattleKind::Fought, blue, false));
        let raid =
            tracker.add_battle(Battle::new(inland, BattleClass::Bombing, BattleKind::Bombing, blue, false));
        tracker.add_dependency(landing, naval);

        // The landed infantry still depend on the transport offshore;
        // if it sinks first, they go with it.
        let transports: Vec<_> = game
            .allied_units_in(sea, blue)
            .into_iter()
            .filter(|id| game.unit_type_of(*id).map(|ty| ty.is_transport()).unwrap_or(false))
            .collect();
        let landed = game.allied_units_in(beach, blue);
        if let (Some(transport), Some(battle)) = (transports.first(), tracker.get_battle_mut(landing))
        {
            battle.add_dependent_units(*transport, landed);
        }

        let mut bridge = DelegateBridge::new(&mut game, &mut log, &mut history);
        let concluded =
            tracker.resolve_pending(&mut bridge, resolver.as_mut(), &[sea, beach, inland])?;

        println!("--- Battle results ---");
        for (battle, outcome) in &concluded {
            println!(
                "  {:<20} won: {:<5} conquered: {:<5} casualties: {}",
                bridge.game().territory_name(battle.site),
                outcome.attacker_won,
                outcome.conquered,
                outcome.casualties.len(),
            );
        }
    }

    println!();
    println!("--- Turn history ---");
    println!("{}", history.render());

    if let Some(path) = &args.save {
        let game = lock.read();
        let mut file = File::create(path)?;
        write_save(&game, SnapshotScope::CleanStart, &mut file)?;
        println!("\nSaved final position to {}", path.display());
    }

    if args.post {
        let game = lock.read();
        let mut poster = TurnPoster::new(game.game_name.clone(), "Blue", game.round);
        poster.add_channel(Box::new(LogChannel));
        let mut bytes = Vec::new();
        write_save(&game, SnapshotScope::CleanStart, &mut bytes)?;
        let attachment = SaveAttachment { file_name: poster.attachment_name(), bytes };
        // Serialization is done; the lock must not be held over the post
        drop(game);

        let handle = poster.post_in_background(history.render(), Some(attachment));
        match handle.wait() {
            Some(outcome) => println!("\nPost turn summary success = {}", outcome.all_succeeded),
            None => println!("\nPost turn summary was abandoned before reporting"),
        }
    }

    println!("\nChanges applied this turn: {}", log.len());
    Ok(())
}

/// Set up the demonstration position at the start of Blue's combat phase
fn build_invasion_turn(catalog: UnitCatalog) -> Result<GameState> {
    let mut game = GameState::new("overlord", catalog);
    let blue = game.add_player("Blue", &["Allies"]);
    let red = game.add_player("Red", &["Axis"]);

    let sea = game.add_territory("Western Approaches", true, None);
    let beach = game.add_territory("Normandy", false, Some(red));
    let inland = game.add_territory("Caen", false, Some(red));

    let infantry = lookup(&game, "infantry")?;
    let transport = lookup(&game, "transport")?;
    let destroyer = lookup(&game, "destroyer")?;
    let battleship = lookup(&game, "battleship")?;
    let bomber = lookup(&game, "bomber")?;

    // Blue's invasion force: escorts and a loaded transport offshore,
    // two infantry already ashore, bombers over Caen
    game.place_new_units(battleship, blue, 1, sea)?;
    game.place_new_units(transport, blue, 1, sea)?;
    game.place_new_units(infantry, blue, 2, beach)?;
    game.place_new_units(bomber, blue, 1, inland)?;

    // Red's defense
    game.place_new_units(destroyer, red, 1, sea)?;
    game.place_new_units(infantry, red, 2, beach)?;
    if let Some(player) = game.player_mut(red) {
        player.resources.set("production".to_string(), 12);
    }

    game.delegate_state.phase = Some("combat".to_string());
    game.delegate_state.current_player = Some(blue);
    Ok(game)
}

fn lookup(game: &GameState, name: &str) -> Result<UnitTypeId> {
    game.catalog
        .id_of(name)
        .ok_or_else(|| EngineError::Config(format!("unit catalog is missing {name}")))
}
