//! Scenario replay
//!
//! Replays a recorded lifecycle feed through the rewards engine against an
//! in-memory host and prints what every resolution granted.

use battle_rewards::{
    describe_rewards, load_or_create, HostAction, LifecycleEvent, PlayerInfo, RecordingHost,
    RewardEngine,
};
use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Battle Rewards - replay battle scenarios through the reward rules
#[derive(Parser, Debug)]
#[command(name = "battle-rewards")]
#[command(about = "Replay battle lifecycle scenarios and show the rewards they grant")]
struct Args {
    /// Reward configuration (RON). Created with defaults if missing.
    #[arg(long, default_value = "config/battle_rewards.ron")]
    config: PathBuf,

    /// Scenario file (RON) with players and lifecycle events
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Print the configured rewards
    #[arg(long)]
    list: bool,
}

/// A replayable feed: who is online and what the host reported, in order.
#[derive(Deserialize, Debug)]
struct Scenario {
    #[serde(default)]
    players: Vec<PlayerInfo>,
    events: Vec<LifecycleEvent>,
}

fn load_scenario(path: &Path) -> Result<Scenario, Box<dyn Error>> {
    let content = fs::read_to_string(path)?;
    let scenario: Scenario = ron::from_str(&content)?;
    Ok(scenario)
}

fn init_logging(debug_enabled: bool) {
    let default_directive = if debug_enabled {
        "battle_rewards=debug"
    } else {
        "battle_rewards=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn event_label(event: &LifecycleEvent) -> String {
    match event {
        LifecycleEvent::BattleStarted { battle_id, actors } => {
            format!("battle {} started with {} actor(s)", battle_id, actors.len())
        }
        LifecycleEvent::CreatureSentOut { creature } => {
            format!("{} sent out", creature.species)
        }
        LifecycleEvent::CreatureCaptured { creature, .. } => {
            format!("{} captured", creature.species)
        }
        LifecycleEvent::BattleVictory { battle_id, winners } => {
            format!("battle {} won by {} actor(s)", battle_id, winners.len())
        }
        LifecycleEvent::BattleFled { battle_id, .. } => format!("fled from battle {}", battle_id),
        LifecycleEvent::CreatureFainted { creature_id, .. } => {
            format!("creature {} fainted", creature_id)
        }
    }
}

fn describe_action(action: &HostAction, names: &HashMap<uuid::Uuid, String>) -> String {
    let name = |id: &uuid::Uuid| names.get(id).cloned().unwrap_or_else(|| id.to_string());
    match action {
        HostAction::Message { player, text } => format!("message to {}: {}", name(player), text),
        HostAction::Command { command } => format!("command: {}", command),
        HostAction::ItemInserted { player, item } => {
            format!("gave {} x{} to {}", item.id, item.count, name(player))
        }
        HostAction::ItemDropped { player, item } => {
            format!("dropped {} x{} at {}", item.id, item.count, name(player))
        }
    }
}

fn replay(engine: &RewardEngine, host: &RecordingHost, scenario: Scenario) {
    let names: HashMap<uuid::Uuid, String> = scenario
        .players
        .iter()
        .map(|p| (p.id, p.name.clone()))
        .collect();

    for (index, event) in scenario.events.into_iter().enumerate() {
        println!("[{}] {}", index + 1, event_label(&event));
        for report in engine.handle(event) {
            let player = names
                .get(&report.player_id)
                .cloned()
                .unwrap_or_else(|| report.player_id.to_string());
            println!(
                "  {} {} ({}): granted [{}] failed [{}]",
                player,
                report.trigger,
                report.battle_type,
                report.granted.join(", "),
                report.failed.join(", ")
            );
        }
        for action in host.take_actions() {
            println!("    -> {}", describe_action(&action, &names));
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let rules = match load_or_create(&args.config) {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("Error loading rewards: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(rules.debug_enabled);
    info!(
        "Using {} ({} rewards)",
        args.config.display(),
        rules.total_rewards()
    );

    if args.list {
        print!("{}", describe_rewards(&rules));
    }

    let Some(scenario_path) = args.scenario else {
        if !args.list {
            eprintln!("Nothing to do: pass --scenario <file> or --list");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    let scenario = match load_scenario(&scenario_path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Error loading scenario {}: {}", scenario_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let host = Arc::new(RecordingHost::new());
    for player in &scenario.players {
        host.add_player(player.clone());
    }

    let engine = match RewardEngine::builder()
        .host(host.clone())
        .rules(rules)
        .config_path(args.config)
        .build()
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error starting engine: {}", e);
            return ExitCode::FAILURE;
        }
    };

    replay(&engine, &host, scenario);

    let swept = engine.sweep();
    let status = engine.status();
    println!(
        "\nDone: {} battle(s) still tracked, {} swept, {} player(s) on cooldown",
        status.active_battles, swept, status.players_with_cooldowns
    );
    ExitCode::SUCCESS
}
