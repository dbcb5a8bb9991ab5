use crate::engine::RewardEngine;
use crate::host::RecordingHost;
use crate::player::{ActorKind, BattleActor, PlayerId, PlayerInfo};
use crate::pokemon::{Owner, PokemonInst};
use schema::{BattleType, PokemonType, Reward, RewardsConfig, Trigger};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// A builder for creating test creature instances with common defaults.
///
/// # Example
/// ```
/// let pokemon = TestPokemonBuilder::new("pikachu", 25)
///     .with_types(vec![PokemonType::Electric])
///     .owned_by_player(player_id)
///     .build();
/// ```
pub struct TestPokemonBuilder {
    species: String,
    level: u32,
    types: Vec<PokemonType>,
    owner: Owner,
    shiny: bool,
    fainted: bool,
}

impl TestPokemonBuilder {
    pub fn new(species: &str, level: u32) -> Self {
        Self {
            species: species.to_string(),
            level,
            types: Vec::new(),
            owner: Owner::Unowned,
            shiny: false,
            fainted: false,
        }
    }

    pub fn with_types(mut self, types: Vec<PokemonType>) -> Self {
        self.types = types;
        self
    }

    pub fn owned_by_player(mut self, player_id: PlayerId) -> Self {
        self.owner = Owner::Player(player_id);
        self
    }

    pub fn owned_by_npc(mut self, name: &str) -> Self {
        self.owner = Owner::Npc(name.to_string());
        self
    }

    pub fn shiny(mut self) -> Self {
        self.shiny = true;
        self
    }

    /// Builds the creature with zero HP.
    pub fn fainted(mut self) -> Self {
        self.fainted = true;
        self
    }

    pub fn build(self) -> PokemonInst {
        let mut pokemon = PokemonInst::new(&self.species, self.level);
        pokemon.types = self.types;
        pokemon.owner = self.owner;
        pokemon.shiny = self.shiny;
        pokemon.current_hp = if self.fainted { 0 } else { self.level * 3 };
        pokemon
    }
}

/// A human player's side with the given team.
pub fn player_actor(player_id: PlayerId, team: Vec<PokemonInst>) -> BattleActor {
    BattleActor::new(ActorKind::Player, Some(player_id), team)
}

/// A human player's side with a single creature they own.
pub fn player_with(player_id: PlayerId, species: &str, level: u32) -> BattleActor {
    player_actor(
        player_id,
        vec![TestPokemonBuilder::new(species, level)
            .owned_by_player(player_id)
            .build()],
    )
}

pub fn wild_actor(pokemon: PokemonInst) -> BattleActor {
    BattleActor::new(ActorKind::Wild, None, vec![pokemon])
}

pub fn npc_actor(trainer: &str, species: &[&str]) -> BattleActor {
    let team = species
        .iter()
        .map(|s| TestPokemonBuilder::new(s, 20).owned_by_npc(trainer).build())
        .collect();
    BattleActor::new(ActorKind::Npc, None, team)
}

/// Register a player with the host and return their id.
pub fn online_player(host: &RecordingHost, name: &str) -> PlayerId {
    let id = Uuid::new_v4();
    host.add_player(PlayerInfo::new(id, name, "minecraft:overworld"));
    id
}

/// A rule set with no rules at all.
pub fn empty_rules() -> RewardsConfig {
    RewardsConfig {
        battle_won_rewards: BTreeMap::new(),
        battle_lost_rewards: BTreeMap::new(),
        battle_forfeit_rewards: BTreeMap::new(),
        capture_rewards: BTreeMap::new(),
        ..RewardsConfig::default()
    }
}

/// A rule set with the given rules attached to one trigger.
pub fn rules_for(trigger: Trigger, rewards: Vec<(&str, Reward)>) -> RewardsConfig {
    let mut rules = empty_rules();
    let map = match trigger {
        Trigger::BattleWon => &mut rules.battle_won_rewards,
        Trigger::BattleLost => &mut rules.battle_lost_rewards,
        Trigger::BattleForfeit => &mut rules.battle_forfeit_rewards,
        Trigger::Captured => &mut rules.capture_rewards,
    };
    for (id, reward) in rewards {
        map.insert(id.to_string(), reward);
    }
    rules
}

/// A guaranteed command reward. The command names the reward so the host's
/// command log shows what fired.
pub fn sure_command(id: &str) -> Reward {
    Reward {
        command: format!("grant {} %player%", id),
        chance: 100.0,
        ..Reward::default()
    }
}

pub fn sure_command_for(id: &str, battle_types: Vec<BattleType>) -> Reward {
    Reward {
        battle_types,
        ..sure_command(id)
    }
}

/// One guaranteed command reward per trigger.
pub fn one_of_each_trigger() -> RewardsConfig {
    let mut rules = empty_rules();
    rules
        .battle_won_rewards
        .insert("won".to_string(), sure_command("won"));
    rules
        .battle_lost_rewards
        .insert("lost".to_string(), sure_command("lost"));
    rules
        .battle_forfeit_rewards
        .insert("forfeit".to_string(), sure_command("forfeit"));
    rules
        .capture_rewards
        .insert("captured".to_string(), sure_command("captured"));
    rules
}

pub fn engine_with(host: Arc<RecordingHost>, rules: RewardsConfig) -> RewardEngine {
    match RewardEngine::builder().host(host).rules(rules).build() {
        Ok(engine) => engine,
        Err(err) => panic!("Failed to build test engine: {}", err),
    }
}
