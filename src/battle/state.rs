use crate::player::{ActorKind, BattleActor, PlayerId};
use crate::pokemon::PokemonInst;
use crate::rewards::PropertySnapshot;
use schema::BattleType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BattleId = Uuid;

/// Battles idle for longer than this are evicted by the sweeper.
pub const BATTLE_TIMEOUT_MS: u64 = 30 * 60 * 1000;

/// Notifications from the host's battle lifecycle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    BattleStarted {
        battle_id: BattleId,
        actors: Vec<BattleActor>,
    },
    // The creature must belong to a tracked battle's team.
    CreatureSentOut {
        creature: PokemonInst,
    },
    CreatureCaptured {
        // None when the host does not know of an enclosing battle.
        #[serde(default)]
        battle_id: Option<BattleId>,
        player_id: PlayerId,
        creature: PokemonInst,
    },
    BattleVictory {
        battle_id: BattleId,
        // Actor ids of the winning side.
        winners: Vec<Uuid>,
    },
    BattleFled {
        battle_id: BattleId,
        player_id: PlayerId,
    },
    CreatureFainted {
        battle_id: BattleId,
        creature_id: Uuid,
    },
}

/// Everything tracked about one battle in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleState {
    pub battle_id: BattleId,
    pub actors: Vec<BattleActor>,
    pub player_pokemon: Option<PokemonInst>,
    pub opponent_pokemon: Option<PokemonInst>,
    pub opponent_properties: PropertySnapshot,
    pub battle_type: BattleType,
    pub resolved: bool,
    pub captured: bool,
    pub last_activity: u64,
}

impl BattleState {
    pub fn new(battle_id: BattleId, actors: Vec<BattleActor>, now_ms: u64) -> Self {
        let battle_type = Self::classify(&actors);

        let player_pokemon = actors
            .iter()
            .filter(|actor| actor.is_player())
            .find_map(BattleActor::active_pokemon)
            .cloned();
        // In PVP there is no non-player side; the second player's creature
        // stands in as the opponent.
        let opponent_pokemon = actors
            .iter()
            .filter(|actor| !actor.is_player())
            .find_map(BattleActor::active_pokemon)
            .or_else(|| {
                actors
                    .iter()
                    .filter(|actor| actor.is_player())
                    .filter_map(BattleActor::active_pokemon)
                    .nth(1)
            })
            .cloned();

        let mut state = Self {
            battle_id,
            actors,
            player_pokemon,
            opponent_pokemon: None,
            opponent_properties: PropertySnapshot::default(),
            battle_type,
            resolved: false,
            captured: false,
            last_activity: now_ms,
        };
        if let Some(opponent) = opponent_pokemon {
            state.set_opponent(opponent);
        }
        state
    }

    /// Classify a battle from its participants. The checks form a priority
    /// chain: several players make it PVP no matter what else is present, and
    /// an explicit wild actor wins over NPC ownership.
    pub fn classify(actors: &[BattleActor]) -> BattleType {
        let players = actors.iter().filter(|actor| actor.is_player()).count();
        if players > 1 {
            return BattleType::Pvp;
        }
        if actors.iter().any(|actor| actor.kind == ActorKind::Wild) {
            return BattleType::Wild;
        }
        let npc_present = actors.iter().any(|actor| {
            actor.kind == ActorKind::Npc
                || (!actor.is_player()
                    && actor
                        .active_pokemon()
                        .is_some_and(PokemonInst::is_npc_owned))
        });
        if npc_present {
            BattleType::Npc
        } else {
            BattleType::Wild
        }
    }

    /// Replace the opponent creature and recompute its property snapshot.
    pub fn set_opponent(&mut self, pokemon: PokemonInst) {
        self.opponent_properties = PropertySnapshot::from_pokemon(&pokemon);
        self.opponent_pokemon = Some(pokemon);
    }

    pub fn touch(&mut self, now_ms: u64) {
        self.last_activity = now_ms;
    }

    pub fn is_stale(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity) > BATTLE_TIMEOUT_MS
    }

    /// Every creature on every team, for the creature index.
    pub fn creature_ids(&self) -> Vec<Uuid> {
        self.actors
            .iter()
            .flat_map(|actor| actor.team.iter().map(|pokemon| pokemon.uuid))
            .collect()
    }

    pub fn player_actors(&self) -> impl Iterator<Item = &BattleActor> {
        self.actors.iter().filter(|actor| actor.is_player())
    }

    /// Record a creature entering the field. It becomes its team's active
    /// creature and updates the player or opponent slot by ownership. An
    /// NPC-owned creature upgrades a non-PVP battle to NPC.
    pub fn send_out(&mut self, creature: PokemonInst, now_ms: u64) {
        for actor in &mut self.actors {
            if let Some(index) = actor.team.iter().position(|p| p.uuid == creature.uuid) {
                actor.team[index] = creature.clone();
                actor.team[..=index].rotate_right(1);
            }
        }

        if creature.is_npc_owned() && self.battle_type != BattleType::Pvp {
            self.battle_type = BattleType::Npc;
        }

        if creature.is_player_owned() {
            self.player_pokemon = Some(creature);
        } else {
            self.set_opponent(creature);
        }
        self.touch(now_ms);
    }

    /// Mark a creature as fainted wherever it appears. Returns false if no
    /// team holds it.
    pub fn faint(&mut self, creature_id: Uuid, now_ms: u64) -> bool {
        let mut found = false;
        for actor in &mut self.actors {
            found |= actor.mark_fainted(creature_id);
        }
        for slot in [&mut self.player_pokemon, &mut self.opponent_pokemon] {
            if let Some(pokemon) = slot.as_mut().filter(|p| p.uuid == creature_id) {
                pokemon.current_hp = 0;
            }
        }
        self.touch(now_ms);
        found
    }

    /// The creature a player faces. Outside PVP this is the tracked opponent;
    /// in PVP it is the active creature of the first player on the other side.
    pub fn opponent_for(&self, actor: &BattleActor, winners: &[Uuid]) -> Option<PokemonInst> {
        if self.battle_type != BattleType::Pvp {
            return self.opponent_pokemon.clone();
        }
        let me = actor.actor_id;
        let is_winner = winners.contains(&me);
        self.player_actors()
            .find(|other| other.actor_id != me && winners.contains(&other.actor_id) != is_winner)
            .or_else(|| self.player_actors().find(|other| other.actor_id != me))
            .and_then(BattleActor::active_pokemon)
            .cloned()
    }
}
